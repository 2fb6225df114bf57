/// Amenity domain model and heat source derivation.
///
/// An amenity is a geographic point of interest with a category and a
/// per-point weight in [0, 1]. Before a render pass the overlay flattens
/// the filtered amenity list into plain heat sources; that list is
/// rebuilt from scratch on every input change rather than patched.
use std::collections::HashSet;

use serde::Deserialize;

use crate::viewport::LatLng;

/// Amenity categories shown on the proximity overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transit,
    School,
    Grocery,
    Hospital,
    Park,
    Restaurant,
    Cafe,
    Gym,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Transit,
        Category::School,
        Category::Grocery,
        Category::Hospital,
        Category::Park,
        Category::Restaurant,
        Category::Cafe,
        Category::Gym,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Transit => "transit",
            Category::School => "school",
            Category::Grocery => "grocery",
            Category::Hospital => "hospital",
            Category::Park => "park",
            Category::Restaurant => "restaurant",
            Category::Cafe => "cafe",
            Category::Gym => "gym",
        }
    }

    /// Canonical proximity weight per category. Transit anchors the scale
    /// at 1.0; the rest rank by how strongly nearby presence moves
    /// buyer interest.
    pub fn weight(self) -> f32 {
        match self {
            Category::Transit => 1.0,
            Category::School => 0.9,
            Category::Grocery => 0.85,
            Category::Hospital => 0.8,
            Category::Park => 0.7,
            Category::Restaurant => 0.65,
            Category::Cafe => 0.55,
            Category::Gym => 0.5,
        }
    }
}

/// One point of interest as supplied by the host application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amenity {
    pub pos: LatLng,
    pub category: Category,
    /// Per-point prominence in [0, 1] (e.g. a major station vs a bus stop).
    pub weight: f32,
}

/// Geographic heat source: what survives filtering and weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSource {
    pub pos: LatLng,
    pub intensity: f32,
}

/// Flatten amenities into heat sources, strongest first.
///
/// Applies the category filter, multiplies the canonical category weight,
/// the per-point weight and the caller's intensity scale, clamps into
/// [0, 1], and drops anything non-finite or weightless. The descending
/// sort is what lets callers cap a pass to the top-K sources by slicing.
pub fn build_sources(
    amenities: &[Amenity],
    selected: &HashSet<Category>,
    intensity_scale: f32,
) -> Vec<HeatSource> {
    let mut sources: Vec<HeatSource> = Vec::with_capacity(amenities.len());
    let mut dropped = 0usize;

    for a in amenities {
        if !selected.contains(&a.category) {
            continue;
        }
        if !a.pos.is_finite() || !a.weight.is_finite() {
            dropped += 1;
            continue;
        }
        let intensity = (intensity_scale * a.category.weight() * a.weight).clamp(0.0, 1.0);
        // clamp passes NaN through (a NaN scale), negated compare drops it
        if !(intensity > 0.0) {
            continue;
        }
        sources.push(HeatSource {
            pos: a.pos,
            intensity,
        });
    }

    if dropped > 0 {
        log::debug!("dropped {dropped} amenities with non-finite data");
    }

    sources.sort_unstable_by(|a, b| b.intensity.total_cmp(&a.intensity));
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amenity(lat: f64, lng: f64, category: Category, weight: f32) -> Amenity {
        Amenity {
            pos: LatLng::new(lat, lng),
            category,
            weight,
        }
    }

    fn all_selected() -> HashSet<Category> {
        Category::ALL.iter().copied().collect()
    }

    #[test]
    fn selection_filters_categories() {
        let amenities = [
            amenity(40.70, -74.00, Category::Transit, 1.0),
            amenity(40.71, -74.01, Category::Cafe, 1.0),
            amenity(40.72, -74.02, Category::Park, 1.0),
        ];
        let selected: HashSet<_> = [Category::Transit, Category::Park].into_iter().collect();

        let sources = build_sources(&amenities, &selected, 1.0);
        assert_eq!(sources.len(), 2);

        let empty = HashSet::new();
        assert!(build_sources(&amenities, &empty, 1.0).is_empty());
    }

    #[test]
    fn sources_come_out_strongest_first() {
        let amenities = [
            amenity(40.70, -74.00, Category::Gym, 0.4),
            amenity(40.71, -74.01, Category::Transit, 1.0),
            amenity(40.72, -74.02, Category::Cafe, 0.8),
        ];
        let sources = build_sources(&amenities, &all_selected(), 1.0);

        assert_eq!(sources.len(), 3);
        assert!(sources[0].intensity >= sources[1].intensity);
        assert!(sources[1].intensity >= sources[2].intensity);
        assert_eq!(sources[0].pos, LatLng::new(40.71, -74.01));
    }

    #[test]
    fn intensity_combines_and_clamps() {
        let amenities = [amenity(40.70, -74.00, Category::School, 0.5)];
        let sources = build_sources(&amenities, &all_selected(), 0.8);
        // 0.8 * 0.9 * 0.5
        assert!((sources[0].intensity - 0.36).abs() < 1e-6);

        let hot = [amenity(40.70, -74.00, Category::Transit, 1.0)];
        let sources = build_sources(&hot, &all_selected(), 5.0);
        assert_eq!(sources[0].intensity, 1.0);
    }

    #[test]
    fn bad_coordinates_and_weights_are_dropped() {
        let amenities = [
            amenity(f64::NAN, -74.00, Category::Transit, 1.0),
            amenity(40.70, f64::INFINITY, Category::Transit, 1.0),
            amenity(40.70, -74.00, Category::Transit, f32::NAN),
            amenity(40.70, -74.00, Category::Transit, 0.0),
            amenity(40.70, -74.00, Category::Transit, 0.9),
        ];
        let sources = build_sources(&amenities, &all_selected(), 1.0);
        assert_eq!(sources.len(), 1);
        assert!((sources[0].intensity - 0.9).abs() < 1e-6);
    }

    #[test]
    fn category_weights_are_canonical() {
        assert_eq!(Category::Transit.weight(), 1.0);
        // every category carries a positive weight no greater than transit
        for cat in Category::ALL {
            assert!(cat.weight() > 0.0 && cat.weight() <= 1.0);
        }
        // labels are unique (drives the demo key bindings)
        let labels: HashSet<_> = Category::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(labels.len(), Category::ALL.len());
    }
}
