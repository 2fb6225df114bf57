/// Synthetic amenity dataset for the demo viewer.
///
/// Amenities scatter around a handful of cluster cores so the overlay
/// shows real structure instead of uniform noise. Everything is seeded,
/// so a given config always produces the same city.
use std::f64::consts::TAU;

use glowmap::amenity::{Amenity, Category};
use glowmap::config::DataConfig;
use glowmap::viewport::LatLng;

pub fn generate(cfg: &DataConfig, center: LatLng) -> Vec<Amenity> {
    let mut rng = fastrand::Rng::with_seed(cfg.seed);

    let cluster_count = 5 + rng.usize(0..4);
    let clusters: Vec<LatLng> = (0..cluster_count)
        .map(|_| {
            LatLng::new(
                center.lat + (rng.f64() * 2.0 - 1.0) * cfg.spread,
                center.lng + (rng.f64() * 2.0 - 1.0) * cfg.spread,
            )
        })
        .collect();

    let sigma = cfg.spread / 6.0;
    let mut amenities = Vec::with_capacity(cfg.amenities);
    for _ in 0..cfg.amenities {
        let core = clusters[rng.usize(0..clusters.len())];
        let (dx, dy) = gauss_pair(&mut rng);
        let category = Category::ALL[rng.usize(0..Category::ALL.len())];
        amenities.push(Amenity {
            pos: LatLng::new(core.lat + dy * sigma, core.lng + dx * sigma),
            category,
            weight: 0.3 + 0.7 * rng.f32(),
        });
    }

    amenities
}

/// Box-Muller: two independent standard normal samples.
fn gauss_pair(rng: &mut fastrand::Rng) -> (f64, f64) {
    let u1 = rng.f64().max(1e-12);
    let u2 = rng.f64();
    let r = (-2.0 * u1.ln()).sqrt();
    (r * (TAU * u2).cos(), r * (TAU * u2).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DataConfig {
        DataConfig {
            amenities: 500,
            seed: 42,
            spread: 0.05,
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let center = LatLng::new(40.7128, -74.0060);
        let a = generate(&cfg(), center);
        let b = generate(&cfg(), center);
        assert_eq!(a.len(), 500);
        assert_eq!(a, b);

        let mut other = cfg();
        other.seed = 43;
        let c = generate(&other, center);
        assert_ne!(a, c);
    }

    #[test]
    fn amenities_stay_near_the_center() {
        let center = LatLng::new(40.7128, -74.0060);
        let amenities = generate(&cfg(), center);
        for a in &amenities {
            assert!(a.pos.is_finite());
            // clusters sit within spread; gaussian tails stay well inside 10x
            assert!((a.pos.lat - center.lat).abs() < 0.5);
            assert!((a.pos.lng - center.lng).abs() < 0.5);
            assert!(a.weight >= 0.3 && a.weight <= 1.0);
        }
    }

    #[test]
    fn dataset_spans_multiple_categories() {
        let amenities = generate(&cfg(), LatLng::new(40.7128, -74.0060));
        let distinct: std::collections::HashSet<_> =
            amenities.iter().map(|a| a.category).collect();
        assert!(distinct.len() >= 4);
    }
}
