/// Heatmap overlay controller.
///
/// Sits between the host application and the surface: holds the derived
/// source list, owns the viewport subscription, and applies the zoom-banded
/// throttle interval and per-pass source cap. Props flow in whole on every
/// change; the source list is rebuilt rather than patched, which keeps the
/// overlay stateless with respect to how the host edits its data.
use std::collections::HashSet;

use instant::Instant;

use crate::amenity::{build_sources, Amenity, Category, HeatSource};
use crate::config::{Config, SourceCaps, ThrottleBands, ZoomBands};
use crate::field::HeatSettings;
use crate::surface::{Canvas, HeatmapSurface};
use crate::viewport::{EventHub, MapViewport, SubscriptionId, ViewportEvent};

/// Host-facing input snapshot. The overlay never mutates it.
#[derive(Debug, Clone)]
pub struct OverlayProps {
    pub amenities: Vec<Amenity>,
    pub selected: HashSet<Category>,
    /// Splat radius in pixels for a full-intensity source.
    pub radius_px: f32,
    /// Global intensity scale applied on top of category weights.
    pub intensity: f32,
    pub visible: bool,
}

impl OverlayProps {
    pub fn new(amenities: Vec<Amenity>) -> Self {
        Self {
            amenities,
            selected: Category::ALL.iter().copied().collect(),
            radius_px: 60.0,
            intensity: 0.8,
            visible: true,
        }
    }
}

pub struct HeatmapOverlay {
    surface: HeatmapSurface,
    /// Derived sources, strongest first; capped per pass by slicing.
    sources: Vec<HeatSource>,
    subscription: Option<SubscriptionId>,
    visible: bool,
    zoom_bands: ZoomBands,
    throttle: ThrottleBands,
    caps: SourceCaps,
    /// Last zoom seen from the viewport; NaN until the map is ready.
    zoom: f64,
}

impl HeatmapOverlay {
    pub fn new(cfg: &Config) -> Self {
        let heat = HeatSettings {
            base_radius_px: cfg.overlay.base_radius_px,
            min_radius_px: cfg.overlay.min_radius_px,
            falloff: cfg.overlay.falloff,
        };
        let zoom_bands = cfg.zoom_bands;
        let throttle = cfg.throttle;
        let interval = throttle.interval(zoom_bands.classify(f64::NAN));
        Self {
            surface: HeatmapSurface::new(heat, cfg.overlay.gradient, interval),
            sources: Vec::new(),
            subscription: None,
            visible: false,
            zoom_bands,
            throttle,
            caps: cfg.caps,
            zoom: f64::NAN,
        }
    }

    /// Subscribe to viewport events. Mounting twice keeps the original
    /// subscription.
    pub fn mount(&mut self, hub: &mut EventHub) {
        if self.subscription.is_none() {
            self.subscription = Some(hub.subscribe());
        }
    }

    /// Tear down: drop the subscription and hide the surface. Anything
    /// in-flight is cancelled; nothing renders after this returns.
    pub fn unmount(&mut self, hub: &mut EventHub) {
        if let Some(id) = self.subscription.take() {
            hub.unsubscribe(id);
        }
        self.visible = false;
        self.surface.hide();
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply a fresh prop snapshot: rebuild sources, update the splat
    /// radius, and reconcile visibility. An empty result (everything
    /// filtered out) hides the surface exactly like `visible: false`.
    pub fn set_props(&mut self, props: &OverlayProps, now: Instant) {
        self.sources = build_sources(&props.amenities, &props.selected, props.intensity);

        let mut heat = self.surface.heat_settings();
        heat.base_radius_px = props.radius_px;
        self.surface.set_heat_settings(heat);

        self.visible = props.visible;
        if self.active() {
            self.surface.show(now);
        } else {
            self.surface.hide();
        }
    }

    /// Visible with something to draw.
    pub fn active(&self) -> bool {
        self.visible && !self.sources.is_empty()
    }

    /// Pump the overlay from the host event loop: drain viewport events
    /// into render requests, refresh the zoom band, and run a pass if one
    /// is due. Returns true when the canvas changed.
    pub fn update<V: MapViewport>(
        &mut self,
        hub: &mut EventHub,
        viewport: &V,
        now: Instant,
    ) -> bool {
        // Band bookkeeping first, so requests drained below are scheduled
        // against the interval that matches the current zoom.
        if viewport.is_ready() {
            let zoom = viewport.zoom();
            if zoom != self.zoom {
                self.zoom = zoom;
                self.surface
                    .set_interval(self.throttle.interval(self.zoom_bands.classify(zoom)));
            }
        }

        if let Some(id) = self.subscription {
            for event in hub.drain(id) {
                if !self.active() {
                    // stale churn for a hidden overlay; consume and drop
                    continue;
                }
                match event {
                    ViewportEvent::Moved
                    | ViewportEvent::Zoomed { .. }
                    | ViewportEvent::Resized { .. } => {
                        self.surface.request_render(now);
                    }
                }
            }
        }

        let capped = self.capped_len();
        self.surface.maintain(&self.sources[..capped], viewport, now)
    }

    /// How many of the strongest sources this pass may use.
    fn capped_len(&self) -> usize {
        self.caps
            .cap(self.zoom_bands.classify(self.zoom))
            .min(self.sources.len())
    }

    pub fn canvas(&self) -> &Canvas {
        self.surface.canvas()
    }

    pub fn generation(&self) -> u64 {
        self.surface.generation()
    }

    pub fn passes(&self) -> u64 {
        self.surface.passes()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Next armed render deadline, for hosts that park between events.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.surface.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{GeoBounds, LatLng};
    use glam::Vec2;
    use std::time::Duration;

    struct StubMap {
        size: (u32, u32),
        zoom: f64,
        center: LatLng,
    }

    impl StubMap {
        fn new(zoom: f64) -> Self {
            Self {
                size: (200, 160),
                zoom,
                center: LatLng::new(40.7, -74.0),
            }
        }
    }

    impl MapViewport for StubMap {
        fn size_px(&self) -> (u32, u32) {
            self.size
        }

        fn zoom(&self) -> f64 {
            self.zoom
        }

        fn project(&self, pos: LatLng) -> Vec2 {
            let x = (pos.lng - self.center.lng) * 1000.0 + self.size.0 as f64 / 2.0;
            let y = (self.center.lat - pos.lat) * 1000.0 + self.size.1 as f64 / 2.0;
            Vec2::new(x as f32, y as f32)
        }

        fn bounds(&self) -> GeoBounds {
            GeoBounds {
                south: self.center.lat - 0.1,
                west: self.center.lng - 0.1,
                north: self.center.lat + 0.1,
                east: self.center.lng + 0.1,
            }
        }
    }

    fn amenity_at(lat: f64, lng: f64, category: Category) -> Amenity {
        Amenity {
            pos: LatLng::new(lat, lng),
            category,
            weight: 1.0,
        }
    }

    fn props() -> OverlayProps {
        OverlayProps::new(vec![
            amenity_at(40.7, -74.0, Category::Transit),
            amenity_at(40.71, -74.01, Category::Cafe),
        ])
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn mount_and_unmount_are_symmetric() {
        let cfg = Config::default();
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);

        overlay.mount(&mut hub);
        assert!(overlay.is_mounted());
        assert_eq!(hub.subscriber_count(), 1);

        // mounting again keeps the original subscription
        overlay.mount(&mut hub);
        assert_eq!(hub.subscriber_count(), 1);

        overlay.unmount(&mut hub);
        assert!(!overlay.is_mounted());
        assert_eq!(hub.subscriber_count(), 0);

        // double-unmount is a no-op
        overlay.unmount(&mut hub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn first_props_render_immediately_once_pumped() {
        let cfg = Config::default();
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);
        let map = StubMap::new(13.0);
        let t0 = Instant::now();

        overlay.mount(&mut hub);
        overlay.set_props(&props(), t0);
        assert!(overlay.update(&mut hub, &map, t0));
        assert_eq!(overlay.passes(), 1);
        assert!(!overlay.canvas().is_blank());
    }

    #[test]
    fn empty_selection_hides_the_surface() {
        let cfg = Config::default();
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);
        let map = StubMap::new(13.0);
        let t0 = Instant::now();

        overlay.mount(&mut hub);
        overlay.set_props(&props(), t0);
        overlay.update(&mut hub, &map, t0);

        let mut cleared = props();
        cleared.selected.clear();
        overlay.set_props(&cleared, at(t0, 10));

        assert!(!overlay.active());
        assert_eq!(overlay.source_count(), 0);
        assert!(overlay.canvas().is_blank());
        assert!(!overlay.update(&mut hub, &map, at(t0, 500)));
    }

    #[test]
    fn visibility_toggle_renders_once_after_throttle() {
        let cfg = Config::default();
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);
        let map = StubMap::new(13.0);
        let t0 = Instant::now();
        let interval = cfg.throttle.interval(cfg.zoom_bands.classify(13.0));

        overlay.mount(&mut hub);
        let mut p = props();
        overlay.set_props(&p, t0);
        overlay.update(&mut hub, &map, t0);
        assert_eq!(overlay.passes(), 1);

        p.visible = false;
        overlay.set_props(&p, at(t0, 20));
        assert!(overlay.canvas().is_blank());
        assert_eq!(overlay.next_wakeup(), None);

        // back on inside the throttle window: one pass at the trailing edge
        p.visible = true;
        overlay.set_props(&p, at(t0, 40));
        assert!(!overlay.update(&mut hub, &map, at(t0, 50)));
        let deadline_ms = interval.as_millis() as u64;
        assert!(overlay.update(&mut hub, &map, at(t0, deadline_ms)));
        assert_eq!(overlay.passes(), 2);
        assert!(!overlay.update(&mut hub, &map, at(t0, deadline_ms + 1000)));
    }

    #[test]
    fn viewport_events_schedule_trailing_pass() {
        let cfg = Config::default();
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);
        let map = StubMap::new(13.0);
        let t0 = Instant::now();
        let interval = cfg.throttle.interval(cfg.zoom_bands.classify(13.0));

        overlay.mount(&mut hub);
        overlay.set_props(&props(), t0);
        overlay.update(&mut hub, &map, t0);

        // pan burst right after the pass
        hub.publish(ViewportEvent::Moved);
        hub.publish(ViewportEvent::Moved);
        hub.publish(ViewportEvent::Moved);
        assert!(!overlay.update(&mut hub, &map, at(t0, 10)));
        assert!(overlay.next_wakeup().is_some());

        let deadline_ms = interval.as_millis() as u64;
        assert!(overlay.update(&mut hub, &map, at(t0, deadline_ms)));
        assert_eq!(overlay.passes(), 2);
    }

    #[test]
    fn events_while_hidden_are_discarded() {
        let cfg = Config::default();
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);
        let map = StubMap::new(13.0);
        let t0 = Instant::now();

        overlay.mount(&mut hub);
        let mut p = props();
        p.visible = false;
        overlay.set_props(&p, t0);

        hub.publish(ViewportEvent::Moved);
        hub.publish(ViewportEvent::Zoomed { zoom: 15.0 });
        assert!(!overlay.update(&mut hub, &map, t0));
        assert_eq!(overlay.passes(), 0);
        assert_eq!(overlay.next_wakeup(), None);
    }

    #[test]
    fn zoom_band_switches_throttle_interval() {
        let cfg = Config::default();
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);
        // far band: slow cadence
        let mut map = StubMap::new(cfg.zoom_bands.far_below - 1.0);
        let t0 = Instant::now();

        overlay.mount(&mut hub);
        overlay.set_props(&props(), t0);
        overlay.update(&mut hub, &map, t0);

        let far = cfg.throttle.far_ms;
        hub.publish(ViewportEvent::Moved);
        assert!(!overlay.update(&mut hub, &map, at(t0, 10)));
        assert!(!overlay.update(&mut hub, &map, at(t0, far - 1)));
        assert!(overlay.update(&mut hub, &map, at(t0, far)));

        // zoom way in: near band, faster cadence
        map.zoom = cfg.zoom_bands.near_above + 1.0;
        hub.publish(ViewportEvent::Zoomed { zoom: map.zoom });
        let t1 = at(t0, far);
        assert!(!overlay.update(&mut hub, &map, at(t1, 10)));
        let near = cfg.throttle.near_ms;
        assert!(overlay.update(&mut hub, &map, at(t1, near)));
        assert_eq!(overlay.passes(), 3);
    }

    #[test]
    fn pass_sources_are_capped_by_zoom_band() {
        let mut cfg = Config::default();
        cfg.caps.far = 2;
        cfg.caps.near = 4;
        let mut hub = EventHub::new();
        let mut overlay = HeatmapOverlay::new(&cfg);
        let map = StubMap::new(cfg.zoom_bands.far_below - 2.0);
        let t0 = Instant::now();

        let mut p = props();
        for i in 0..6 {
            p.amenities.push(amenity_at(40.70 + i as f64 * 0.001, -74.0, Category::Park));
        }

        overlay.mount(&mut hub);
        overlay.set_props(&p, t0);
        overlay.update(&mut hub, &map, t0);

        assert_eq!(overlay.source_count(), 8);
        assert_eq!(overlay.capped_len(), 2);
    }
}
