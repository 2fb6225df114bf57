/// Web-Mercator camera standing in for a slippy-map widget.
///
/// World space is the usual 256 * 2^zoom pixel square; the camera keeps a
/// geographic center and exposes the projection the overlay consumes.
use glam::Vec2;

use glowmap::config::CameraConfig;
use glowmap::viewport::{GeoBounds, LatLng, MapViewport};

/// Mercator pole cutoff in degrees.
const MAX_LAT: f64 = 85.051_128_78;
const MIN_ZOOM: f64 = 2.0;
const MAX_ZOOM: f64 = 19.0;

pub struct Camera {
    center: LatLng,
    zoom: f64,
    width: u32,
    height: u32,
}

impl Camera {
    pub fn new(cfg: &CameraConfig, width: u32, height: u32) -> Self {
        Self {
            center: LatLng::new(cfg.lat.clamp(-MAX_LAT, MAX_LAT), cfg.lng),
            zoom: cfg.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    /// World size in pixels at the current zoom.
    fn world_px(&self) -> f64 {
        256.0 * self.zoom.exp2()
    }

    /// Pixels per degree of longitude at the current zoom.
    pub fn pixels_per_degree(&self) -> f64 {
        self.world_px() / 360.0
    }

    /// Position in world pixel space.
    fn global(&self, pos: LatLng) -> (f64, f64) {
        let world = self.world_px();
        let x = (pos.lng + 180.0) / 360.0 * world;
        let lat = pos.lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * world;
        (x, y)
    }

    fn unglobal(&self, x: f64, y: f64) -> LatLng {
        let world = self.world_px();
        let lng = x / world * 360.0 - 180.0;
        let lat = (std::f64::consts::PI * (1.0 - 2.0 * y / world)).sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }

    /// Shift the camera center by a screen-space pixel delta.
    pub fn pan_px(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = self.global(self.center);
        let moved = self.unglobal(cx + dx, cy + dy);
        self.center = LatLng::new(moved.lat.clamp(-MAX_LAT, MAX_LAT), wrap_lng(moved.lng));
    }

    /// Zoom in or out around the current center.
    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

fn wrap_lng(lng: f64) -> f64 {
    let mut v = lng;
    while v > 180.0 {
        v -= 360.0;
    }
    while v < -180.0 {
        v += 360.0;
    }
    v
}

impl MapViewport for Camera {
    fn size_px(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn project(&self, pos: LatLng) -> Vec2 {
        let (gx, gy) = self.global(pos);
        let (cx, cy) = self.global(self.center);
        Vec2::new(
            (gx - cx + self.width as f64 / 2.0) as f32,
            (gy - cy + self.height as f64 / 2.0) as f32,
        )
    }

    fn bounds(&self) -> GeoBounds {
        let (cx, cy) = self.global(self.center);
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        let nw = self.unglobal(cx - half_w, cy - half_h);
        let se = self.unglobal(cx + half_w, cy + half_h);
        GeoBounds {
            south: se.lat,
            west: nw.lng,
            north: nw.lat,
            east: se.lng,
        }
    }
}
