/// Overlay surface: owns the RGBA canvas and runs render passes.
///
/// The surface is deliberately passive. Hosts (or the overlay layer above
/// it) request renders and pump [`HeatmapSurface::maintain`] from their
/// event loop; the surface runs a pass only when its scheduler says one
/// is due, and is a silent no-op while hidden or while the viewport is
/// not ready. Hiding releases the cached heat field and blanks the
/// canvas but keeps the allocation for the next show.
use instant::Instant;
use std::time::Duration;

use crate::amenity::HeatSource;
use crate::field::{accumulate, HeatField, HeatSettings, ProjectedSource};
use crate::gradient::{colorize, Gradient};
use crate::scheduler::{RenderDecision, RenderScheduler};
use crate::stats::{PassStats, PhaseTimers, RenderPhase};
use crate::viewport::MapViewport;

/// Straight-alpha RGBA8 pixel buffer sized to the viewport.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA at one pixel; row-major, origin top-left.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y * self.width + x) as usize * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize * 4, 0);
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|b| *b == 0)
    }

    /// Copy a finished frame in. Refuses size mismatches so a stale-sized
    /// shading result can never land on a freshly resized canvas.
    fn blit_from(&mut self, src: &[u8]) -> bool {
        if src.len() != self.pixels.len() {
            return false;
        }
        self.pixels.copy_from_slice(src);
        true
    }
}

pub struct HeatmapSurface {
    canvas: Canvas,
    scheduler: RenderScheduler,
    heat: HeatSettings,
    gradient: Gradient,
    field: Option<HeatField>,
    visible: bool,
    generation: u64,
    projected: Vec<ProjectedSource>,
    shaded: Vec<u8>,
    timers: PhaseTimers,
    stats: PassStats,
}

impl HeatmapSurface {
    pub fn new(heat: HeatSettings, gradient: Gradient, interval: Duration) -> Self {
        Self {
            canvas: Canvas::new(0, 0),
            scheduler: RenderScheduler::new(interval),
            heat,
            gradient,
            field: None,
            visible: false,
            generation: 0,
            projected: Vec::new(),
            shaded: Vec::new(),
            timers: PhaseTimers::new(),
            stats: PassStats::new(),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Bumped whenever the canvas contents change; presenters re-composite
    /// when they see a new value.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn passes(&self) -> u64 {
        self.stats.passes()
    }

    pub fn has_cached_field(&self) -> bool {
        self.field.is_some()
    }

    pub fn heat_settings(&self) -> HeatSettings {
        self.heat
    }

    pub fn set_heat_settings(&mut self, heat: HeatSettings) {
        self.heat = heat;
    }

    pub fn gradient(&self) -> Gradient {
        self.gradient
    }

    pub fn set_gradient(&mut self, gradient: Gradient) {
        self.gradient = gradient;
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.scheduler.set_interval(interval);
    }

    /// Deadline the host should wake at; `None` while hidden.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.visible {
            self.scheduler.next_deadline()
        } else {
            None
        }
    }

    /// Make the overlay visible and ask for a pass. The first show fires
    /// immediately; re-shows inside the throttle window land on the
    /// trailing edge.
    pub fn show(&mut self, now: Instant) -> RenderDecision {
        self.visible = true;
        self.scheduler.request(now)
    }

    /// Hide the overlay: cancel anything armed, release the cached field,
    /// blank the canvas. Idempotent.
    pub fn hide(&mut self) {
        self.scheduler.cancel();
        self.field = None;
        if self.visible || !self.canvas.is_blank() {
            self.canvas.clear();
            self.generation = self.generation.wrapping_add(1);
        }
        self.visible = false;
    }

    /// Ask for a pass without touching visibility.
    pub fn request_render(&mut self, now: Instant) -> RenderDecision {
        self.scheduler.request(now)
    }

    /// Run a pass if one is due. Returns true when the canvas was redrawn.
    ///
    /// A not-ready viewport leaves the deadline armed, so the pass runs on
    /// the first pump after the map comes up.
    pub fn maintain<V: MapViewport>(
        &mut self,
        sources: &[HeatSource],
        viewport: &V,
        now: Instant,
    ) -> bool {
        if !self.visible {
            return false;
        }
        if !viewport.is_ready() {
            return false;
        }
        if !self.scheduler.poll(now) {
            return false;
        }
        self.render_pass(sources, viewport);
        self.scheduler.finish(now);
        true
    }

    fn render_pass<V: MapViewport>(&mut self, sources: &[HeatSource], viewport: &V) {
        let (width, height) = viewport.size_px();
        self.canvas.resize(width, height);

        // Projection snapshots are only good for this one pass; the next
        // pass re-fetches everything from the viewport.
        self.timers.begin();
        self.projected.clear();
        for src in sources {
            self.projected.push(ProjectedSource {
                pos: viewport.project(src.pos),
                intensity: src.intensity,
            });
        }
        self.timers.end(RenderPhase::Project);

        self.timers.begin();
        let field = accumulate(&self.projected, width, height, &self.heat);
        self.timers.end(RenderPhase::Accumulate);

        self.timers.begin();
        colorize(&field, self.gradient, &mut self.shaded);
        self.timers.end(RenderPhase::Colorize);

        self.timers.begin();
        if self.canvas.blit_from(&self.shaded) {
            self.generation = self.generation.wrapping_add(1);
        }
        self.field = Some(field);
        self.timers.end(RenderPhase::Blit);

        self.stats.record(&self.timers, sources.len());
    }
}
