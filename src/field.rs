/// Heat field accumulation.
///
/// The field is a row-major `f32` grid matching the overlay canvas pixel
/// for pixel. Each source splats a radial falloff kernel into the grid;
/// overlapping splats add and saturate at 1.0, which is what makes dense
/// amenity clusters read as hot spots instead of blowing out.
use glam::Vec2;
use serde::Deserialize;

/// Radial falloff kernels. `t` is normalized distance (0 at the source
/// center, 1 at the influence radius); both kernels reach exactly zero at
/// t = 1 so a splat never writes outside its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Falloff {
    /// `(1 - t)^2`: sharp center, long soft tail.
    Quadratic,
    /// Normalized Gaussian bell, softer center than quadratic.
    Gaussian,
}

impl Default for Falloff {
    fn default() -> Self {
        Falloff::Quadratic
    }
}

/// Gaussian shape constant; exp(-4.5) at the rim before normalization.
const GAUSS_K: f32 = 4.5;

impl Falloff {
    pub fn weight(self, t: f32) -> f32 {
        if t >= 1.0 {
            return 0.0;
        }
        match self {
            Falloff::Quadratic => {
                let inv = 1.0 - t;
                inv * inv
            }
            Falloff::Gaussian => {
                let rim = (-GAUSS_K).exp();
                ((-GAUSS_K * t * t).exp() - rim) / (1.0 - rim)
            }
        }
    }
}

/// Splat shape knobs shared by every source in a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSettings {
    /// Radius in canvas pixels for a full-intensity source.
    pub base_radius_px: f32,
    /// Radius floor so faint sources stay visible.
    pub min_radius_px: f32,
    pub falloff: Falloff,
}

impl Default for HeatSettings {
    fn default() -> Self {
        Self {
            base_radius_px: 60.0,
            min_radius_px: 12.0,
            falloff: Falloff::Quadratic,
        }
    }
}

impl HeatSettings {
    /// Influence radius for one source: grows with intensity, never below
    /// the floor.
    pub fn influence_radius(&self, intensity: f32) -> f32 {
        (self.base_radius_px * intensity).max(self.min_radius_px)
    }
}

/// A source already projected into canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedSource {
    pub pos: Vec2,
    pub intensity: f32,
}

/// Row-major scalar heat grid, one cell per canvas pixel.
pub struct HeatField {
    width: u32,
    height: u32,
    cells: Vec<f32>,
}

impl HeatField {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.cells[self.idx(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, heat: f32) {
        let i = self.idx(x, y);
        self.cells[i] = heat;
    }

    /// Add heat to one cell, saturating at 1.0.
    #[inline]
    fn deposit(&mut self, x: u32, y: u32, amount: f32) {
        let i = self.idx(x, y);
        self.cells[i] = (self.cells[i] + amount).min(1.0);
    }
}

/// Accumulate every source into a fresh field of the given dimensions.
///
/// Cost is O(sources × radius²); callers keep it bounded by capping the
/// source list before the pass. Sources whose bounding box misses the
/// canvas entirely are skipped without touching any cell, and non-finite
/// projections (the host handed us a bad coordinate) are dropped the same
/// way.
pub fn accumulate(
    sources: &[ProjectedSource],
    width: u32,
    height: u32,
    settings: &HeatSettings,
) -> HeatField {
    let mut field = HeatField::new(width, height);
    if width == 0 || height == 0 {
        return field;
    }

    for src in sources {
        if !src.pos.is_finite() || !src.intensity.is_finite() {
            continue;
        }
        let intensity = src.intensity.min(1.0);
        if intensity <= 0.0 {
            continue;
        }
        let radius = settings.influence_radius(intensity);
        if radius <= 0.0 {
            continue;
        }

        // Clamp the splat's bounding box to the canvas; an empty
        // intersection means the whole splat is off-screen.
        let x0 = (src.pos.x - radius).floor().max(0.0) as u32;
        let y0 = (src.pos.y - radius).floor().max(0.0) as u32;
        let x1 = (src.pos.x + radius).ceil().min((width - 1) as f32);
        let y1 = (src.pos.y + radius).ceil().min((height - 1) as f32);
        if x1 < 0.0
            || y1 < 0.0
            || src.pos.x - radius > (width - 1) as f32
            || src.pos.y - radius > (height - 1) as f32
        {
            continue;
        }
        let (x1, y1) = (x1 as u32, y1 as u32);

        for y in y0..=y1 {
            let dy = y as f32 - src.pos.y;
            for x in x0..=x1 {
                let dx = x as f32 - src.pos.x;
                let t = (dx * dx + dy * dy).sqrt() / radius;
                let w = settings.falloff.weight(t);
                if w > 0.0 {
                    field.deposit(x, y, intensity * w);
                }
            }
        }
    }

    field
}
