/// Heat-to-color mapping.
///
/// A gradient is an ordered table of stops; heat in [0, 1] is mapped by
/// linear interpolation inside the bracketing segment. Alpha is the heat
/// value times the interpolated per-stop opacity, so low heat fades toward
/// transparent even where the stop color itself is saturated.
use serde::Deserialize;

use crate::field::HeatField;

/// One gradient stop: position in [0, 1], sRGB color, opacity multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub t: f32,
    pub color: [u8; 3],
    pub opacity: f32,
}

const fn stop(t: f32, color: [u8; 3], opacity: f32) -> GradientStop {
    GradientStop { t, color, opacity }
}

/// Classic heatmap ramp: cold blue through green and yellow into red.
const THERMAL: [GradientStop; 6] = [
    stop(0.00, [20, 40, 150], 0.00),
    stop(0.35, [36, 120, 232], 0.45),
    stop(0.55, [56, 214, 222], 0.65),
    stop(0.70, [118, 232, 78], 0.80),
    stop(0.85, [248, 214, 68], 0.92),
    stop(1.00, [232, 58, 36], 1.00),
];

/// Cool ramp: deep navy through teal into near-white ice.
const GLACIER: [GradientStop; 5] = [
    stop(0.00, [8, 16, 40], 0.00),
    stop(0.30, [18, 84, 122], 0.50),
    stop(0.60, [42, 168, 198], 0.75),
    stop(0.80, [132, 222, 238], 0.90),
    stop(1.00, [235, 250, 252], 1.00),
];

/// Single-hue warm ramp: embers from near-black red to pale yellow.
const EMBER: [GradientStop; 4] = [
    stop(0.00, [30, 8, 4], 0.00),
    stop(0.40, [158, 36, 18], 0.60),
    stop(0.75, [240, 124, 32], 0.88),
    stop(1.00, [255, 224, 150], 1.00),
];

/// Built-in gradient presets, selectable from config by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gradient {
    Thermal,
    Glacier,
    Ember,
}

impl Default for Gradient {
    fn default() -> Self {
        Gradient::Thermal
    }
}

impl Gradient {
    pub fn stops(self) -> &'static [GradientStop] {
        match self {
            Gradient::Thermal => &THERMAL,
            Gradient::Glacier => &GLACIER,
            Gradient::Ember => &EMBER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Gradient::Thermal => "thermal",
            Gradient::Glacier => "glacier",
            Gradient::Ember => "ember",
        }
    }

    /// Map one heat value to a straight-alpha RGBA pixel.
    ///
    /// Zero or negative heat is fully transparent (all four channels zero),
    /// so untouched cells never tint the map below them. Heat at or above
    /// 1.0 returns the terminal stop exactly.
    pub fn shade(self, heat: f32) -> [u8; 4] {
        // negated compare also routes NaN to transparent
        if !(heat > 0.0) {
            return [0, 0, 0, 0];
        }
        let stops = self.stops();
        let last = stops[stops.len() - 1];
        if heat >= 1.0 {
            let [r, g, b] = last.color;
            return [r, g, b, channel(last.opacity)];
        }

        let mut seg = 0;
        while seg + 2 < stops.len() && heat >= stops[seg + 1].t {
            seg += 1;
        }
        let lo = stops[seg];
        let hi = stops[seg + 1];
        let span = hi.t - lo.t;
        let s = if span > 0.0 { (heat - lo.t) / span } else { 1.0 };

        let r = lerp(lo.color[0] as f32, hi.color[0] as f32, s);
        let g = lerp(lo.color[1] as f32, hi.color[1] as f32, s);
        let b = lerp(lo.color[2] as f32, hi.color[2] as f32, s);
        let opacity = lerp(lo.opacity, hi.opacity, s);

        [
            channel(r / 255.0),
            channel(g / 255.0),
            channel(b / 255.0),
            channel(heat * opacity),
        ]
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Colorize a heat field into a straight-alpha RGBA8 buffer.
///
/// The buffer is resized to `width * height * 4` and fully rewritten;
/// an empty field therefore yields an all-transparent buffer at the
/// field's dimensions.
pub fn colorize(field: &HeatField, gradient: Gradient, out: &mut Vec<u8>) {
    let len = field.width() as usize * field.height() as usize * 4;
    out.resize(len, 0);
    for (cell, px) in field.cells().iter().zip(out.chunks_exact_mut(4)) {
        px.copy_from_slice(&gradient.shade(*cell));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESETS: [Gradient; 3] = [Gradient::Thermal, Gradient::Glacier, Gradient::Ember];

    #[test]
    fn zero_and_negative_heat_are_fully_transparent() {
        for grad in PRESETS {
            assert_eq!(grad.shade(0.0), [0, 0, 0, 0]);
            assert_eq!(grad.shade(-0.5), [0, 0, 0, 0]);
            assert_eq!(grad.shade(f32::NAN), [0, 0, 0, 0]);
        }
    }

    #[test]
    fn saturated_heat_hits_terminal_stop_exactly() {
        for grad in PRESETS {
            let stops = grad.stops();
            let last = stops[stops.len() - 1];
            let want = [last.color[0], last.color[1], last.color[2], 255];
            assert_eq!(grad.shade(1.0), want, "{}", grad.name());
            // overshoot collapses to the same terminal color
            assert_eq!(grad.shade(4.0), want, "{}", grad.name());
        }
    }

    #[test]
    fn stops_are_ordered_and_span_unit_interval() {
        for grad in PRESETS {
            let stops = grad.stops();
            assert_eq!(stops[0].t, 0.0, "{}", grad.name());
            assert_eq!(stops[stops.len() - 1].t, 1.0, "{}", grad.name());
            assert_eq!(stops[stops.len() - 1].opacity, 1.0, "{}", grad.name());
            for pair in stops.windows(2) {
                assert!(pair[0].t < pair[1].t, "{}", grad.name());
            }
        }
    }

    #[test]
    fn ramps_are_continuous() {
        // Adjacent samples along the ramp should never jump more than a few
        // counts in any channel; a larger step means a broken segment seam.
        for grad in PRESETS {
            let mut prev = grad.shade(1.0 / 256.0);
            for i in 2..=256 {
                let cur = grad.shade(i as f32 / 256.0);
                for c in 0..4 {
                    let diff = (cur[c] as i16 - prev[c] as i16).abs();
                    assert!(
                        diff <= 5,
                        "{} channel {} jumped {} near t={}",
                        grad.name(),
                        c,
                        diff,
                        i as f32 / 256.0
                    );
                }
                prev = cur;
            }
        }
    }

    #[test]
    fn alpha_scales_with_heat() {
        for grad in PRESETS {
            let low = grad.shade(0.2)[3];
            let mid = grad.shade(0.5)[3];
            let high = grad.shade(0.95)[3];
            assert!(low < mid && mid < high, "{}", grad.name());
        }
    }

    #[test]
    fn colorize_empty_field_is_all_transparent() {
        let field = HeatField::new(16, 8);
        let mut buf = Vec::new();
        colorize(&field, Gradient::Thermal, &mut buf);
        assert_eq!(buf.len(), 16 * 8 * 4);
        assert!(buf.iter().all(|b| *b == 0));
    }

    #[test]
    fn colorize_writes_hot_cell() {
        let mut field = HeatField::new(4, 4);
        field.set(2, 1, 1.0);
        let mut buf = Vec::new();
        colorize(&field, Gradient::Thermal, &mut buf);

        let (x, y) = (2usize, 1usize);
        let i = (y * 4 + x) * 4;
        let stops = Gradient::Thermal.stops();
        let last = stops[stops.len() - 1];
        assert_eq!(&buf[i..i + 4], &[last.color[0], last.color[1], last.color[2], 255]);
        // neighbor stays transparent
        assert_eq!(&buf[0..4], &[0, 0, 0, 0]);
    }
}
