/// Procedural basemap: a dark street grid with scattered park blocks.
///
/// Stands in for real map tiles so the demo runs without any network.
/// Drawn fresh from the camera every presented frame; lat lines are
/// horizontal and lng lines vertical under Mercator, so the whole thing
/// reduces to axis-aligned fills.
use glowmap::viewport::{LatLng, MapViewport};

use super::camera::Camera;

const BG: [u8; 3] = [16, 18, 26];
const MINOR_LINE: [u8; 3] = [30, 34, 46];
const MAJOR_LINE: [u8; 3] = [44, 50, 66];
const PARK: [u8; 3] = [24, 42, 34];

/// Keep street spacing in this pixel range across zooms.
const MIN_STEP_PX: f64 = 48.0;

pub fn render(buf: &mut Vec<u8>, cam: &Camera) {
    let (w, h) = cam.size_px();
    buf.resize(w as usize * h as usize * 4, 0);
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&[BG[0], BG[1], BG[2], 255]);
    }
    if w == 0 || h == 0 {
        return;
    }

    let step = grid_step(cam.pixels_per_degree());
    let bounds = cam.bounds();
    let i0 = (bounds.west / step).floor() as i64;
    let i1 = (bounds.east / step).ceil() as i64;
    let j0 = (bounds.south / step).floor() as i64;
    let j1 = (bounds.north / step).ceil() as i64;

    // park blocks under the street lines
    for j in j0..j1 {
        for i in i0..i1 {
            if block_hash(i, j) % 9 != 0 {
                continue;
            }
            let nw = cam.project(LatLng::new((j + 1) as f64 * step, i as f64 * step));
            let se = cam.project(LatLng::new(j as f64 * step, (i + 1) as f64 * step));
            fill_rect(buf, w, h, nw.x, nw.y, se.x, se.y, PARK);
        }
    }

    // vertical streets (constant longitude)
    for i in i0..=i1 {
        let lng = i as f64 * step;
        let x = cam.project(LatLng::new(cam.center().lat, lng)).x;
        let (thickness, color) = if i.rem_euclid(5) == 0 {
            (2.0, MAJOR_LINE)
        } else {
            (1.0, MINOR_LINE)
        };
        fill_rect(buf, w, h, x, 0.0, x + thickness, h as f32, color);
    }

    // horizontal streets (constant latitude)
    for j in j0..=j1 {
        let lat = j as f64 * step;
        let y = cam.project(LatLng::new(lat, cam.center().lng)).y;
        let (thickness, color) = if j.rem_euclid(5) == 0 {
            (2.0, MAJOR_LINE)
        } else {
            (1.0, MINOR_LINE)
        };
        fill_rect(buf, w, h, 0.0, y, w as f32, y + thickness, color);
    }
}

/// Street spacing in degrees, tuned so lines sit 48-96 px apart.
fn grid_step(ppd: f64) -> f64 {
    let mut step = 0.02;
    while step * ppd > 2.0 * MIN_STEP_PX {
        step /= 2.0;
    }
    while step * ppd < MIN_STEP_PX {
        step *= 2.0;
    }
    step
}

fn block_hash(i: i64, j: i64) -> u64 {
    let mut h = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (j as u64).wrapping_mul(0xD1B5_4A32_D192_ED03);
    h ^= h >> 31;
    h
}

fn fill_rect(buf: &mut [u8], w: u32, h: u32, x0: f32, y0: f32, x1: f32, y1: f32, color: [u8; 3]) {
    let x0 = x0.max(0.0).min(w as f32) as u32;
    let x1 = x1.max(0.0).min(w as f32) as u32;
    let y0 = y0.max(0.0).min(h as f32) as u32;
    let y1 = y1.max(0.0).min(h as f32) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            let idx = (y * w + x) as usize * 4;
            buf[idx] = color[0];
            buf[idx + 1] = color[1];
            buf[idx + 2] = color[2];
            buf[idx + 3] = 255;
        }
    }
}
