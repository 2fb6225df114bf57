/// YAML configuration with defaults for every field.
///
/// A missing file or a partial document is normal; whatever is absent
/// falls back to the built-in values, and only a file that fails to parse
/// earns a warning.
use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::field::Falloff;
use crate::gradient::Gradient;

/// Coarse zoom classification driving throttle cadence and source caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomBand {
    Far,
    Mid,
    Near,
}

/// Band edges in zoom levels. Anything unclassifiable (NaN before the
/// map reports a zoom) lands in the middle band.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ZoomBands {
    pub far_below: f64,
    pub near_above: f64,
}

impl Default for ZoomBands {
    fn default() -> Self {
        Self {
            far_below: 11.0,
            near_above: 14.5,
        }
    }
}

impl ZoomBands {
    pub fn classify(&self, zoom: f64) -> ZoomBand {
        if zoom < self.far_below {
            ZoomBand::Far
        } else if zoom > self.near_above {
            ZoomBand::Near
        } else {
            ZoomBand::Mid
        }
    }
}

/// Throttle interval per band, in milliseconds. Zoomed-out views cover
/// more sources per pass, so they rerender less often.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ThrottleBands {
    pub far_ms: u64,
    pub mid_ms: u64,
    pub near_ms: u64,
}

impl Default for ThrottleBands {
    fn default() -> Self {
        Self {
            far_ms: 250,
            mid_ms: 150,
            near_ms: 90,
        }
    }
}

impl ThrottleBands {
    pub fn interval(&self, band: ZoomBand) -> Duration {
        let ms = match band {
            ZoomBand::Far => self.far_ms,
            ZoomBand::Mid => self.mid_ms,
            ZoomBand::Near => self.near_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Per-pass source ceiling per band; accumulation cost is linear in this.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SourceCaps {
    pub far: usize,
    pub mid: usize,
    pub near: usize,
}

impl Default for SourceCaps {
    fn default() -> Self {
        Self {
            far: 150,
            mid: 300,
            near: 500,
        }
    }
}

impl SourceCaps {
    pub fn cap(&self, band: ZoomBand) -> usize {
        match band {
            ZoomBand::Far => self.far,
            ZoomBand::Mid => self.mid,
            ZoomBand::Near => self.near,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub gradient: Gradient,
    pub falloff: Falloff,
    pub base_radius_px: f32,
    pub min_radius_px: f32,
    pub intensity: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            gradient: Gradient::Thermal,
            falloff: Falloff::Quadratic,
            base_radius_px: 60.0,
            min_radius_px: 12.0,
            intensity: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Demo camera start position (lower Manhattan by default).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lat: 40.7128,
            lng: -74.0060,
            zoom: 13.0,
        }
    }
}

/// Synthetic dataset knobs for the demo viewer.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub amenities: usize,
    pub seed: u64,
    /// Scatter radius around the camera start, in degrees.
    pub spread: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            amenities: 900,
            seed: 7,
            spread: 0.06,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub overlay: OverlayConfig,
    pub zoom_bands: ZoomBands,
    pub throttle: ThrottleBands,
    pub caps: SourceCaps,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub data: DataConfig,
}

impl Config {
    pub const DEFAULT_PATH: &'static str = "glowmap.yaml";

    pub fn load(path: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match serde_yaml::from_str(&text) {
                Ok(cfg) => {
                    log::info!("loaded config from {path}");
                    cfg
                }
                Err(err) => {
                    log::warn!("config at {path} failed to parse ({err}), using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("no config at {path}, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let cfg = Config::default();
        assert_eq!(cfg.overlay.gradient, Gradient::Thermal);
        assert_eq!(cfg.overlay.falloff, Falloff::Quadratic);
        assert_eq!(cfg.overlay.base_radius_px, 60.0);
        assert_eq!(cfg.throttle.mid_ms, 150);
        assert_eq!(cfg.caps.near, 500);
        assert_eq!(cfg.window.width, 1280);
        assert_eq!(cfg.data.amenities, 900);
    }

    #[test]
    fn partial_yaml_keeps_defaults_elsewhere() {
        let text = "overlay:\n  gradient: glacier\nthrottle:\n  near_ms: 60\n";
        let cfg: Config = serde_yaml::from_str(text).unwrap();

        assert_eq!(cfg.overlay.gradient, Gradient::Glacier);
        // untouched fields in a touched section keep their defaults
        assert_eq!(cfg.overlay.base_radius_px, 60.0);
        assert_eq!(cfg.throttle.near_ms, 60);
        assert_eq!(cfg.throttle.far_ms, 250);
        // untouched sections are fully default
        assert_eq!(cfg.caps.mid, 300);
    }

    #[test]
    fn full_document_parses() {
        let text = "\
overlay:
  gradient: ember
  falloff: gaussian
  base_radius_px: 45.0
  min_radius_px: 8.0
  intensity: 0.6
zoom_bands:
  far_below: 10.0
  near_above: 15.0
throttle:
  far_ms: 400
  mid_ms: 200
  near_ms: 80
caps:
  far: 100
  mid: 250
  near: 600
window:
  width: 1024
  height: 768
camera:
  lat: 51.5074
  lng: -0.1278
  zoom: 12.0
data:
  amenities: 400
  seed: 99
  spread: 0.03
";
        let cfg: Config = serde_yaml::from_str(text).unwrap();
        assert_eq!(cfg.overlay.gradient, Gradient::Ember);
        assert_eq!(cfg.overlay.falloff, Falloff::Gaussian);
        assert_eq!(cfg.zoom_bands.near_above, 15.0);
        assert_eq!(cfg.throttle.far_ms, 400);
        assert_eq!(cfg.caps.near, 600);
        assert_eq!(cfg.camera.zoom, 12.0);
        assert_eq!(cfg.data.seed, 99);
    }

    #[test]
    fn zoom_bands_classify_with_mid_fallback() {
        let bands = ZoomBands::default();
        assert_eq!(bands.classify(9.0), ZoomBand::Far);
        assert_eq!(bands.classify(13.0), ZoomBand::Mid);
        assert_eq!(bands.classify(16.0), ZoomBand::Near);
        // edges belong to the middle band
        assert_eq!(bands.classify(bands.far_below), ZoomBand::Mid);
        assert_eq!(bands.classify(bands.near_above), ZoomBand::Mid);
        // unknown zoom before the map reports one
        assert_eq!(bands.classify(f64::NAN), ZoomBand::Mid);
    }

    #[test]
    fn band_tables_map_through() {
        let throttle = ThrottleBands::default();
        assert_eq!(throttle.interval(ZoomBand::Far), Duration::from_millis(250));
        assert_eq!(throttle.interval(ZoomBand::Near), Duration::from_millis(90));

        let caps = SourceCaps::default();
        assert_eq!(caps.cap(ZoomBand::Far), 150);
        assert_eq!(caps.cap(ZoomBand::Near), 500);
    }

    #[test]
    fn load_falls_back_on_missing_or_broken_files() {
        let cfg = Config::load("/definitely/not/here/glowmap.yaml");
        assert_eq!(cfg.window.width, 1280);

        let path = std::env::temp_dir().join("glowmap_broken_config_test.yaml");
        fs::write(&path, "overlay: [this is not a map").unwrap();
        let cfg = Config::load(path.to_str().unwrap());
        assert_eq!(cfg.overlay.base_radius_px, 60.0);
        let _ = fs::remove_file(&path);
    }
}
