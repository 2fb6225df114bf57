//! Amenity heat overlays for slippy maps.
//!
//! The pipeline turns a list of geographic amenities into a translucent
//! RGBA canvas: sources are projected through the host's viewport,
//! accumulated into a scalar heat field with radial falloff, and mapped
//! through a color gradient. A trailing-edge scheduler throttles the whole
//! pass so pan and zoom churn never outruns the CPU.
//!
//! Everything here is synchronous and single-threaded; the host event
//! loop pumps [`overlay::HeatmapOverlay::update`] and parks on the next
//! scheduler deadline in between.

pub mod amenity;
pub mod config;
pub mod field;
pub mod gradient;
pub mod overlay;
pub mod scheduler;
pub mod stats;
pub mod surface;
pub mod viewport;
