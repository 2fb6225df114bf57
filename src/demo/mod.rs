pub mod basemap;
pub mod camera;
pub mod data;
