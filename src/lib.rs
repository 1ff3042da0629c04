//! landsat: search, download and composite Landsat scenes.
//!
//! Scene identifiers come from the USGS EarthExplorer inventory, archives from
//! the public Earth Engine bucket. Reprojection, stacking, cropping and color
//! correction are handed to GDAL, rasterio and ImageMagick command-line tools.

pub mod types;
pub mod config;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Band, BandTriplet, BoundingBox, ColorMode, LandsatError, LandsatResult, Sensor,
};

pub use config::{Config, SearchArea};
pub use core::{Pipeline, RunSummary, Satellite, Scene, SceneId, SceneOptions};
pub use io::{CommandRunner, EarthExplorer, ProcessRunner, SceneQuery, SceneSource};
