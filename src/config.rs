//! YAML run configuration.
//!
//! ```yaml
//! start_year: 1985
//! end_year: 1990
//! path_start: 39
//! path_end: 39
//! row_start: 35
//! row_end: 36
//! max_cloud_cover: 10
//! cutline: cutline.shp
//! ```
//!
//! A `bounding_box` may be given instead of the path/row ranges.

use crate::core::scene::{ColorCorrection, Cutline, MergeTool, SceneOptions, DEFAULT_TARGET_SRS};
use crate::io::earthexplorer::DEFAULT_INVENTORY_URL;
use crate::types::{BoundingBox, ColorMode, LandsatError, LandsatResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub start_year: i32,
    pub end_year: i32,

    #[serde(default)]
    pub path_start: Option<u32>,
    #[serde(default)]
    pub path_end: Option<u32>,
    #[serde(default)]
    pub row_start: Option<u32>,
    #[serde(default)]
    pub row_end: Option<u32>,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default)]
    pub max_cloud_cover: f64,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_scenes_per_row")]
    pub scenes_per_row: usize,

    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default = "default_target_srs")]
    pub target_srs: String,
    #[serde(default)]
    pub merge_tool: MergeTool,
    #[serde(default = "default_true")]
    pub merge_adjacent: bool,
    #[serde(default)]
    pub cutline: Option<Cutline>,
    #[serde(default)]
    pub color_correction: ColorCorrection,

    #[serde(default = "default_inventory_url")]
    pub inventory_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_scenes_per_row() -> usize {
    1
}

fn default_target_srs() -> String {
    DEFAULT_TARGET_SRS.to_string()
}

fn default_true() -> bool {
    true
}

fn default_inventory_url() -> String {
    DEFAULT_INVENTORY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Where to look for scenes, resolved from the configuration
#[derive(Debug, Clone, PartialEq)]
pub enum SearchArea {
    PathRow {
        paths: RangeInclusive<u32>,
        rows: RangeInclusive<u32>,
    },
    BoundingBox(BoundingBox),
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> LandsatResult<Self> {
        let path = path.as_ref();
        log::info!("Loading configuration: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            LandsatError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_yaml(&content)?;

        // Relative cutline files are resolved against the config file
        if let Some(Cutline::File(cutline)) = config.cutline.as_mut() {
            if let Some(dir) = path.parent().filter(|_| cutline.is_relative()) {
                *cutline = dir.join(&*cutline);
            }
        }

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> LandsatResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| LandsatError::Config(format!("Invalid YAML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LandsatResult<()> {
        if self.start_year > self.end_year {
            return Err(LandsatError::Config(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }

        if !(0.0..=100.0).contains(&self.max_cloud_cover) {
            return Err(LandsatError::Config(format!(
                "max_cloud_cover must be between 0 and 100, got {}",
                self.max_cloud_cover
            )));
        }

        if self.scenes_per_row == 0 {
            return Err(LandsatError::Config("scenes_per_row must be at least 1".to_string()));
        }

        self.search_area()?;

        if let Some(Cutline::Polygon(points)) = &self.cutline {
            if points.len() < 3 {
                return Err(LandsatError::Config(format!(
                    "cutline polygon needs at least 3 vertices, got {}",
                    points.len()
                )));
            }
        }

        if let ColorCorrection::Levels { levels } = &self.color_correction {
            for (channel, [low, high]) in [("red", levels.red), ("green", levels.green), ("blue", levels.blue)] {
                if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
                    return Err(LandsatError::Config(format!(
                        "{} levels must satisfy 0 <= low < high <= 100, got [{}, {}]",
                        channel, low, high
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Path/row ranges when all four bounds are set, else the bounding box
    pub fn search_area(&self) -> LandsatResult<SearchArea> {
        match (self.path_start, self.path_end, self.row_start, self.row_end) {
            (Some(path_start), Some(path_end), Some(row_start), Some(row_end)) => {
                if self.bounding_box.is_some() {
                    return Err(LandsatError::Config(
                        "Specify either path/row ranges or bounding_box, not both".to_string(),
                    ));
                }
                if path_start > path_end || row_start > row_end {
                    return Err(LandsatError::Config(format!(
                        "Empty path/row range: paths {}..={}, rows {}..={}",
                        path_start, path_end, row_start, row_end
                    )));
                }
                Ok(SearchArea::PathRow {
                    paths: path_start..=path_end,
                    rows: row_start..=row_end,
                })
            }
            (None, None, None, None) => match self.bounding_box {
                Some(bbox) => {
                    bbox.validate()?;
                    Ok(SearchArea::BoundingBox(bbox))
                }
                None => Err(LandsatError::Config(
                    "Either path_start/path_end/row_start/row_end or bounding_box is required"
                        .to_string(),
                )),
            },
            _ => Err(LandsatError::Config(
                "path_start, path_end, row_start and row_end must be given together".to_string(),
            )),
        }
    }

    pub fn scene_options(&self) -> SceneOptions {
        SceneOptions {
            color_mode: self.color_mode,
            target_srs: self.target_srs.clone(),
            merge_tool: self.merge_tool,
            cutline: self.cutline.clone(),
            color_correction: self.color_correction.clone(),
        }
    }
}
