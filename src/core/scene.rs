use crate::core::{Satellite, SceneId};
use crate::io::command::{CommandRunner, ExternalCommand};
use crate::io::storage;
use crate::types::{BandTriplet, ColorMode, LandsatError, LandsatResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET_SRS: &str = "EPSG:3857";

/// Tool used to stack the projected bands into one RGB raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeTool {
    /// `gdal_merge.py -separate`
    #[default]
    GdalMerge,
    /// `rio stack --rgb`
    RioStack,
}

/// Area of interest to crop the merged raster to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cutline {
    /// Any vector file gdalwarp can read
    File(PathBuf),
    /// Polygon ring as `[lon, lat]` pairs
    Polygon(Vec<[f64; 2]>),
}

/// Per-channel `-level low%,high%` stretch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLevels {
    pub red: [f64; 2],
    pub green: [f64; 2],
    pub blue: [f64; 2],
}

impl Default for ChannelLevels {
    /// Leveling tuned on 1985 Las Vegas TM imagery
    fn default() -> Self {
        Self {
            red: [8.0, 46.0],
            green: [11.0, 37.0],
            blue: [28.0, 61.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionMethod {
    /// Histogram equalization
    Equalize,
    /// Leave the composite untouched
    #[serde(rename = "none")]
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorCorrection {
    Levels { levels: ChannelLevels },
    Method(CorrectionMethod),
}

impl Default for ColorCorrection {
    fn default() -> Self {
        ColorCorrection::Levels {
            levels: ChannelLevels::default(),
        }
    }
}

/// Processing choices shared by every scene in a run
#[derive(Debug, Clone, PartialEq)]
pub struct SceneOptions {
    pub color_mode: ColorMode,
    pub target_srs: String,
    pub merge_tool: MergeTool,
    pub cutline: Option<Cutline>,
    pub color_correction: ColorCorrection,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::default(),
            target_srs: DEFAULT_TARGET_SRS.to_string(),
            merge_tool: MergeTool::default(),
            cutline: None,
            color_correction: ColorCorrection::default(),
        }
    }
}

/// Processing for a single scene.
///
/// Every step checks for its output before doing any work, so a scene can be
/// re-run after a failure and picks up where it stopped.
pub struct Scene {
    id: SceneId,
    satellite: Satellite,
    bands: BandTriplet,
    output_dir: PathBuf,
    options: SceneOptions,
}

impl Scene {
    pub fn new(id: SceneId, output_dir: impl Into<PathBuf>, options: SceneOptions) -> LandsatResult<Self> {
        let satellite = Satellite::for_scene(id.version()?, id.sensor_code())?;
        let bands = satellite.bands(options.color_mode)?;

        Ok(Self {
            id,
            satellite,
            bands,
            output_dir: output_dir.into(),
            options,
        })
    }

    pub fn id(&self) -> &SceneId {
        &self.id
    }

    pub fn satellite(&self) -> &Satellite {
        &self.satellite
    }

    pub fn bands(&self) -> &BandTriplet {
        &self.bands
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(storage::archive_name(&self.id))
    }

    pub fn band_path(&self, band: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.TIF", self.id, band))
    }

    /// 8-bit copy of a band, only written for Landsat 8
    pub fn rescaled_path(&self, band: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}_8bit.TIF", self.id, band))
    }

    fn warp_source(&self, band: &str) -> PathBuf {
        if self.satellite.needs_8bit_conversion() {
            self.rescaled_path(band)
        } else {
            self.band_path(band)
        }
    }

    pub fn projected_path(&self, band: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}-projected.tif", self.id, band))
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_RGB-projected.tif", self.id))
    }

    pub fn cropped_path(&self) -> PathBuf {
        self.output_dir.join("crop.tif")
    }

    /// Raster the color correction reads: the crop when a cutline is set
    pub fn color_input_path(&self) -> PathBuf {
        if self.options.cutline.is_some() {
            self.cropped_path()
        } else {
            self.merged_path()
        }
    }

    pub fn corrected_path(&self) -> PathBuf {
        let input = self.color_input_path();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output_dir.join(format!("{}-corrected.tif", stem))
    }

    /// Last raster the pipeline produces for this scene
    pub fn final_output_path(&self) -> PathBuf {
        match self.options.color_correction {
            ColorCorrection::Method(CorrectionMethod::Skip) => self.color_input_path(),
            _ => self.corrected_path(),
        }
    }

    pub fn zip_exists(&self) -> bool {
        self.archive_path().exists()
    }

    pub fn band_files_exist(&self) -> bool {
        self.missing_band_file().is_none()
    }

    pub fn projected_files_exist(&self) -> bool {
        self.bands.iter().all(|b| self.projected_path(b).exists())
    }

    pub fn merged_file_exists(&self) -> bool {
        self.merged_path().exists()
    }

    pub fn cropped_file_exists(&self) -> bool {
        self.cropped_path().exists()
    }

    pub fn color_corrected_file_exists(&self) -> bool {
        self.corrected_path().exists()
    }

    fn missing_band_file(&self) -> Option<PathBuf> {
        self.bands
            .iter()
            .map(|b| self.band_path(b))
            .find(|p| !p.exists())
    }

    /// Download the scene archive from the public bucket
    pub fn download(&self, runner: &dyn CommandRunner) -> LandsatResult<()> {
        if self.zip_exists() {
            log::debug!("{}: archive present, skipping download", self.id);
            return Ok(());
        }

        fs::create_dir_all(&self.output_dir)?;

        let url = storage::archive_url(&self.id, &self.satellite);
        runner.run(&storage::copy_command(&url, &self.output_dir))
    }

    /// Extract the archive, renaming every member to `<scene_id>_<band>.TIF`
    pub fn unzip(&self, runner: &dyn CommandRunner) -> LandsatResult<()> {
        if !self.zip_exists() {
            return Err(LandsatError::MissingInput(self.archive_path()));
        }

        if self.band_files_exist() {
            log::debug!("{}: band files present, skipping unzip", self.id);
            return Ok(());
        }

        let cmd = ExternalCommand::new("tar")
            .arg("--transform")
            .arg(format!("s/^.*_/{}_/g", self.id))
            .arg("-xzvf")
            .arg(storage::archive_name(&self.id))
            .current_dir(&self.output_dir);

        runner.run(&cmd)
    }

    /// Rescale a 16-bit band into `<scene_id>_<band>_8bit.TIF`, leaving the original untouched
    fn convert_to_8bit(&self, band: &str, runner: &dyn CommandRunner) -> LandsatResult<()> {
        let rescaled = self.rescaled_path(band);
        if rescaled.exists() {
            log::debug!("{}: {} already rescaled", self.id, band);
            return Ok(());
        }

        let tmp_path = self.output_dir.join(format!("{}_{}_tmp.TIF", self.id, band));

        let cmd = ExternalCommand::new("gdal_translate")
            .args(["-of", "GTiff", "-co", "COMPRESS=LZW"])
            .args(["-scale", "0", "65535", "0", "255", "-ot", "Byte"])
            .path_arg(self.band_path(band))
            .path_arg(&tmp_path);
        runner.run(&cmd)?;

        fs::rename(&tmp_path, &rescaled)?;
        Ok(())
    }

    /// Reproject each selected band to the target SRS
    pub fn project_bands(&self, runner: &dyn CommandRunner) -> LandsatResult<()> {
        if let Some(missing) = self.missing_band_file() {
            return Err(LandsatError::MissingInput(missing));
        }

        if self.projected_files_exist() {
            log::debug!("{}: projected bands present, skipping projection", self.id);
            return Ok(());
        }

        for band in self.bands.iter() {
            let projected = self.projected_path(band);
            if projected.exists() {
                continue;
            }

            if self.satellite.needs_8bit_conversion() {
                self.convert_to_8bit(band, runner)?;
            }

            let cmd = ExternalCommand::new("gdalwarp")
                .arg("-t_srs")
                .arg(&self.options.target_srs)
                .path_arg(self.warp_source(band))
                .path_arg(&projected);
            runner.run(&cmd)?;
        }

        Ok(())
    }

    /// Stack the projected bands into a single RGB raster
    pub fn merge_bands(&self, runner: &dyn CommandRunner) -> LandsatResult<()> {
        if let Some(missing) = self
            .bands
            .iter()
            .map(|b| self.projected_path(b))
            .find(|p| !p.exists())
        {
            return Err(LandsatError::MissingInput(missing));
        }

        if self.merged_file_exists() {
            log::debug!("{}: merged raster present, skipping merge", self.id);
            return Ok(());
        }

        let inputs: Vec<PathBuf> = self.bands.iter().map(|b| self.projected_path(b)).collect();
        let output = self.merged_path();

        let cmd = match self.options.merge_tool {
            MergeTool::GdalMerge => {
                let mut cmd = ExternalCommand::new("gdal_merge.py")
                    .arg("-separate")
                    .arg("-o")
                    .path_arg(&output);
                for input in &inputs {
                    cmd = cmd.path_arg(input);
                }
                cmd
            }
            MergeTool::RioStack => {
                let mut cmd = ExternalCommand::new("rio").arg("stack").arg("--rgb");
                for input in &inputs {
                    cmd = cmd.path_arg(input);
                }
                cmd.path_arg(&output)
            }
        };

        runner.run(&cmd)
    }

    /// Write an inline polygon cutline as GeoJSON next to the scene outputs
    fn cutline_file(&self, cutline: &Cutline) -> LandsatResult<PathBuf> {
        match cutline {
            Cutline::File(path) => Ok(path.clone()),
            Cutline::Polygon(points) => {
                let path = self.output_dir.join("cutline.geojson");
                fs::write(&path, polygon_geojson(points))?;
                Ok(path)
            }
        }
    }

    /// Crop the merged raster to the cutline; a no-op without one
    pub fn crop(&self, runner: &dyn CommandRunner) -> LandsatResult<()> {
        let cutline = match &self.options.cutline {
            Some(cutline) => cutline,
            None => return Ok(()),
        };

        if !self.merged_file_exists() {
            return Err(LandsatError::MissingInput(self.merged_path()));
        }

        if self.cropped_file_exists() {
            log::debug!("{}: crop present, skipping crop", self.id);
            return Ok(());
        }

        let cutline_path = self.cutline_file(cutline)?;

        let cmd = ExternalCommand::new("gdalwarp")
            .arg("-cutline")
            .path_arg(&cutline_path)
            .arg("-crop_to_cutline")
            .path_arg(self.merged_path())
            .path_arg(self.cropped_path());

        runner.run(&cmd)
    }

    /// Stretch or equalize the composite with ImageMagick
    pub fn color_correct(&self, runner: &dyn CommandRunner) -> LandsatResult<()> {
        let input = self.color_input_path();
        if !input.exists() {
            return Err(LandsatError::MissingInput(input));
        }

        let levels = match &self.options.color_correction {
            ColorCorrection::Method(CorrectionMethod::Skip) => return Ok(()),
            ColorCorrection::Method(CorrectionMethod::Equalize) => None,
            ColorCorrection::Levels { levels } => Some(levels),
        };

        if self.color_corrected_file_exists() {
            log::debug!("{}: corrected raster present, skipping color correction", self.id);
            return Ok(());
        }

        let output = self.corrected_path();
        let cmd = match levels {
            Some(levels) => {
                let mut cmd = ExternalCommand::new("convert");
                for (channel, [low, high]) in [("R", levels.red), ("G", levels.green), ("B", levels.blue)] {
                    cmd = cmd
                        .arg("-channel")
                        .arg(channel)
                        .arg("-level")
                        .arg(format!("{}%,{}%", low, high));
                }
                cmd.path_arg(&input).path_arg(&output)
            }
            None => ExternalCommand::new("convert")
                .path_arg(&input)
                .arg("-equalize")
                .path_arg(&output),
        };

        runner.run(&cmd)
    }

    /// Run every step in order, stopping at the first failure
    pub fn process(&self, runner: &dyn CommandRunner) -> LandsatResult<PathBuf> {
        log::info!("Processing {} into {}", self.id, self.output_dir.display());

        self.download(runner)?;
        self.unzip(runner)?;
        self.project_bands(runner)?;
        self.merge_bands(runner)?;
        self.crop(runner)?;
        self.color_correct(runner)?;

        Ok(self.final_output_path())
    }
}

/// GeoJSON FeatureCollection holding one polygon, ring closed if needed
pub fn polygon_geojson(points: &[[f64; 2]]) -> String {
    let mut ring: Vec<[f64; 2]> = points.to_vec();
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }

    serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [ring],
            },
        }],
    })
    .to_string()
}
