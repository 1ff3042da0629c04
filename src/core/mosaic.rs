use crate::io::command::{CommandRunner, ExternalCommand};
use crate::types::LandsatResult;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MOSAIC_FILE_NAME: &str = "merged.tif";

/// What `merge_tiles` did for one path directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MosaicOutcome {
    /// `gdal_merge.py` wrote the mosaic in this call
    Written(PathBuf),
    /// The mosaic was already on disk
    Existing(PathBuf),
    /// Fewer than two tiles, nothing to merge
    TooFewTiles(usize),
}

/// Find per-scene rasters named `file_name` under `<path_dir>/<row>/<scene>/`
pub fn find_tiles(path_dir: &Path, file_name: &str) -> LandsatResult<Vec<PathBuf>> {
    let mut tiles = Vec::new();

    if !path_dir.exists() {
        return Ok(tiles);
    }

    for entry in WalkDir::new(path_dir).min_depth(3).max_depth(3) {
        let entry = entry.map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::Other, format!("Failed to walk {}: {}", path_dir.display(), e))
        })?;
        if entry.file_type().is_file() && entry.file_name() == file_name {
            tiles.push(entry.into_path());
        }
    }

    tiles.sort();
    Ok(tiles)
}

/// Mosaic adjacent scene tiles of one path into `<path_dir>/merged.tif`
pub fn merge_tiles(
    path_dir: &Path,
    tiles: &[PathBuf],
    runner: &dyn CommandRunner,
) -> LandsatResult<MosaicOutcome> {
    let tiles: Vec<&PathBuf> = tiles.iter().filter(|t| t.exists()).collect();

    if tiles.len() < 2 {
        log::debug!(
            "{}: {} tile(s), nothing to mosaic",
            path_dir.display(),
            tiles.len()
        );
        return Ok(MosaicOutcome::TooFewTiles(tiles.len()));
    }

    let output = path_dir.join(MOSAIC_FILE_NAME);
    if output.exists() {
        log::debug!("{} present, skipping mosaic", output.display());
        return Ok(MosaicOutcome::Existing(output));
    }

    log::info!("Merging {} tiles into {}", tiles.len(), output.display());

    let mut cmd = ExternalCommand::new("gdal_merge.py").arg("-o").path_arg(&output);
    for tile in tiles {
        cmd = cmd.path_arg(tile);
    }
    runner.run(&cmd)?;

    Ok(MosaicOutcome::Written(output))
}
