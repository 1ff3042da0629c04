use crate::config::{Config, SearchArea};
use crate::core::mosaic::{self, MosaicOutcome};
use crate::core::scene::{Scene, SceneOptions};
use crate::core::SceneId;
use crate::io::command::CommandRunner;
use crate::io::earthexplorer::{SceneQuery, SceneSource};
use crate::types::LandsatResult;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub scenes_processed: usize,
    pub scenes_failed: usize,
    pub queries_failed: usize,
    /// Mosaics written by this run
    pub mosaics: Vec<PathBuf>,
    /// Mosaics left in place from an earlier run
    pub mosaics_existing: Vec<PathBuf>,
    pub mosaics_failed: usize,
}

/// Drives years → paths → rows → scenes, one at a time.
///
/// A failing scene or inventory query is logged and the run moves on.
pub struct Pipeline<'a> {
    config: &'a Config,
    source: &'a dyn SceneSource,
    runner: &'a dyn CommandRunner,
    options: SceneOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, source: &'a dyn SceneSource, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            source,
            runner,
            options: config.scene_options(),
        }
    }

    /// `<output>/<year>/<path>/<row>/<scene_id>`
    pub fn scene_dir(&self, year: i32, path: u32, row: u32, id: &SceneId) -> PathBuf {
        self.path_dir(year, path)
            .join(row.to_string())
            .join(id.as_str())
    }

    pub fn path_dir(&self, year: i32, path: u32) -> PathBuf {
        self.config
            .output_dir
            .join(year.to_string())
            .join(path.to_string())
    }

    pub fn run(&self) -> LandsatResult<RunSummary> {
        let area = self.config.search_area()?;
        let mut summary = RunSummary::default();

        for year in self.config.years() {
            log::info!("Year {}", year);

            match &area {
                SearchArea::PathRow { paths, rows } => {
                    for path in paths.clone() {
                        let mut tiles = Vec::new();

                        for row in rows.clone() {
                            let query = SceneQuery::PathRow { path, row };
                            let scene_ids = match self.query(year, &query, &mut summary) {
                                Some(ids) => ids,
                                None => continue,
                            };

                            for id in scene_ids.into_iter().take(self.config.scenes_per_row) {
                                let dir = self.scene_dir(year, path, row, &id);
                                if let Some(output) = self.process_scene(id, dir, &mut summary) {
                                    tiles.push(output);
                                }
                            }
                        }

                        self.mosaic_path(&self.path_dir(year, path), &tiles, &mut summary);
                    }
                }
                SearchArea::BoundingBox(bbox) => {
                    let query = SceneQuery::BoundingBox(*bbox);
                    let scene_ids = match self.query(year, &query, &mut summary) {
                        Some(ids) => ids,
                        None => continue,
                    };

                    let mut per_row: HashMap<(u32, u32), usize> = HashMap::new();
                    let mut tiles_by_path: BTreeMap<u32, Vec<PathBuf>> = BTreeMap::new();

                    for id in scene_ids {
                        let (path, row) = match (id.path().parse::<u32>(), id.row().parse::<u32>()) {
                            (Ok(path), Ok(row)) => (path, row),
                            _ => {
                                log::error!("{}: non-numeric path/row, skipping", id);
                                summary.scenes_failed += 1;
                                continue;
                            }
                        };

                        let taken = per_row.entry((path, row)).or_insert(0);
                        if *taken >= self.config.scenes_per_row {
                            continue;
                        }
                        *taken += 1;

                        let dir = self.scene_dir(year, path, row, &id);
                        let tiles = tiles_by_path.entry(path).or_default();
                        if let Some(output) = self.process_scene(id, dir, &mut summary) {
                            tiles.push(output);
                        }
                    }

                    for (path, tiles) in tiles_by_path {
                        self.mosaic_path(&self.path_dir(year, path), &tiles, &mut summary);
                    }
                }
            }
        }

        log::info!(
            "Finished: {} scenes processed, {} failed, {} queries failed, {} mosaics written, {} kept",
            summary.scenes_processed,
            summary.scenes_failed,
            summary.queries_failed,
            summary.mosaics.len(),
            summary.mosaics_existing.len()
        );

        Ok(summary)
    }

    fn query(&self, year: i32, query: &SceneQuery, summary: &mut RunSummary) -> Option<Vec<SceneId>> {
        match self.source.find_scenes(year, query) {
            Ok(ids) => {
                if ids.is_empty() {
                    log::info!("No scenes found for {} {:?}", year, query);
                } else {
                    log::info!("Found {} scenes for {} {:?}", ids.len(), year, query);
                }
                Some(ids)
            }
            Err(e) => {
                log::error!("Inventory query for {} {:?} failed: {}", year, query, e);
                summary.queries_failed += 1;
                None
            }
        }
    }

    fn process_scene(&self, id: SceneId, dir: PathBuf, summary: &mut RunSummary) -> Option<PathBuf> {
        let label = id.to_string();
        let result = Scene::new(id, dir, self.options.clone()).and_then(|scene| scene.process(self.runner));

        match result {
            Ok(output) => {
                summary.scenes_processed += 1;
                Some(output)
            }
            Err(e) => {
                log::error!("{}: {}", label, e);
                summary.scenes_failed += 1;
                None
            }
        }
    }

    fn mosaic_path(&self, path_dir: &Path, tiles: &[PathBuf], summary: &mut RunSummary) {
        if !self.config.merge_adjacent {
            return;
        }

        match mosaic::merge_tiles(path_dir, tiles, self.runner) {
            Ok(MosaicOutcome::Written(output)) => summary.mosaics.push(output),
            Ok(MosaicOutcome::Existing(output)) => summary.mosaics_existing.push(output),
            Ok(MosaicOutcome::TooFewTiles(_)) => {}
            Err(e) => {
                log::error!("Mosaic of {} failed: {}", path_dir.display(), e);
                summary.mosaics_failed += 1;
            }
        }
    }
}
