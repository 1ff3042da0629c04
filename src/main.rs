//! Landsat scene pipeline command-line interface.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use landsat::core::{find_tiles, merge_tiles, MosaicOutcome};
use landsat::io::{DryRunner, ProcessRunner};
use landsat::{
    BoundingBox, ColorMode, CommandRunner, Config, EarthExplorer, Pipeline, Satellite, Scene,
    SceneId, SceneOptions, SceneQuery, SceneSource, Sensor,
};

#[derive(Parser, Debug)]
#[command(name = "landsat")]
#[command(about = "Search, download and composite Landsat scenes")]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log external commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline described by a YAML configuration
    Run {
        config: PathBuf,
    },

    /// List scene identifiers matching a year and area
    Search {
        #[arg(long)]
        year: i32,

        #[arg(long, requires = "row", conflicts_with = "bbox")]
        path: Option<u32>,

        #[arg(long, requires = "path")]
        row: Option<u32>,

        /// north,west,south,east in decimal degrees
        #[arg(long)]
        bbox: Option<BoundingBox>,

        #[arg(long, default_value = "0")]
        max_cloud_cover: f64,

        #[arg(long, env = "LANDSAT_INVENTORY_URL")]
        inventory_url: Option<String>,
    },

    /// Print the band triplet for a satellite and composite
    Bands {
        /// Landsat generation (1-8)
        #[arg(long)]
        satellite: u8,

        /// Sensor code (M, T, E, C); defaults to the satellite's main sensor
        #[arg(long)]
        sensor: Option<char>,

        #[arg(long, default_value = "natural")]
        mode: ColorMode,
    },

    /// Decode a scene identifier
    Info {
        scene_id: SceneId,
    },

    /// Process a single scene into a directory
    Process {
        scene_id: SceneId,

        #[arg(long)]
        output_dir: PathBuf,

        /// Take processing options from this configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Mosaic per-scene rasters found under <path_dir>/<row>/<scene>/
    Mosaic {
        path_dir: PathBuf,

        #[arg(long, default_value = "crop-corrected.tif")]
        tile_name: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        Box::new(DryRunner)
    } else {
        Box::new(ProcessRunner)
    };

    match args.command {
        Commands::Run { config } => {
            let config = Config::load(&config)
                .with_context(|| format!("Failed to load {}", config.display()))?;
            let explorer = EarthExplorer::with_base_url(
                &config.inventory_url,
                config.max_cloud_cover,
                Duration::from_secs(config.timeout_secs),
            )?;

            let summary = Pipeline::new(&config, &explorer, runner.as_ref()).run()?;
            println!(
                "{} processed, {} failed, {} queries failed",
                summary.scenes_processed, summary.scenes_failed, summary.queries_failed
            );
            for mosaic in &summary.mosaics {
                println!("mosaic: {}", mosaic.display());
            }
            for mosaic in &summary.mosaics_existing {
                println!("mosaic (kept): {}", mosaic.display());
            }
            if summary.scenes_failed > 0 || summary.queries_failed > 0 {
                log::warn!("Some scenes were not processed; re-run to resume");
            }
        }

        Commands::Search {
            year,
            path,
            row,
            bbox,
            max_cloud_cover,
            inventory_url,
        } => {
            let query = match (path, row, bbox) {
                (Some(path), Some(row), None) => SceneQuery::PathRow { path, row },
                (None, None, Some(bbox)) => SceneQuery::BoundingBox(bbox),
                _ => bail!("Give either --path and --row, or --bbox"),
            };

            let timeout = Duration::from_secs(60);
            let explorer = match inventory_url {
                Some(url) => EarthExplorer::with_base_url(&url, max_cloud_cover, timeout)?,
                None => EarthExplorer::new(max_cloud_cover, timeout)?,
            };

            let scene_ids = explorer
                .find_scenes(year, &query)
                .context("Inventory query failed")?;
            for id in scene_ids {
                println!("{}", id);
            }
        }

        Commands::Bands {
            satellite,
            sensor,
            mode,
        } => {
            let satellite = match sensor {
                Some(code) => Satellite::with_sensor(satellite, Sensor::from_code(code)?)?,
                None => Satellite::new(satellite)?,
            };
            let bands = satellite.bands(mode)?;
            println!("{}", bands.join(" "));
        }

        Commands::Info { scene_id } => {
            println!("scene:           {}", scene_id);
            println!("sensor:          {}", scene_id.sensor_code());
            println!("version:         {}", scene_id.version()?);
            println!("path:            {}", scene_id.path());
            println!("row:             {}", scene_id.row());
            println!("year:            {}", scene_id.year());
            println!("day:             {}", scene_id.day());
            if let Ok(date) = scene_id.acquisition_date() {
                println!("date:            {}", date);
            }
            println!("ground station:  {}", scene_id.ground_station_id());
            println!("archive version: {}", scene_id.archive_version());
        }

        Commands::Process {
            scene_id,
            output_dir,
            config,
        } => {
            let options = match config {
                Some(path) => Config::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?
                    .scene_options(),
                None => SceneOptions::default(),
            };

            let scene = Scene::new(scene_id, output_dir, options)?;
            let output = scene
                .process(runner.as_ref())
                .with_context(|| format!("Processing {} failed", scene.id()))?;
            println!("{}", output.display());
        }

        Commands::Mosaic {
            path_dir,
            tile_name,
        } => {
            let tiles = find_tiles(&path_dir, &tile_name)?;
            match merge_tiles(&path_dir, &tiles, runner.as_ref())? {
                MosaicOutcome::Written(output) => println!("{}", output.display()),
                MosaicOutcome::Existing(output) => println!("{} (already present)", output.display()),
                MosaicOutcome::TooFewTiles(count) => println!(
                    "{} '{}' tile(s) under {}, need at least two",
                    count,
                    tile_name,
                    path_dir.display()
                ),
            }
        }
    }

    Ok(())
}
