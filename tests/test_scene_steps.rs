use landsat::core::scene::{ChannelLevels, ColorCorrection, CorrectionMethod, Cutline, MergeTool};
use landsat::{LandsatError, Scene, SceneId, SceneOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

mod common;
use common::RecordingRunner;

const TM5_SCENE: &str = "LT50390351985250XXX04";
const OLI_SCENE: &str = "LC80390352015180LGN00";

fn scene_in(dir: &Path, id: &str, options: SceneOptions) -> Scene {
    Scene::new(SceneId::new(id).unwrap(), dir.join(id), options).expect("valid scene")
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"x").unwrap();
}

#[test]
fn test_download_creates_dir_and_copies_archive() {
    common::init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let scene = scene_in(temp_dir.path(), TM5_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();

    scene.download(&runner).unwrap();

    assert!(scene.output_dir().is_dir());
    let commands = runner.commands.borrow();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].program, "gsutil");
    assert_eq!(
        commands[0].args[1],
        "gs://earthengine-public/landsat/L5/039/035/LT50390351985250XXX04.tar.bz"
    );
    assert_eq!(Path::new(&commands[0].args[2]), scene.output_dir());
    drop(commands);

    // archive now on disk
    scene.download(&runner).unwrap();
    assert_eq!(runner.count(), 1);
}

#[test]
fn test_oli_only_scene_uses_landsat8_layout() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), "LO80390352015180LGN00", SceneOptions::default());
    let runner = RecordingRunner::new();

    assert_eq!(scene.bands(), &["B4", "B3", "B2"]);
    scene.download(&runner).unwrap();
    assert_eq!(
        runner.commands.borrow()[0].args[1],
        "gs://earthengine-public/landsat/L8/039/035/LO80390352015180LGN00.tar.bz"
    );
}

#[test]
fn test_unzip_requires_archive() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), TM5_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();

    match scene.unzip(&runner) {
        Err(LandsatError::MissingInput(path)) => assert_eq!(path, scene.archive_path()),
        other => panic!("expected MissingInput, got {:?}", other),
    }
    assert_eq!(runner.count(), 0);
}

#[test]
fn test_unzip_renames_members_to_scene_id() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), TM5_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();
    touch(&scene.archive_path());

    scene.unzip(&runner).unwrap();

    let commands = runner.commands.borrow();
    assert_eq!(commands[0].program, "tar");
    assert_eq!(
        commands[0].args,
        vec![
            "--transform",
            "s/^.*_/LT50390351985250XXX04_/g",
            "-xzvf",
            "LT50390351985250XXX04.tar.bz",
        ]
    );
    assert_eq!(commands[0].current_dir.as_deref(), Some(scene.output_dir()));
    assert!(scene.band_files_exist());
}

#[test]
fn test_project_tm_bands_without_rescaling() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), TM5_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();
    for band in scene.bands() {
        touch(&scene.band_path(band));
    }

    scene.project_bands(&runner).unwrap();

    assert_eq!(runner.programs(), vec!["gdalwarp"; 3]);
    let commands = runner.commands.borrow();
    assert_eq!(&commands[0].args[..2], &["-t_srs".to_string(), "EPSG:3857".to_string()]);
    assert!(commands[0].args[2].ends_with("LT50390351985250XXX04_B30.TIF"));
    assert!(commands[0].args[3].ends_with("LT50390351985250XXX04_B30-projected.tif"));
    assert!(scene.projected_files_exist());
}

#[test]
fn test_project_landsat8_rescales_to_8bit_first() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), OLI_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();
    for band in scene.bands() {
        touch(&scene.band_path(band));
    }

    scene.project_bands(&runner).unwrap();

    assert_eq!(
        runner.programs(),
        vec!["gdal_translate", "gdalwarp", "gdal_translate", "gdalwarp", "gdal_translate", "gdalwarp"]
    );
    let commands = runner.commands.borrow();
    assert!(commands[0].args.windows(6).any(|w| w == ["-scale", "0", "65535", "0", "255", "-ot"]));
    assert_eq!(Path::new(&commands[0].args[11]), scene.band_path("B4"));
    assert_eq!(Path::new(&commands[1].args[2]), scene.rescaled_path("B4"));
    assert!(scene.rescaled_path("B4").exists());
    assert!(!scene.output_dir().join("LC80390352015180LGN00_B4_tmp.TIF").exists());
}

#[test]
fn test_landsat8_rescale_survives_failed_warp() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), OLI_SCENE, SceneOptions::default());
    for band in scene.bands() {
        touch(&scene.band_path(band));
    }

    let failing = RecordingRunner::failing_when("gdalwarp");
    assert!(scene.project_bands(&failing).is_err());
    assert_eq!(failing.programs(), vec!["gdal_translate", "gdalwarp"]);

    let runner = RecordingRunner::new();
    scene.project_bands(&runner).unwrap();

    let b4_rescales = runner
        .commands
        .borrow()
        .iter()
        .filter(|c| c.program == "gdal_translate" && c.to_string().contains("_B4"))
        .count();
    assert_eq!(b4_rescales, 0);
    assert_eq!(
        runner.programs(),
        vec!["gdalwarp", "gdal_translate", "gdalwarp", "gdal_translate", "gdalwarp"]
    );
    assert!(scene.projected_files_exist());
}

#[test]
fn test_project_resumes_partial_run() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), OLI_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();
    for band in scene.bands() {
        touch(&scene.band_path(band));
    }
    touch(&scene.projected_path("B4"));

    scene.project_bands(&runner).unwrap();

    // B4 is neither rescaled nor warped again
    assert_eq!(runner.count(), 4);
    assert!(runner
        .commands
        .borrow()
        .iter()
        .all(|c| !c.to_string().contains("_B4.TIF")));
}

#[test]
fn test_project_requires_band_files() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), TM5_SCENE, SceneOptions::default());
    touch(&scene.band_path("B30"));

    let err = scene.project_bands(&RecordingRunner::new()).unwrap_err();
    assert!(matches!(err, LandsatError::MissingInput(p) if p == scene.band_path("B20")));
}

#[test]
fn test_merge_with_gdal_merge() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), OLI_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();
    for band in scene.bands() {
        touch(&scene.projected_path(band));
    }

    scene.merge_bands(&runner).unwrap();

    let commands = runner.commands.borrow();
    assert_eq!(commands[0].program, "gdal_merge.py");
    assert_eq!(commands[0].args[0], "-separate");
    assert_eq!(commands[0].args[1], "-o");
    assert!(commands[0].args[2].ends_with("LC80390352015180LGN00_RGB-projected.tif"));
    assert!(commands[0].args[3].ends_with("_B4-projected.tif"));
    assert!(commands[0].args[4].ends_with("_B3-projected.tif"));
    assert!(commands[0].args[5].ends_with("_B2-projected.tif"));
    assert!(scene.merged_file_exists());
}

#[test]
fn test_merge_with_rio_stack() {
    let temp_dir = TempDir::new().unwrap();
    let options = SceneOptions {
        merge_tool: MergeTool::RioStack,
        ..SceneOptions::default()
    };
    let scene = scene_in(temp_dir.path(), OLI_SCENE, options);
    let runner = RecordingRunner::new();
    for band in scene.bands() {
        touch(&scene.projected_path(band));
    }

    scene.merge_bands(&runner).unwrap();

    let commands = runner.commands.borrow();
    assert_eq!(commands[0].program, "rio");
    assert_eq!(&commands[0].args[..2], &["stack".to_string(), "--rgb".to_string()]);
    assert!(commands[0].args.last().unwrap().ends_with("_RGB-projected.tif"));
}

#[test]
fn test_crop_without_cutline_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), OLI_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();

    scene.crop(&runner).unwrap();
    assert_eq!(runner.count(), 0);
}

#[test]
fn test_crop_to_inline_polygon() {
    let temp_dir = TempDir::new().unwrap();
    let options = SceneOptions {
        cutline: Some(Cutline::Polygon(vec![[3.0, 6.4], [3.7, 6.4], [3.7, 6.7], [3.0, 6.7]])),
        ..SceneOptions::default()
    };
    let scene = scene_in(temp_dir.path(), OLI_SCENE, options);
    let runner = RecordingRunner::new();
    touch(&scene.merged_path());

    scene.crop(&runner).unwrap();

    let cutline = scene.output_dir().join("cutline.geojson");
    assert!(cutline.exists());
    let commands = runner.commands.borrow();
    assert_eq!(commands[0].program, "gdalwarp");
    assert_eq!(commands[0].args[0], "-cutline");
    assert_eq!(Path::new(&commands[0].args[1]), cutline);
    assert_eq!(commands[0].args[2], "-crop_to_cutline");
    assert!(scene.cropped_file_exists());
}

#[test]
fn test_color_correct_levels() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), TM5_SCENE, SceneOptions::default());
    let runner = RecordingRunner::new();
    touch(&scene.merged_path());

    scene.color_correct(&runner).unwrap();

    let commands = runner.commands.borrow();
    assert_eq!(commands[0].program, "convert");
    assert_eq!(
        &commands[0].args[..12],
        &[
            "-channel", "R", "-level", "8%,46%", "-channel", "G", "-level", "11%,37%", "-channel",
            "B", "-level", "28%,61%",
        ]
    );
    assert!(commands[0].args[13].ends_with("LT50390351985250XXX04_RGB-projected-corrected.tif"));
    assert!(scene.color_corrected_file_exists());
}

#[test]
fn test_color_correct_equalize_and_skip() {
    let temp_dir = TempDir::new().unwrap();
    let equalize = SceneOptions {
        color_correction: ColorCorrection::Method(CorrectionMethod::Equalize),
        ..SceneOptions::default()
    };
    let scene = scene_in(temp_dir.path(), TM5_SCENE, equalize);
    let runner = RecordingRunner::new();
    touch(&scene.merged_path());

    scene.color_correct(&runner).unwrap();
    assert_eq!(runner.commands.borrow()[0].args[1], "-equalize");

    let skip = SceneOptions {
        color_correction: ColorCorrection::Method(CorrectionMethod::Skip),
        ..SceneOptions::default()
    };
    let scene = scene_in(temp_dir.path(), TM5_SCENE, skip);
    let runner = RecordingRunner::new();
    scene.color_correct(&runner).unwrap();
    assert_eq!(runner.count(), 0);
}

#[test]
fn test_custom_levels_format() {
    let temp_dir = TempDir::new().unwrap();
    let options = SceneOptions {
        color_correction: ColorCorrection::Levels {
            levels: ChannelLevels {
                red: [2.5, 40.0],
                green: [10.0, 35.0],
                blue: [20.0, 55.0],
            },
        },
        ..SceneOptions::default()
    };
    let scene = scene_in(temp_dir.path(), TM5_SCENE, options);
    let runner = RecordingRunner::new();
    touch(&scene.merged_path());

    scene.color_correct(&runner).unwrap();
    assert_eq!(runner.commands.borrow()[0].args[3], "2.5%,40%");
}

#[test]
fn test_full_process_is_idempotent() {
    common::init_logging();
    let temp_dir = TempDir::new().unwrap();
    let options = SceneOptions {
        cutline: Some(Cutline::File(temp_dir.path().join("aoi.shp"))),
        ..SceneOptions::default()
    };
    let scene = scene_in(temp_dir.path(), OLI_SCENE, options);
    let runner = RecordingRunner::new();

    let output = scene.process(&runner).expect("pipeline should succeed");
    assert_eq!(output, scene.output_dir().join("crop-corrected.tif"));
    assert!(output.exists());
    assert_eq!(
        runner.programs(),
        vec![
            "gsutil",
            "tar",
            "gdal_translate",
            "gdalwarp",
            "gdal_translate",
            "gdalwarp",
            "gdal_translate",
            "gdalwarp",
            "gdal_merge.py",
            "gdalwarp",
            "convert",
        ]
    );

    runner.clear();
    let again = scene.process(&runner).unwrap();
    assert_eq!(again, output);
    assert_eq!(runner.count(), 0, "second run should skip every step");
}

#[test]
fn test_process_stops_at_failed_command() {
    let temp_dir = TempDir::new().unwrap();
    let scene = scene_in(temp_dir.path(), TM5_SCENE, SceneOptions::default());
    let runner = RecordingRunner::failing_when("gdalwarp");

    let err = scene.process(&runner).unwrap_err();
    assert!(matches!(err, LandsatError::CommandFailed { ref program, .. } if program == "gdalwarp"));
    assert_eq!(runner.programs(), vec!["gsutil", "tar", "gdalwarp"]);
    assert!(!scene.merged_file_exists());
}
