#![allow(dead_code)]

use landsat::io::ExternalCommand;
use landsat::{CommandRunner, LandsatError, LandsatResult, SceneId, SceneQuery, SceneSource};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Every band name an archive of any generation may contain
pub const ARCHIVE_BANDS: &[&str] = &[
    "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B10", "B20", "B30", "B40", "B50", "B60", "B70",
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records commands and fakes the files each tool would have written
#[derive(Default)]
pub struct RecordingRunner {
    pub commands: RefCell<Vec<ExternalCommand>>,
    fail_when: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any command whose printed form contains `needle`
    pub fn failing_when(needle: &str) -> Self {
        Self {
            commands: RefCell::new(Vec::new()),
            fail_when: Some(needle.to_string()),
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.commands.borrow().iter().map(|c| c.program.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    fn touch(path: &Path) -> LandsatResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, b"fake raster")?;
        Ok(())
    }

    fn simulate(command: &ExternalCommand) -> LandsatResult<()> {
        match command.program.as_str() {
            "gsutil" => {
                let url = &command.args[1];
                let name = url.rsplit('/').next().unwrap_or(url);
                Self::touch(&Path::new(&command.args[2]).join(name))
            }
            "tar" => {
                let dir = command.current_dir.clone().unwrap_or_else(|| PathBuf::from("."));
                let archive = command.args.last().expect("tar without archive");
                let id = archive.trim_end_matches(".tar.bz");
                for band in ARCHIVE_BANDS {
                    Self::touch(&dir.join(format!("{}_{}.TIF", id, band)))?;
                }
                Ok(())
            }
            "gdal_merge.py" => {
                let pos = command
                    .args
                    .iter()
                    .position(|a| a == "-o")
                    .expect("gdal_merge.py without -o");
                Self::touch(Path::new(&command.args[pos + 1]))
            }
            _ => Self::touch(Path::new(command.args.last().expect("command without args"))),
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &ExternalCommand) -> LandsatResult<()> {
        self.commands.borrow_mut().push(command.clone());

        if let Some(needle) = &self.fail_when {
            if command.to_string().contains(needle.as_str()) {
                return Err(LandsatError::CommandFailed {
                    program: command.program.clone(),
                    status: "exit status: 1".to_string(),
                    stderr: "simulated failure".to_string(),
                });
            }
        }

        Self::simulate(command)
    }
}

/// Inventory stand-in answering from a closure
pub struct FnSource<F>(pub F);

impl<F> SceneSource for FnSource<F>
where
    F: Fn(i32, &SceneQuery) -> LandsatResult<Vec<SceneId>>,
{
    fn find_scenes(&self, year: i32, query: &SceneQuery) -> LandsatResult<Vec<SceneId>> {
        (self.0)(year, query)
    }
}

pub fn source<F>(f: F) -> FnSource<F>
where
    F: Fn(i32, &SceneQuery) -> LandsatResult<Vec<SceneId>>,
{
    FnSource(f)
}

pub fn ids(raw: &[&str]) -> Vec<SceneId> {
    raw.iter().map(|s| SceneId::new(*s).unwrap()).collect()
}
