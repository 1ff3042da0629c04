use crate::types::{LandsatError, LandsatResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// An external program invocation (gsutil, tar, gdalwarp, convert, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        let arg = path.as_ref().to_string_lossy().into_owned();
        self.arg(arg)
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl std::fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(dir) = &self.current_dir {
            write!(f, "cd {} && ", dir.display())?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Executes external commands on behalf of the pipeline
pub trait CommandRunner {
    fn run(&self, command: &ExternalCommand) -> LandsatResult<()>;
}

/// Runs commands as child processes and waits for them to exit
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ExternalCommand) -> LandsatResult<()> {
        log::info!("{}", command);

        let mut process = Command::new(&command.program);
        process.args(&command.args);
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        let output = process.output().map_err(|e| LandsatError::CommandFailed {
            program: command.program.clone(),
            status: "spawn failure".to_string(),
            stderr: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::debug!("{} stdout: {}", command.program, stdout.trim());
        }

        if !output.status.success() {
            return Err(LandsatError::CommandFailed {
                program: command.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Logs commands without running them
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunner;

impl CommandRunner for DryRunner {
    fn run(&self, command: &ExternalCommand) -> LandsatResult<()> {
        log::info!("[dry run] {}", command);
        Ok(())
    }
}
