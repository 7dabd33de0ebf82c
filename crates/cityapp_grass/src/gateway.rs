//! Geoprocessing Gateway
//!
//! Runs `grass <gisdbase>/<mapset> --exec <tool> <args...>` and hands back
//! stdout. The gateway keeps no state between calls; all state lives in the
//! mapset directories the engine mutates.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

use crate::command::GrassCommand;
use crate::error::{GrassError, Result, ToolInvocationError};

/// The seam between the wizard and the external engine.
pub trait Engine: Send + Sync {
    /// Run one tool inside `mapset` and return its stdout.
    fn run(&self, mapset: &str, command: &GrassCommand) -> Result<String>;

    /// Create a new location whose `PERMANENT` mapset takes its projection
    /// from a georeferenced file.
    fn create_location(&self, mapset: &str, georef: &Path) -> Result<()>;
}

/// Process-backed engine driving the `grass` executable.
#[derive(Debug, Clone)]
pub struct GrassCli {
    program: PathBuf,
    gisdbase: PathBuf,
}

impl GrassCli {
    /// `gisdbase` is the folder holding the mapsets (`<grass_dir>/global`).
    pub fn new(program: impl Into<PathBuf>, gisdbase: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            gisdbase: gisdbase.into(),
        }
    }

    /// Locate `grass` on PATH or in the usual install locations.
    pub fn discover(gisdbase: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(find_grass()?, gisdbase))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn mapset_path(&self, mapset: &str) -> PathBuf {
        self.gisdbase.join(mapset)
    }

    fn spawn(&self, command: &mut Command) -> Result<Output> {
        command.output().map_err(|source| GrassError::Spawn {
            program: self.program.display().to_string(),
            source,
        })
    }
}

impl Engine for GrassCli {
    fn run(&self, mapset: &str, command: &GrassCommand) -> Result<String> {
        info!(mapset, "grass --exec {}", command);

        let output = self.spawn(
            Command::new(&self.program)
                .arg(self.mapset_path(mapset))
                .arg("--exec")
                .args(command.to_args()),
        )?;

        check_status(command.tool(), mapset, &output)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(tool = command.tool(), bytes = stdout.len(), "engine output captured");
        Ok(stdout)
    }

    fn create_location(&self, mapset: &str, georef: &Path) -> Result<()> {
        let location = self.mapset_path(mapset);
        info!(
            "grass -c {} {} -e",
            georef.display(),
            location.display()
        );

        let output = self.spawn(
            Command::new(&self.program)
                .arg("-c")
                .arg(georef)
                .arg(&location)
                .arg("-e"),
        )?;

        check_status("grass -c", mapset, &output)
    }
}

/// Map a nonzero exit into [`ToolInvocationError`]. GRASS prints its banner
/// and errors on stderr, but some tools report on stdout, so both are kept.
fn check_status(tool: &str, mapset: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let mut diagnostic = String::from_utf8_lossy(&output.stderr).into_owned();
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        if !diagnostic.is_empty() && !diagnostic.ends_with('\n') {
            diagnostic.push('\n');
        }
        diagnostic.push_str(&stdout);
    }

    Err(ToolInvocationError {
        tool: tool.to_string(),
        mapset: mapset.to_string(),
        exit_code: output.status.code(),
        stderr: diagnostic,
    }
    .into())
}

fn find_grass() -> Result<PathBuf> {
    if let Ok(path) = which::which("grass") {
        return Ok(path);
    }

    let candidates = [
        "/usr/bin/grass",
        "/usr/local/bin/grass",
        "/opt/homebrew/bin/grass",
        "/Applications/GRASS-8.3.app/Contents/Resources/bin/grass",
    ];

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .ok_or_else(|| {
            GrassError::EngineNotFound(
                "install GRASS GIS or set GRASS_BIN to the grass executable".to_string(),
            )
        })
}
