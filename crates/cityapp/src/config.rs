//! Driver configuration.
//!
//! Resolution order: built-in defaults under the CityApp home, then
//! `config.toml`, then environment variables (a `.env` file in the working
//! directory is loaded first).
//!
//! ```toml
//! data_from_browser_dir = "~/cityapp/data_from_browser"
//! geoserver_data_dir = "~/cityapp/geoserver_data"
//! grass_dir = "~/cityapp/grass"
//! output_dir = "~/cityapp/public/results"
//! grass_bin = "/usr/bin/grass"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use cityapp_modules::Paths;

pub use cityapp_logging::cityapp_home;

pub const ENV_DATA_FROM_BROWSER_DIR: &str = "DATA_FROM_BROWSER_DIR";
pub const ENV_GEOSERVER_DATA_DIR: &str = "GEOSERVER_DATA_DIR";
pub const ENV_GRASS_DIR: &str = "GRASS_DIR";
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIR";
pub const ENV_GRASS_BIN: &str = "GRASS_BIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CityAppConfig {
    /// Uploads and drawings from the browser
    #[serde(default = "default_data_from_browser_dir")]
    pub data_from_browser_dir: PathBuf,

    /// GeoServer data root
    #[serde(default = "default_geoserver_data_dir")]
    pub geoserver_data_dir: PathBuf,

    /// GIS database root (`global/`, `skel/`, `variables/`)
    #[serde(default = "default_grass_dir")]
    pub grass_dir: PathBuf,

    /// Finished reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Path to the `grass` launcher; looked up on PATH when unset
    #[serde(default)]
    pub grass_bin: Option<PathBuf>,
}

impl Default for CityAppConfig {
    fn default() -> Self {
        Self {
            data_from_browser_dir: default_data_from_browser_dir(),
            geoserver_data_dir: default_geoserver_data_dir(),
            grass_dir: default_grass_dir(),
            output_dir: default_output_dir(),
            grass_bin: None,
        }
    }
}

fn default_data_from_browser_dir() -> PathBuf {
    cityapp_home().join("data_from_browser")
}

fn default_geoserver_data_dir() -> PathBuf {
    cityapp_home().join("geoserver_data")
}

fn default_grass_dir() -> PathBuf {
    cityapp_home().join("grass")
}

fn default_output_dir() -> PathBuf {
    cityapp_home().join("results")
}

/// Get the default config file: `<home>/config.toml`
pub fn default_config_path() -> PathBuf {
    cityapp_home().join("config.toml")
}

/// Get the session store file: `<home>/sessions.json`
pub fn sessions_path() -> PathBuf {
    cityapp_home().join("sessions.json")
}

impl CityAppConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: CityAppConfig = toml::from_str(raw).context("Invalid configuration")?;
        config.expand_home();
        Ok(config)
    }

    /// Load `path`, or the default file when `path` is `None`.
    ///
    /// An explicitly named file must exist; a missing default file means
    /// defaults.
    pub fn load_file(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("In config file: {}", path.display()))
    }

    /// Full resolution for the driver: `.env`, file, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::load_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `lookup`; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        if let Some(dir) = get(ENV_DATA_FROM_BROWSER_DIR) {
            self.data_from_browser_dir = dir;
        }
        if let Some(dir) = get(ENV_GEOSERVER_DATA_DIR) {
            self.geoserver_data_dir = dir;
        }
        if let Some(dir) = get(ENV_GRASS_DIR) {
            self.grass_dir = dir;
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            self.output_dir = dir;
        }
        if let Some(bin) = get(ENV_GRASS_BIN) {
            self.grass_bin = Some(bin);
        }
        self.expand_home();
    }

    /// Folder holding the mapsets.
    pub fn gisdbase(&self) -> PathBuf {
        self.grass_dir.join("global")
    }

    pub fn to_paths(&self) -> Paths {
        Paths {
            data_from_browser_dir: self.data_from_browser_dir.clone(),
            geoserver_data_dir: self.geoserver_data_dir.clone(),
            grass_dir: self.grass_dir.clone(),
            output_dir: self.output_dir.clone(),
        }
    }

    fn expand_home(&mut self) {
        for path in [
            &mut self.data_from_browser_dir,
            &mut self.geoserver_data_dir,
            &mut self.grass_dir,
            &mut self.output_dir,
        ] {
            *path = expand_tilde(path);
        }
        if let Some(bin) = self.grass_bin.as_mut() {
            *bin = expand_tilde(bin);
        }
    }
}

/// Replace a leading `~` with the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
