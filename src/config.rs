//! Application configuration loaded from `dashboard.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Sheet loaded at startup. Relative paths resolve against the
    /// executable directory, then the working directory.
    pub data_file: Option<PathBuf>,
    pub export_file_name: String,
    pub report_file_name: String,
    pub open_after_export: bool,
    pub window: WindowConfig,
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: Some(PathBuf::from("data/Book Dashboard.xlsx")),
            export_file_name: "filtered_customer_data.csv".to_string(),
            report_file_name: "dashboard_report.svg".to_string(),
            open_after_export: false,
            window: WindowConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

/// Where the active configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
    /// A config file existed but could not be used.
    Fallback(ConfigError),
}

impl AppConfig {
    /// Resolve `data_file` against the search directories. Returns the first
    /// existing candidate.
    pub fn resolve_data_file(&self, dirs: &[PathBuf]) -> Option<PathBuf> {
        let path = self.data_file.as_ref()?;
        if path.is_absolute() {
            return path.exists().then(|| path.clone());
        }
        dirs.iter().map(|dir| dir.join(path)).find(|p| p.exists())
    }
}

/// Directories searched for the config and the startup sheet:
/// the executable directory, then the working directory.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.contains(&cwd) {
            dirs.push(cwd);
        }
    }
    dirs
}

/// Read and parse a single config file.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the first `dashboard.json` found in `dirs`, falling back to defaults.
///
/// Runs before logging is set up, so the caller reports the source.
pub fn load_config_from(dirs: &[PathBuf]) -> (AppConfig, ConfigSource) {
    let Some(path) = dirs
        .iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|p| p.exists())
    else {
        return (AppConfig::default(), ConfigSource::Default);
    };

    match read_config(&path) {
        Ok(config) => (config, ConfigSource::File(path)),
        Err(e) => (AppConfig::default(), ConfigSource::Fallback(e)),
    }
}

pub fn load_config() -> (AppConfig, ConfigSource) {
    load_config_from(&search_dirs())
}
