// loganyapp - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading. A config file is a table of top-level build arguments:
//
//   name = "svc"
//   level = "info"
//   file = "/var/log/svc/"
//   screen = { pattern_style = "script_long", color = false }
//   [category_level]
//   "svc::db" = "trace"
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::args::BuildArgs;
use crate::core::model::ArgValue;
use crate::util::constants;
use crate::util::error::{ConfigError, Result};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved platform paths for loganyapp configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/loganyapp/ or %APPDATA%\loganyapp\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Location of the default config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

/// Parse config text into build arguments. `path` is only used in errors.
pub fn parse_args(text: &str, path: &Path) -> Result<BuildArgs> {
    let table: BTreeMap<String, ArgValue> =
        toml::from_str(text).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        })?;
    BuildArgs::from_table(table)
}

/// Load build arguments from a config file. A missing or malformed file is
/// an error; unknown keys are rejected like any other option.
pub fn load_args(path: &Path) -> Result<BuildArgs> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let args = parse_args(&text, path)?;
    tracing::info!(path = %path.display(), "Loaded config.toml");
    Ok(args)
}

/// Load the default config file if it exists, else default arguments.
pub fn load_default_args(paths: &PlatformPaths) -> Result<BuildArgs> {
    let path = paths.config_file();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
        return Ok(BuildArgs::default());
    }
    load_args(&path)
}
