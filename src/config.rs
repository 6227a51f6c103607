//! Optional JSON configuration.
//!
//! Looked up from an explicit path, or from `.cifkit.json` in the current
//! directory. With neither present every setting takes its default.
//!
//! ```json
//! {
//!   "strict": false,
//!   "validation": { "ratio_tolerance": 0.002, "volume_tolerance": 0.01 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cif::{ParseOptions, ValidationOptions};

/// File name searched for in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".cifkit.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fail on recoverable syntax problems instead of skipping them.
    pub strict: bool,
    pub validation: ValidationOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: true,
            validation: ValidationOptions::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Config {
    /// Load and parse a specific config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Use `explicit` if given, else `.cifkit.json` when it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::discover_in(explicit, Path::new("."))
    }

    fn discover_in(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let implicit = dir.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            Self::load(implicit)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict: self.strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::discover_in(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.parse_options().strict);
    }

    #[test]
    fn implicit_file_is_picked_up() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), r#"{"strict": false}"#).unwrap();
        let config = Config::discover_in(None, dir.path()).unwrap();
        assert!(!config.strict);
        assert_eq!(config.validation, ValidationOptions::default());
    }

    #[test]
    fn partial_validation_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"validation": {"ratio_tolerance": 0.002}}"#).unwrap();
        let config = Config::discover_in(Some(&path), dir.path()).unwrap();
        assert!(config.strict);
        assert_eq!(config.validation.ratio_tolerance, Some(0.002));
        assert_eq!(config.validation.volume_tolerance, 0.005);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::discover_in(Some(&dir.path().join("nope.json")), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "{ strict: no }").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().starts_with("invalid config"));
    }
}
