//! Engine configuration files.

use std::io;
use std::path::{Path, PathBuf};

use confluence_core::config::{ConfigError, EngineConfig};
use thiserror::Error;
use tracing::debug;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Read, parse and validate a TOML configuration file.
///
/// Missing keys take their defaults, so a file may override a single threshold.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_toml_str(&text).map_err(|source| ConfigFileError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), fingerprint = %config.fingerprint(), "loaded config");
    Ok(config)
}

/// `load_config` when a path is given, the validated defaults otherwise.
pub fn load_config_or_default(path: Option<&Path>) -> Result<EngineConfig, ConfigFileError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(EngineConfig::default()),
    }
}
