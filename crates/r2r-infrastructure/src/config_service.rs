//! Configuration service.
//!
//! Loads `ClientConfig` from `config.toml` and applies overrides in order:
//! file < `R2R_API_BASE_URL` environment variable < command-line flag.

use std::path::{Path, PathBuf};

use r2r_core::config::ClientConfig;
use r2r_core::error::{R2rError, Result};

use crate::paths::R2rPaths;

/// Environment variable overriding `api.base_url`.
pub const BASE_URL_ENV: &str = "R2R_API_BASE_URL";

/// Loads the client configuration from a TOML file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default location (`<config_dir>/r2r/config.toml`).
    pub fn new() -> Result<Self> {
        let path = R2rPaths::config_file().map_err(|e| R2rError::config(e.to_string()))?;
        Ok(Self { path })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file. A missing file yields defaults; a malformed one is an error.
    pub fn load(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            R2rError::config(format!(
                "Failed to read configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            R2rError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Loads the file and applies environment and command-line overrides.
    pub fn resolve(&self, base_url_flag: Option<&str>) -> Result<ClientConfig> {
        let config = self.load()?;
        let config = apply_env_overrides(config, |key| std::env::var(key).ok());
        Ok(apply_flag_overrides(config, base_url_flag))
    }
}

/// Applies environment overrides read through `lookup`.
pub fn apply_env_overrides(
    mut config: ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
        config.api.base_url = base_url;
    }
    config
}

pub fn apply_flag_overrides(mut config: ClientConfig, base_url: Option<&str>) -> ClientConfig {
    if let Some(base_url) = base_url {
        config.api.base_url = base_url.to_string();
    }
    config
}
