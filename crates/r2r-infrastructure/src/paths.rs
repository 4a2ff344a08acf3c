//! Path management for r2r configuration and logs.
//!
//! ```text
//! <config_dir>/r2r/          # e.g. ~/.config/r2r on Linux
//! ├── config.toml            # Client configuration
//! └── logs/                  # Rolling log files
//!     └── r2r.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "r2r";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct R2rPaths;

impl R2rPaths {
    /// Returns the r2r configuration directory (e.g. `~/.config/r2r/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the directory for rolling log files.
    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_nested_under_config_dir() {
        // Some CI sandboxes have no config dir; nothing to check there.
        let Ok(dir) = R2rPaths::config_dir() else {
            return;
        };
        assert!(dir.ends_with("r2r"));
        assert_eq!(R2rPaths::config_file().unwrap(), dir.join("config.toml"));
        assert_eq!(R2rPaths::log_dir().unwrap(), dir.join("logs"));
    }
}
