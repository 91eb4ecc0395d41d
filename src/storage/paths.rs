//! Application paths for config and local credentials.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// File name of the local credential file in the home directory.
pub const LOCAL_CREDENTIALS_FILE: &str = ".rsm_credentials";

/// Application paths.
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
}

impl AppPaths {
    /// Create paths for the rsm-monitor application.
    #[must_use]
    pub fn new() -> Self {
        ProjectDirs::from("com", "rsm", "rsm-monitor").map_or_else(
            || Self {
                config: home_dir().join(".config/rsm-monitor"),
            },
            |proj_dirs| Self {
                config: proj_dirs.config_dir().to_path_buf(),
            },
        )
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the local JSON credential file (`~/.rsm_credentials`).
    #[must_use]
    pub fn local_credentials_file() -> PathBuf {
        home_dir().join(LOCAL_CREDENTIALS_FILE)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn home_dir() -> PathBuf {
    BaseDirs::new().map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf())
}
