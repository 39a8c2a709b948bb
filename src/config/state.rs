// Application state module
// Shared, read-only state handed to every connection

use std::path::PathBuf;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Base directory downloads are resolved against
    pub download_root: PathBuf,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let download_root = PathBuf::from(&config.download.base_dir);
        Self {
            config,
            download_root,
        }
    }

    /// Build state serving from an explicit directory, keeping the rest of `config`
    pub fn with_root(mut config: Config, root: impl Into<PathBuf>) -> Self {
        let download_root = root.into();
        config.download.base_dir = download_root.display().to_string();
        Self {
            config,
            download_root,
        }
    }
}
