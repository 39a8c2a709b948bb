// Configuration module entry point
// Loads layered configuration and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::str::FromStr;

use crate::logger::LogLevel;

// Re-export public types
pub use state::AppState;
pub use types::{Config, DownloadConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "DLSERVE_CONFIG";

/// Config file used when `DLSERVE_CONFIG` is not set (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from `$DLSERVE_CONFIG` or `config.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, later ones winning: built-in defaults, the file (optional),
    /// `DLSERVE_<SECTION>__<KEY>` environment variables.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("download.base_dir", "downloads")?
            .set_default("download.route_prefix", "/download")?
            .set_default("download.cache_control", "no-cache")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.connection_timeout", 0)?
            .set_default("performance.shutdown_timeout", 10)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("DLSERVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.download.base_dir.trim().is_empty() {
            return Err(invalid("`download.base_dir` cannot be empty"));
        }
        let prefix = &self.download.route_prefix;
        if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
            return Err(invalid(format!(
                "`download.route_prefix` must start with '/' and name a path, got '{prefix}'"
            )));
        }
        if LogLevel::from_str(&self.logging.level).is_err() {
            return Err(invalid(format!(
                "`logging.level` must be one of error, warn, info, debug, got '{}'",
                self.logging.level
            )));
        }
        if self.server.workers == Some(0) {
            return Err(invalid("`server.workers` must be greater than 0"));
        }
        self.get_socket_addr().map_err(invalid)?;
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Route prefix without its trailing slash, e.g. `/download`
    pub fn route_prefix(&self) -> &str {
        self.download.route_prefix.trim_end_matches('/')
    }
}

fn invalid(message: impl Into<String>) -> config::ConfigError {
    config::ConfigError::Message(message.into())
}
