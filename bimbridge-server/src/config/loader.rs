//! Configuration loader

use std::net::SocketAddr;
use std::path::Path;

use bimbridge_utils::{config_file, BridgeError, Result};
use tracing::debug;

use super::AppConfig;

const MIN_JOB_TIMEOUT_MS: u64 = 100;
const MAX_JOB_TIMEOUT_MS: u64 = 600_000;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| BridgeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| BridgeError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        let timeout = config.bridge.job_timeout_ms;
        if !(MIN_JOB_TIMEOUT_MS..=MAX_JOB_TIMEOUT_MS).contains(&timeout) {
            return Err(BridgeError::config(format!(
                "job_timeout_ms must be between {} and {}",
                MIN_JOB_TIMEOUT_MS, MAX_JOB_TIMEOUT_MS
            )));
        }

        let api_name = &config.server.api_name;
        if api_name.is_empty() || api_name.contains('/') {
            return Err(BridgeError::config(
                "api_name must be non-empty and must not contain '/'",
            ));
        }

        if config.server.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(BridgeError::config(format!(
                "listen_addr '{}' is not a socket address",
                config.server.listen_addr
            )));
        }

        Ok(())
    }

    /// Load from `path` (or the default location), apply `overrides`, then
    /// validate the result
    pub fn load_and_validate(
        path: Option<&Path>,
        overrides: impl FnOnce(&mut AppConfig),
    ) -> Result<AppConfig> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load()?,
        };
        overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }
}
