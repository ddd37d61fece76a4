//! Configuration schema structs

use std::path::PathBuf;
use std::time::Duration;

use bimbridge_protocol::DEFAULT_API_NAME;
use serde::{Deserialize, Serialize};

use crate::bridge::BridgeConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bridge: BridgeSettings,
    pub document: DocumentConfig,
    pub metrics: MetricsConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Routes are served under `/<api_name>/`
    pub api_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:48884".into(),
            api_name: DEFAULT_API_NAME.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// How long a caller waits for its job's result
    pub job_timeout_ms: u64,
}

impl BridgeSettings {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }

    pub fn to_bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            job_timeout: self.job_timeout(),
        }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            job_timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub title: String,
    /// JSON seed to load instead of the starter template
    pub seed_path: Option<PathBuf>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: "Untitled".into(),
            seed_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/metrics`
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
