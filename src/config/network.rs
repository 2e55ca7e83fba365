//! Network and concurrency settings shared by both REST clients.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Connect timeout for every request (humantime, e.g. "3s")
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,

    /// Worker pool size as a multiple of available parallelism
    #[serde(default = "default_pool_multiplier")]
    pub pool_multiplier: usize,
}

fn default_connect_timeout() -> String {
    "3s".to_string()
}

fn default_pool_multiplier() -> usize {
    5
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            pool_multiplier: default_pool_multiplier(),
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.connect_timeout).map_err(|_| {
            ConfigError::InvalidValue {
                field: "network.connect_timeout".to_string(),
                value: self.connect_timeout.clone(),
            }
        })
    }

    /// Number of concurrent workers for fan-out stages
    pub fn pool_size(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        available.saturating_mul(self.pool_multiplier).max(1)
    }
}
