//! # Tagging Configuration
//!
//! Optional YAML file plus command-line overrides.
//!
//! ## Configuration File
//!
//! Passed with `--config` (or `RELTAG_CONFIG`). Every section and field is
//! optional; missing values fall back to the defaults below.
//!
//! ```yaml
//! ci:
//!   base_url: https://teamcity.example.com
//!   build_type: flight_sw__m000_eec_control_sw_controlwin
//! vcs:
//!   base_url: https://api.bitbucket.org
//! mapping:
//!   excluded_roots: [legacy_root]   # avionics_firmware is always excluded
//! network:
//!   connect_timeout: 3s
//!   pool_multiplier: 5
//! ```
//!
//! Precedence: command line > config file > built-in defaults.

mod ci;
mod network;
mod vcs;

pub use ci::CiConfig;
pub use network::NetworkConfig;
pub use vcs::{MappingConfig, VcsConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Complete configuration for one tagging run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaggerConfig {
    #[serde(default)]
    pub ci: CiConfig,

    #[serde(default)]
    pub vcs: VcsConfig,

    #[serde(default)]
    pub mapping: MappingConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ci_base_url: Option<String>,
    pub vcs_base_url: Option<String>,
    pub build_type: Option<String>,
}

impl TaggerConfig {
    /// Load from `path` if given, otherwise start from defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("{}: {}", path.display(), e),
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::ParseError { message } => ConfigError::ParseError {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes to null, treat it as all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.ci_base_url {
            self.ci.base_url = Some(url);
        }
        if let Some(url) = overrides.vcs_base_url {
            self.vcs.base_url = url;
        }
        if let Some(build_type) = overrides.build_type {
            self.ci.build_type = build_type;
        }
        self
    }

    /// TeamCity base URL, required for every run
    pub fn ci_base_url(&self) -> Result<&str, ConfigError> {
        self.ci
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "ci.base_url (--tc-url / TEAMCITY_URL)".to_string(),
            })
    }

    /// Validate the configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.ci_base_url() {
            errors.push(e);
        }
        if self.ci.build_type.trim().is_empty() {
            errors.push(ConfigError::MissingField {
                field: "ci.build_type".to_string(),
            });
        }
        if self.vcs.base_url.trim().is_empty() {
            errors.push(ConfigError::MissingField {
                field: "vcs.base_url".to_string(),
            });
        }
        if let Err(e) = self.network.connect_timeout() {
            errors.push(e);
        }
        if self.network.pool_multiplier == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "network.pool_multiplier".to_string(),
                value: "0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
