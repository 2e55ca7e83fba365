//! TeamCity configuration.

use serde::{Deserialize, Serialize};

/// TeamCity server and the build configuration releases are cut from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiConfig {
    /// Server base URL (e.g., "https://teamcity.example.com")
    #[serde(default)]
    pub base_url: Option<String>,

    /// Build configuration id of the release bundle
    #[serde(default = "default_build_type")]
    pub build_type: String,
}

fn default_build_type() -> String {
    "flight_sw__m000_eec_control_sw_controlwin".to_string()
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            build_type: default_build_type(),
        }
    }
}
