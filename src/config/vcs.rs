//! Bitbucket and revision mapping configuration.

use serde::{Deserialize, Serialize};

/// Bitbucket REST API location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsConfig {
    #[serde(default = "default_vcs_base_url")]
    pub base_url: String,
}

fn default_vcs_base_url() -> String {
    "https://api.bitbucket.org".to_string()
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            base_url: default_vcs_base_url(),
        }
    }
}

/// VCS root that is never tagged, whatever the configuration says
pub const ALWAYS_EXCLUDED_ROOT: &str = "avionics_firmware";

/// Which VCS roots take part in release tagging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Extra VCS root ids never tagged, on top of [`ALWAYS_EXCLUDED_ROOT`]
    #[serde(default)]
    pub excluded_roots: Vec<String>,
}

impl MappingConfig {
    pub fn is_excluded(&self, root_id: &str) -> bool {
        root_id == ALWAYS_EXCLUDED_ROOT || self.excluded_roots.iter().any(|r| r == root_id)
    }
}
