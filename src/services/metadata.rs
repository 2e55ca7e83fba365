//! Metadata resolver - resulting properties of the release build

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::build::BuildIdentifier;
use crate::domain::properties::PropertyBag;
use crate::error::ResolutionError;
use crate::infrastructure::teamcity::CiApi;

/// Properties of the release build and the build types it depends on
#[derive(Debug, Clone, Default)]
pub struct BuildMetadata {
    pub properties: PropertyBag,
    pub dependency_build_types: BTreeSet<String>,
}

pub struct MetadataResolver {
    ci: Arc<dyn CiApi>,
}

impl MetadataResolver {
    pub fn new(ci: Arc<dyn CiApi>) -> Self {
        Self { ci }
    }

    /// Fetch and flatten the build's resulting properties.
    ///
    /// A build without properties yields an empty bag; a failed query is fatal.
    pub async fn resolve(&self, build: &BuildIdentifier) -> Result<BuildMetadata, ResolutionError> {
        info!(build = %build, "Getting build metadata");

        let properties: PropertyBag = self
            .ci
            .resulting_properties(build)
            .await
            .map_err(|source| ResolutionError::Metadata {
                build: build.locator(),
                source,
            })?
            .into_iter()
            .collect();

        let dependency_build_types = properties.dependency_build_types();
        debug!(
            build = %build,
            properties = properties.len(),
            build_types = ?dependency_build_types,
            "Resolved build metadata"
        );

        Ok(BuildMetadata {
            properties,
            dependency_build_types,
        })
    }
}
