//! Revision mapper - which commit of which repository a release is made of
//!
//! Two fan-out passes over the snapshot closure:
//! 1. build -> revisions (one per VCS root the build was started from)
//! 2. revision -> VCS root `url` -> Bitbucket tag endpoint
//!
//! Results of each pass are collected in closure order and merged only
//! after the pass has drained, so "last write wins" on a duplicate
//! endpoint means the record that comes last in closure order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::closure::DependencyClosure;
use super::pool::WorkerPool;
use crate::config::MappingConfig;
use crate::domain::build::BuildHandle;
use crate::domain::properties::PropertyBag;
use crate::domain::revision::{RevisionMap, RevisionRecord, TagTarget, VcsRootReference};
use crate::error::MappingError;
use crate::infrastructure::teamcity::{CiApi, Revision};

/// VCS root parameter holding the clone URL
const URL_PROPERTY: &str = "url";

/// Outcome of one mapping stage
#[derive(Debug, Default)]
pub struct MappingReport {
    pub map: RevisionMap,
    /// Root ids skipped because they are excluded from tagging
    pub excluded: Vec<String>,
    /// Records dropped because they could not be mapped
    pub dropped: Vec<MappingError>,
    /// Targets that replaced an earlier hash for the same endpoint,
    /// with the hash they replaced
    pub replaced: Vec<(TagTarget, String)>,
}

pub struct RevisionMapper {
    ci: Arc<dyn CiApi>,
    pool: WorkerPool,
    config: MappingConfig,
}

impl RevisionMapper {
    pub fn new(ci: Arc<dyn CiApi>, pool: WorkerPool, config: MappingConfig) -> Self {
        Self { ci, pool, config }
    }

    pub async fn map(&self, closure: &DependencyClosure) -> MappingReport {
        info!(builds = closure.len(), kind = %closure.kind, "Getting revision for each dependency build");
        let mut report = MappingReport::default();

        let revisions = self.fetch_revisions(closure, &mut report).await;

        let (excluded, included): (Vec<Revision>, Vec<Revision>) = revisions
            .into_iter()
            .partition(|r| self.config.is_excluded(&r.vcs_root_instance.vcs_root_id));
        for revision in excluded {
            debug!(root = %revision.vcs_root_instance.vcs_root_id, "Skipping excluded VCS root");
            report.excluded.push(revision.vcs_root_instance.vcs_root_id);
        }

        info!(revisions = included.len(), "Getting hash to tag as release for each VCS root");
        let targets = self.resolve_targets(included, &mut report).await;

        report.replaced = report.map.merge(targets);
        for (target, previous) in &report.replaced {
            warn!(
                endpoint = %target.endpoint,
                root = %target.root_id,
                previous = %previous,
                hash = %target.revision_hash,
                "Several revisions map to one repository, keeping the later one"
            );
        }

        for (endpoint, hash) in report.map.iter() {
            debug!(endpoint = %endpoint, hash = %hash, "Mapped repository");
        }
        report
    }

    async fn fetch_revisions(
        &self,
        closure: &DependencyClosure,
        report: &mut MappingReport,
    ) -> Vec<Revision> {
        let ci = Arc::clone(&self.ci);
        let handles: Vec<BuildHandle> = closure.handles().cloned().collect();

        let results = self
            .pool
            .run_all("revisions", handles, move |handle| {
                let ci = Arc::clone(&ci);
                async move {
                    ci.build_revisions(&handle)
                        .await
                        .map_err(|source| MappingError::RevisionLookup {
                            build_href: handle.href.clone(),
                            source,
                        })
                }
            })
            .await;

        let mut revisions = Vec::new();
        for result in results {
            match result {
                Ok(build_revisions) => revisions.extend(build_revisions),
                Err(e) => {
                    warn!(error = %e, "Dropping snapshot dependency");
                    report.dropped.push(e);
                }
            }
        }
        revisions
    }

    async fn resolve_targets(
        &self,
        revisions: Vec<Revision>,
        report: &mut MappingReport,
    ) -> Vec<TagTarget> {
        let ci = Arc::clone(&self.ci);

        let results = self
            .pool
            .run_all("vcs-roots", revisions, move |revision| {
                let ci = Arc::clone(&ci);
                async move { resolve_target(ci.as_ref(), revision).await }
            })
            .await;

        let mut targets = Vec::new();
        for result in results {
            match result {
                Ok(target) => targets.push(target),
                Err(e) => {
                    warn!(error = %e, "Dropping snapshot dependency");
                    report.dropped.push(e);
                }
            }
        }
        targets
    }
}

/// Follow the revision's root instance and derive its tag target
async fn resolve_target(ci: &dyn CiApi, revision: Revision) -> Result<TagTarget, MappingError> {
    let root_id = revision.vcs_root_instance.vcs_root_id.clone();

    let properties: PropertyBag = ci
        .vcs_root_properties(&revision.vcs_root_instance)
        .await
        .map_err(|source| MappingError::RootLookup {
            root_id: root_id.clone(),
            source,
        })?
        .into_iter()
        .collect();

    let url = properties
        .get(URL_PROPERTY)
        .ok_or_else(|| MappingError::MissingRootProperty {
            root_id: root_id.clone(),
            property: URL_PROPERTY.to_string(),
        })?;

    RevisionRecord {
        root: VcsRootReference::new(root_id, url),
        revision_hash: revision.version,
    }
    .tag_target()
}
