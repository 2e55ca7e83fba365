//! Tag service - orchestrates a release tagging run
//!
//! Stages, each finished before the next starts:
//! 1. Resolve metadata and both dependency closures (fatal on failure)
//! 2. Tag the release build itself as `release`
//! 3. Pin or unpin the artifact closure
//! 4. Map the snapshot closure to repository endpoints
//! 5. Create or delete `rel/{release}` in every mapped repository
//!
//! Only stage 1 can fail the run. Everything after it is fail-soft: failed
//! tasks are logged and reported, nothing is rolled back, and a rerun with
//! the same arguments converges on the same end state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::closure::DependencyClosureWalker;
use super::metadata::{BuildMetadata, MetadataResolver};
use super::pinner::{BuildPinner, PinReport};
use super::pool::WorkerPool;
use super::revision_mapper::{MappingReport, RevisionMapper};
use crate::config::MappingConfig;
use crate::domain::build::BuildIdentifier;
use crate::domain::revision::{RevisionMap, TagEndpoint};
use crate::domain::tag::{
    release_tag_name, BuildTagsRequest, ReleaseTag, TagMode, TagResult, BUILD_RELEASE_TAG,
};
use crate::error::{MutationError, ResolutionError};
use crate::infrastructure::bitbucket::VcsApi;
use crate::infrastructure::teamcity::CiApi;

/// What to release and whether to add or remove it
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub build: BuildIdentifier,
    pub release: String,
    pub mode: TagMode,
}

impl ReleaseRequest {
    pub fn tag_name(&self) -> String {
        release_tag_name(&self.release)
    }
}

/// Outcome of the tag stage
#[derive(Debug, Default)]
pub struct TagReport {
    pub results: Vec<TagResult>,
    pub failed: Vec<MutationError>,
}

/// Everything a run did, for logging and the summary
#[derive(Debug)]
pub struct RunReport {
    pub metadata: BuildMetadata,
    pub build_tag_error: Option<MutationError>,
    pub pins: PinReport,
    pub mapping: MappingReport,
    pub tags: TagReport,
    pub duration: Duration,
}

impl RunReport {
    /// Number of per-task failures across all mutation and mapping stages
    pub fn failure_count(&self) -> usize {
        usize::from(self.build_tag_error.is_some())
            + self.pins.failed.len()
            + self.mapping.dropped.len()
            + self.tags.failed.len()
    }
}

/// Service for orchestrating release tagging
pub struct TagService {
    ci: Arc<dyn CiApi>,
    vcs: Arc<dyn VcsApi>,
    pool: WorkerPool,
    metadata: MetadataResolver,
    walker: DependencyClosureWalker,
    pinner: BuildPinner,
    mapper: RevisionMapper,
}

impl TagService {
    /// Create a new tag service; all stages share one pool of `pool_size` workers
    pub fn new(
        ci: Arc<dyn CiApi>,
        vcs: Arc<dyn VcsApi>,
        mapping: MappingConfig,
        pool_size: usize,
    ) -> Self {
        let pool = WorkerPool::new(pool_size);
        Self {
            metadata: MetadataResolver::new(Arc::clone(&ci)),
            walker: DependencyClosureWalker::new(Arc::clone(&ci)),
            pinner: BuildPinner::new(Arc::clone(&ci), pool.clone()),
            mapper: RevisionMapper::new(Arc::clone(&ci), pool.clone(), mapping),
            ci,
            vcs,
            pool,
        }
    }

    /// Execute a full tagging run
    pub async fn execute(&self, request: &ReleaseRequest) -> Result<RunReport, ResolutionError> {
        let start = Instant::now();
        info!(
            build = %request.build,
            release = %request.release,
            mode = request.mode.verb(),
            workers = self.pool.size(),
            "Starting release tagging run"
        );

        let metadata = self.metadata.resolve(&request.build).await?;
        info!(properties = metadata.properties.len(), "Resolved build metadata");
        if !metadata.dependency_build_types.is_empty() {
            info!(
                build_types = ?metadata.dependency_build_types,
                "Determined unique build types in build"
            );
        }
        let closures = self.walker.walk_all(&request.build).await?;

        let build_tag_error = self.tag_build(&request.build).await;
        let pins = self
            .pinner
            .apply(&closures.artifact, &request.release, request.mode)
            .await;
        let mapping = self.mapper.map(&closures.snapshot).await;
        let tags = self.apply_tags(&mapping.map, request).await;

        let report = RunReport {
            metadata,
            build_tag_error,
            pins,
            mapping,
            tags,
            duration: start.elapsed(),
        };

        if report.failure_count() > 0 {
            warn!(
                failures = report.failure_count(),
                "Release tagging finished with failures, rerun to retry"
            );
        } else {
            info!(
                repositories = report.mapping.map.len(),
                "Release tagging finished in {:.1}s",
                report.duration.as_secs_f64()
            );
        }
        Ok(report)
    }

    async fn tag_build(&self, build: &BuildIdentifier) -> Option<MutationError> {
        info!(build = %build, "Tagging build as {}", BUILD_RELEASE_TAG);
        match self
            .ci
            .tag_build(build, &BuildTagsRequest::single(BUILD_RELEASE_TAG))
            .await
        {
            Ok(()) => None,
            Err(source) => {
                let e = MutationError::BuildTag {
                    build: build.locator(),
                    source,
                };
                warn!(error = %e, "Build tag failed");
                Some(e)
            }
        }
    }

    async fn apply_tags(&self, map: &RevisionMap, request: &ReleaseRequest) -> TagReport {
        let tag_name = request.tag_name();
        info!(repositories = map.len(), "Tagging release as {}", tag_name);

        let items: Vec<(TagEndpoint, String)> = map
            .iter()
            .map(|(endpoint, hash)| (endpoint.clone(), hash.to_string()))
            .collect();
        let vcs = Arc::clone(&self.vcs);
        let release = request.release.clone();
        let mode = request.mode;

        let results = self
            .pool
            .run_all("tags", items, move |(endpoint, hash)| {
                let vcs = Arc::clone(&vcs);
                let release = release.clone();
                async move {
                    let tag = ReleaseTag::new(&release, hash);
                    let outcome = match mode {
                        TagMode::Create => vcs.create_tag(&endpoint, &tag).await,
                        TagMode::Delete => vcs.delete_tag(&endpoint, &tag.name).await,
                    };
                    match outcome {
                        Ok(outcome) => Ok(TagResult { endpoint, outcome }),
                        Err(source) => Err(MutationError::Tag {
                            action: mode.verb(),
                            tag: tag.name,
                            endpoint: endpoint.to_string(),
                            source,
                        }),
                    }
                }
            })
            .await;

        let mut report = TagReport::default();
        for result in results {
            match result {
                Ok(result) => {
                    info!(endpoint = %result.endpoint, "Tag {} {}", tag_name, result.outcome.name());
                    report.results.push(result);
                }
                Err(e) => {
                    warn!(error = %e, "Tag update failed");
                    report.failed.push(e);
                }
            }
        }
        report
    }
}
