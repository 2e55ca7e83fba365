//! Build pinner - keeps every artifact dependency of a release from being
//! garbage-collected, or releases the pins again in delete mode.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::closure::DependencyClosure;
use super::pool::WorkerPool;
use crate::domain::build::BuildHandle;
use crate::domain::tag::{PinRequest, TagMode};
use crate::error::MutationError;
use crate::infrastructure::teamcity::CiApi;

/// Outcome of one pin stage
#[derive(Debug, Default)]
pub struct PinReport {
    /// `pinInfo` hrefs that were updated
    pub updated: Vec<String>,
    pub failed: Vec<MutationError>,
}

pub struct BuildPinner {
    ci: Arc<dyn CiApi>,
    pool: WorkerPool,
}

impl BuildPinner {
    pub fn new(ci: Arc<dyn CiApi>, pool: WorkerPool) -> Self {
        Self { ci, pool }
    }

    /// Pin (create mode) or unpin (delete mode) every build in the closure
    pub async fn apply(&self, closure: &DependencyClosure, release: &str, mode: TagMode) -> PinReport {
        self.apply_at(closure, release, mode, Utc::now()).await
    }

    /// Same as [`apply`](Self::apply) with the batch timestamp given
    pub async fn apply_at(
        &self,
        closure: &DependencyClosure,
        release: &str,
        mode: TagMode,
        at: DateTime<Utc>,
    ) -> PinReport {
        let verb = if mode.pin_status() { "Pinning" } else { "Unpinning" };
        info!(
            builds = closure.len(),
            kind = %closure.kind,
            release = %release,
            "{} dependency builds",
            verb
        );

        let request = Arc::new(PinRequest::for_release(release, mode, at));
        let ci = Arc::clone(&self.ci);
        let handles: Vec<BuildHandle> = closure.handles().cloned().collect();

        let results = self
            .pool
            .run_all("pin", handles, move |handle| {
                let ci = Arc::clone(&ci);
                let request = Arc::clone(&request);
                async move {
                    let href = handle.pin_info_href();
                    ci.set_pin(&handle, &request)
                        .await
                        .map(|()| href)
                        .map_err(|source| MutationError::Pin {
                            build_href: handle.href.clone(),
                            source,
                        })
                }
            })
            .await;

        let mut report = PinReport::default();
        for result in results {
            match result {
                Ok(href) => report.updated.push(href),
                Err(e) => {
                    warn!(error = %e, "Pin update failed");
                    report.failed.push(e);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::build::{BuildIdentifier, DependencyKind};
    use crate::infrastructure::fakes::FakeCi;
    use crate::services::closure::DependencyClosureWalker;
    use chrono::TimeZone;

    async fn artifact_closure(ci: &Arc<FakeCi>) -> DependencyClosure {
        let ci: Arc<dyn CiApi> = Arc::clone(ci) as Arc<dyn CiApi>;
        DependencyClosureWalker::new(ci)
            .walk(&BuildIdentifier::new("bt", "1234"), DependencyKind::Artifact)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_pins_share_one_timestamp() {
        let ci = Arc::new(
            FakeCi::new()
                .with_artifact_build("/app/rest/builds/id:1")
                .with_artifact_build("/app/rest/builds/id:2")
                .with_artifact_build("/app/rest/builds/id:3"),
        );
        let closure = artifact_closure(&ci).await;
        let pinner = BuildPinner::new(ci.clone(), WorkerPool::new(4));
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 15, 45, 0).unwrap();

        let report = pinner.apply_at(&closure, "2.3.0", TagMode::Create, at).await;

        assert_eq!(report.updated.len(), 3);
        assert!(report.failed.is_empty());
        let pins = ci.pins();
        assert_eq!(pins.len(), 3);
        for request in pins.values() {
            assert!(request.status);
            assert_eq!(request.comment.text, "Release 2.3.0");
            assert_eq!(request.comment.timestamp, "20240131T154500+0000");
        }
    }

    #[tokio::test]
    async fn test_delete_mode_unpins() {
        let ci = Arc::new(FakeCi::new().with_artifact_build("/app/rest/builds/id:1"));
        let closure = artifact_closure(&ci).await;
        let pinner = BuildPinner::new(ci.clone(), WorkerPool::new(2));

        let report = pinner.apply(&closure, "2.3.0", TagMode::Delete).await;

        assert_eq!(report.updated, vec!["/app/rest/builds/id:1/pinInfo"]);
        assert!(!ci.pins()["/app/rest/builds/id:1/pinInfo"].status);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let ci = Arc::new(
            FakeCi::new()
                .with_artifact_build("/app/rest/builds/id:1")
                .with_artifact_build("/app/rest/builds/id:2")
                .failing("/app/rest/builds/id:1/pinInfo"),
        );
        let closure = artifact_closure(&ci).await;
        let pinner = BuildPinner::new(ci.clone(), WorkerPool::new(2));

        let report = pinner.apply(&closure, "2.3.0", TagMode::Create).await;

        assert_eq!(report.updated, vec!["/app/rest/builds/id:2/pinInfo"]);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0], MutationError::Pin { .. }));
    }
}
