//! Dependency closure walker
//!
//! Queries the artifact- and snapshot-dependency closures of the release
//! build. Both are read-only lookups, and both must succeed before any
//! mutation starts.

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::domain::build::{BuildHandle, BuildIdentifier, DependencyEdge, DependencyKind};
use crate::error::ResolutionError;
use crate::infrastructure::teamcity::CiApi;

/// Builds related to the release build through one kind of dependency
#[derive(Debug, Clone)]
pub struct DependencyClosure {
    pub kind: DependencyKind,
    pub edges: Vec<DependencyEdge>,
}

impl DependencyClosure {
    pub fn handles(&self) -> impl Iterator<Item = &BuildHandle> {
        self.edges.iter().map(|edge| &edge.to_build)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Both closures of one release build
#[derive(Debug, Clone)]
pub struct BuildClosures {
    pub artifact: DependencyClosure,
    pub snapshot: DependencyClosure,
}

pub struct DependencyClosureWalker {
    ci: Arc<dyn CiApi>,
}

impl DependencyClosureWalker {
    pub fn new(ci: Arc<dyn CiApi>) -> Self {
        Self { ci }
    }

    pub async fn walk(
        &self,
        build: &BuildIdentifier,
        kind: DependencyKind,
    ) -> Result<DependencyClosure, ResolutionError> {
        let handles = self
            .ci
            .dependency_closure(build, kind)
            .await
            .map_err(|source| ResolutionError::Closure {
                kind: kind.name().to_string(),
                build: build.locator(),
                source,
            })?;

        debug!(build = %build, kind = %kind, builds = handles.len(), "Resolved dependency closure");

        let edges: Vec<DependencyEdge> = handles
            .into_iter()
            .map(|to_build| DependencyEdge {
                from_build: build.clone(),
                to_build,
                kind,
            })
            .collect();
        for edge in &edges {
            trace!(edge = %edge, "Dependency edge");
        }

        Ok(DependencyClosure { kind, edges })
    }

    /// Resolve both closures concurrently; either failing fails the walk
    pub async fn walk_all(&self, build: &BuildIdentifier) -> Result<BuildClosures, ResolutionError> {
        info!(build = %build, "Resolving artifact and snapshot dependency closures");

        let (artifact, snapshot) = tokio::try_join!(
            self.walk(build, DependencyKind::Artifact),
            self.walk(build, DependencyKind::Snapshot),
        )?;

        Ok(BuildClosures { artifact, snapshot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fakes::{revision, FakeCi};

    fn fixture() -> FakeCi {
        FakeCi::new()
            .with_artifact_build("/app/rest/builds/id:1")
            .with_artifact_build("/app/rest/builds/id:2")
            .with_snapshot_build("/app/rest/builds/id:1", vec![revision("acme_tools", "abc")])
    }

    #[tokio::test]
    async fn test_walk_all() {
        let walker = DependencyClosureWalker::new(Arc::new(fixture()));
        let build = BuildIdentifier::new("bt", "1234");

        let closures = walker.walk_all(&build).await.unwrap();

        assert_eq!(closures.artifact.kind, DependencyKind::Artifact);
        assert_eq!(
            closures.artifact.handles().map(|h| h.href.as_str()).collect::<Vec<_>>(),
            vec!["/app/rest/builds/id:1", "/app/rest/builds/id:2"]
        );
        assert_eq!(closures.snapshot.len(), 1);
        assert!(closures.snapshot.edges.iter().all(|e| e.from_build == build));
    }

    #[tokio::test]
    async fn test_empty_closure() {
        let walker = DependencyClosureWalker::new(Arc::new(FakeCi::new()));
        let closures = walker
            .walk_all(&BuildIdentifier::new("bt", "1234"))
            .await
            .unwrap();
        assert!(closures.artifact.is_empty());
        assert!(closures.snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_either_query_failing_is_fatal() {
        for key in ["closure:artifact", "closure:snapshot"] {
            let walker = DependencyClosureWalker::new(Arc::new(fixture().failing(key)));
            let err = walker
                .walk_all(&BuildIdentifier::new("bt", "1234"))
                .await
                .unwrap_err();
            assert!(matches!(err, ResolutionError::Closure { .. }), "{key}");
        }
    }
}
