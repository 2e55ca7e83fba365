//! In-memory fakes for the REST traits (testing only)
//!
//! `FakeCi` serves a fixed build graph and records mutations.
//! `FakeVcs` keeps tag state per repository so repeated runs can be
//! checked against the final state, the same way Bitbucket would end up.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::bitbucket::VcsApi;
use super::teamcity::{CiApi, Revision, VcsRootInstance};
use crate::domain::build::{BuildHandle, BuildIdentifier, DependencyKind};
use crate::domain::properties::Property;
use crate::domain::revision::TagEndpoint;
use crate::domain::tag::{BuildTagsRequest, PinRequest, ReleaseTag, TagOutcome};
use crate::error::{CiError, VcsError};

fn failure(endpoint: &str) -> CiError {
    CiError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        body: "injected failure".to_string(),
    }
}

pub fn root_href(root_id: &str) -> String {
    format!("/app/rest/vcs-root-instances/id:{}", root_id)
}

/// Revision of `root_id` at `hash`
pub fn revision(root_id: &str, hash: &str) -> Revision {
    Revision {
        version: hash.to_string(),
        vcs_root_instance: VcsRootInstance {
            vcs_root_id: root_id.to_string(),
            href: root_href(root_id),
        },
    }
}

// ---------------------------------------------------------------------------
// FakeCi
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeCi {
    properties: Vec<Property>,
    artifact_closure: Vec<BuildHandle>,
    snapshot_closure: Vec<BuildHandle>,
    revisions: HashMap<String, Vec<Revision>>,
    roots: HashMap<String, Vec<Property>>,
    failing: HashSet<String>,
    build_tags: Mutex<Vec<String>>,
    pins: Mutex<BTreeMap<String, PinRequest>>,
    root_lookups: Mutex<Vec<String>>,
}

impl FakeCi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    pub fn with_artifact_build(mut self, href: &str) -> Self {
        self.artifact_closure.push(BuildHandle::new(href));
        self
    }

    /// Add a snapshot-closure build started from `revisions`
    pub fn with_snapshot_build(mut self, href: &str, revisions: Vec<Revision>) -> Self {
        self.snapshot_closure.push(BuildHandle::new(href));
        self.revisions.insert(href.to_string(), revisions);
        self
    }

    /// Register a VCS root instance cloning from `url`
    pub fn with_root(mut self, root_id: &str, url: &str) -> Self {
        self.roots
            .insert(root_href(root_id), vec![Property::new("url", url)]);
        self
    }

    pub fn with_root_properties(mut self, root_id: &str, properties: Vec<Property>) -> Self {
        self.roots.insert(root_href(root_id), properties);
        self
    }

    /// Fail calls keyed by `key`: `properties`, `tag`, `closure:artifact`,
    /// `closure:snapshot`, a build href, a pin href or a root href
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    fn check(&self, key: &str) -> Result<(), CiError> {
        if self.failing.contains(key) {
            Err(failure(key))
        } else {
            Ok(())
        }
    }

    pub fn build_tags(&self) -> Vec<String> {
        self.build_tags.lock().unwrap().clone()
    }

    pub fn pins(&self) -> BTreeMap<String, PinRequest> {
        self.pins.lock().unwrap().clone()
    }

    pub fn root_lookups(&self) -> Vec<String> {
        self.root_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl CiApi for FakeCi {
    async fn resulting_properties(&self, _build: &BuildIdentifier) -> Result<Vec<Property>, CiError> {
        self.check("properties")?;
        Ok(self.properties.clone())
    }

    async fn tag_build(
        &self,
        build: &BuildIdentifier,
        tags: &BuildTagsRequest,
    ) -> Result<(), CiError> {
        self.check("tag")?;
        let mut recorded = self.build_tags.lock().unwrap();
        for tag in &tags.tag {
            recorded.push(format!("{}:{}", build.locator(), tag.name));
        }
        Ok(())
    }

    async fn dependency_closure(
        &self,
        _build: &BuildIdentifier,
        kind: DependencyKind,
    ) -> Result<Vec<BuildHandle>, CiError> {
        self.check(&format!("closure:{}", kind.name()))?;
        Ok(match kind {
            DependencyKind::Artifact => self.artifact_closure.clone(),
            DependencyKind::Snapshot => self.snapshot_closure.clone(),
        })
    }

    async fn set_pin(&self, build: &BuildHandle, request: &PinRequest) -> Result<(), CiError> {
        let href = build.pin_info_href();
        self.check(&href)?;
        self.pins.lock().unwrap().insert(href, request.clone());
        Ok(())
    }

    async fn build_revisions(&self, build: &BuildHandle) -> Result<Vec<Revision>, CiError> {
        self.check(&build.href)?;
        self.revisions
            .get(&build.href)
            .cloned()
            .ok_or_else(|| failure(&build.href))
    }

    async fn vcs_root_properties(&self, root: &VcsRootInstance) -> Result<Vec<Property>, CiError> {
        self.root_lookups
            .lock()
            .unwrap()
            .push(root.vcs_root_id.clone());
        self.check(&root.href)?;
        self.roots
            .get(&root.href)
            .cloned()
            .ok_or_else(|| failure(&root.href))
    }
}

// ---------------------------------------------------------------------------
// FakeVcs
// ---------------------------------------------------------------------------

/// Tag state per endpoint: tag name -> hash
#[derive(Debug, Default)]
pub struct FakeVcs {
    tags: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
    failing: HashSet<String>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, endpoint: &str) -> Self {
        self.failing.insert(endpoint.to_string());
        self
    }

    pub fn tags(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.tags.lock().unwrap().clone()
    }

    fn check(&self, endpoint: &TagEndpoint) -> Result<(), VcsError> {
        if self.failing.contains(endpoint.as_str()) {
            Err(VcsError::Status {
                endpoint: endpoint.to_string(),
                status: 503,
                body: "injected failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VcsApi for FakeVcs {
    async fn create_tag(
        &self,
        endpoint: &TagEndpoint,
        tag: &ReleaseTag,
    ) -> Result<TagOutcome, VcsError> {
        self.check(endpoint)?;
        let mut tags = self.tags.lock().unwrap();
        let repo = tags.entry(endpoint.to_string()).or_default();
        if repo.contains_key(&tag.name) {
            return Ok(TagOutcome::AlreadyExists);
        }
        repo.insert(tag.name.clone(), tag.target.hash.clone());
        Ok(TagOutcome::Created)
    }

    async fn delete_tag(
        &self,
        endpoint: &TagEndpoint,
        tag_name: &str,
    ) -> Result<TagOutcome, VcsError> {
        self.check(endpoint)?;
        let mut tags = self.tags.lock().unwrap();
        let removed = tags
            .get_mut(endpoint.as_str())
            .and_then(|repo| repo.remove(tag_name));
        Ok(if removed.is_some() {
            TagOutcome::Deleted
        } else {
            TagOutcome::Absent
        })
    }
}
