//! Revision domain types
//!
//! Maps the VCS state behind each snapshot dependency to the Bitbucket
//! endpoint where its release tag lives. Pure logic, no I/O.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::MappingError;

/// A VCS root together with the remote it clones from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsRootReference {
    pub root_id: String,
    pub remote_url: String,
}

impl VcsRootReference {
    pub fn new(root_id: impl Into<String>, remote_url: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            remote_url: remote_url.into(),
        }
    }

    /// Derive the tag endpoint for this root's repository
    pub fn tag_endpoint(&self) -> Result<TagEndpoint, MappingError> {
        TagEndpoint::from_clone_url(&self.remote_url).ok_or_else(|| {
            MappingError::UnrecognizedRemote {
                root_id: self.root_id.clone(),
                url: self.remote_url.clone(),
            }
        })
    }
}

/// The commit a snapshot dependency was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRecord {
    pub root: VcsRootReference,
    pub revision_hash: String,
}

impl RevisionRecord {
    pub fn tag_target(&self) -> Result<TagTarget, MappingError> {
        Ok(TagTarget {
            endpoint: self.root.tag_endpoint()?,
            revision_hash: self.revision_hash.clone(),
            root_id: self.root.root_id.clone(),
        })
    }
}

/// Bitbucket `refs/tags` collection of one repository,
/// e.g. `/2.0/repositories/acme/avionics/refs/tags`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagEndpoint(String);

impl TagEndpoint {
    /// Rewrite `git@host:<owner>/<repo>.git` into the repository's tag endpoint
    pub fn from_clone_url(url: &str) -> Option<Self> {
        let caps = clone_url_pattern().captures(url.trim())?;
        Some(Self(format!(
            "/2.0/repositories/{}/{}/refs/tags",
            &caps["owner"], &caps["repo"]
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of a single named tag under this endpoint
    pub fn tag_path(&self, tag_name: &str) -> String {
        format!("{}/{}", self.0, tag_name)
    }
}

impl fmt::Display for TagEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn clone_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+:(?P<owner>[^/\s:]+)/(?P<repo>[^/\s]+)\.git$")
            .expect("clone url pattern is valid")
    })
}

/// Where one snapshot edge should be tagged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTarget {
    pub endpoint: TagEndpoint,
    pub revision_hash: String,
    pub root_id: String,
}

/// Endpoint -> revision hash, one entry per repository in the release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionMap {
    entries: BTreeMap<TagEndpoint, String>,
}

impl RevisionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge targets in observation order; a later target for the same
    /// endpoint replaces the earlier one. Returns the replaced targets.
    pub fn merge<I>(&mut self, targets: I) -> Vec<(TagTarget, String)>
    where
        I: IntoIterator<Item = TagTarget>,
    {
        let mut replaced = Vec::new();
        for target in targets {
            if let Some(previous) = self
                .entries
                .insert(target.endpoint.clone(), target.revision_hash.clone())
            {
                if previous != target.revision_hash {
                    replaced.push((target, previous));
                }
            }
        }
        replaced
    }

    pub fn get(&self, endpoint: &TagEndpoint) -> Option<&str> {
        self.entries.get(endpoint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagEndpoint, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}
