//! Tag and pin domain types
//!
//! Request bodies for the mutations a run performs, and the mode flag
//! that decides whether a run adds or removes them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::revision::TagEndpoint;

/// Tag applied to the root build itself
pub const BUILD_RELEASE_TAG: &str = "release";

/// Format of the pin comment timestamp, e.g. `20240131T154500+0000`
pub const PIN_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%z";

/// Whether a run adds or removes pins and release tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    Create,
    Delete,
}

impl TagMode {
    pub fn from_delete_flag(delete: bool) -> Self {
        if delete {
            Self::Delete
        } else {
            Self::Create
        }
    }

    /// Value of the pin `status` field for this mode
    pub fn pin_status(&self) -> bool {
        matches!(self, Self::Create)
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

/// Annotated release tag `rel/{release}` at one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseTag {
    pub name: String,
    pub target: TagCommit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCommit {
    pub hash: String,
}

impl ReleaseTag {
    pub fn new(release: &str, hash: impl Into<String>) -> Self {
        Self {
            name: release_tag_name(release),
            target: TagCommit { hash: hash.into() },
        }
    }
}

pub fn release_tag_name(release: &str) -> String {
    format!("rel/{}", release)
}

/// Result of one tag mutation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    Created,
    AlreadyExists,
    Deleted,
    Absent,
}

impl TagOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already exists",
            Self::Deleted => "deleted",
            Self::Absent => "already absent",
        }
    }
}

/// One finished tag task, for the run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagResult {
    pub endpoint: TagEndpoint,
    pub outcome: TagOutcome,
}

/// Body of a TeamCity `pinInfo` PUT
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinRequest {
    pub comment: PinComment,
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinComment {
    pub text: String,
    pub timestamp: String,
}

impl PinRequest {
    /// One request shared by every build in a batch, stamped with `at`
    pub fn for_release(release: &str, mode: TagMode, at: DateTime<Utc>) -> Self {
        Self {
            comment: PinComment {
                text: format!("Release {}", release),
                timestamp: at.format(PIN_TIMESTAMP_FORMAT).to_string(),
            },
            status: mode.pin_status(),
        }
    }
}

/// Body of a TeamCity build tags POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTagsRequest {
    pub count: usize,
    pub tag: Vec<BuildTagName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTagName {
    pub name: String,
}

impl BuildTagsRequest {
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            count: 1,
            tag: vec![BuildTagName { name: name.into() }],
        }
    }
}
