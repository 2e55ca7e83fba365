//! Centralized error types for reltag
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.
//!
//! The taxonomy mirrors how failures are handled at run time:
//! resolution and configuration errors are fatal, mapping and
//! mutation errors are recorded per task and only logged.

use thiserror::Error;

/// Top-level error type for a tagging run
#[derive(Error, Debug)]
pub enum TagError {
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors from the CI (TeamCity) REST facade
#[derive(Error, Debug)]
pub enum CiError {
    #[error("TeamCity request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("TeamCity returned {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected TeamCity response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

/// Errors from the VCS hosting (Bitbucket) REST facade
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Bitbucket request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Bitbucket returned {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
}

/// Fatal errors while resolving build metadata or dependency closures
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Failed to resolve metadata for build {build}: {source}")]
    Metadata {
        build: String,
        #[source]
        source: CiError,
    },

    #[error("Failed to resolve {kind} dependency closure of build {build}: {source}")]
    Closure {
        kind: String,
        build: String,
        #[source]
        source: CiError,
    },
}

/// Per-record errors while mapping revisions to tag endpoints (non-fatal)
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Failed to fetch revisions of {build_href}: {source}")]
    RevisionLookup {
        build_href: String,
        #[source]
        source: CiError,
    },

    #[error("Failed to fetch VCS root {root_id}: {source}")]
    RootLookup {
        root_id: String,
        #[source]
        source: CiError,
    },

    #[error("VCS root {root_id} has no '{property}' property")]
    MissingRootProperty { root_id: String, property: String },

    #[error("VCS root {root_id} remote {url} is not an SSH clone URL (git@host:owner/repo.git)")]
    UnrecognizedRemote { root_id: String, url: String },

    #[error("Mapping task did not complete: {message}")]
    Join { message: String },
}

/// Per-task errors from pin and tag mutations (non-fatal)
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Failed to tag build {build}: {source}")]
    BuildTag {
        build: String,
        #[source]
        source: CiError,
    },

    #[error("Failed to update pin of {build_href}: {source}")]
    Pin {
        build_href: String,
        #[source]
        source: CiError,
    },

    #[error("Failed to {action} tag {tag} at {endpoint}: {source}")]
    Tag {
        action: &'static str,
        tag: String,
        endpoint: String,
        #[source]
        source: VcsError,
    },

    #[error("Mutation task did not complete: {message}")]
    Join { message: String },
}

impl From<tokio::task::JoinError> for MappingError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join {
            message: e.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for MutationError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join {
            message: e.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration missing: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },
}
