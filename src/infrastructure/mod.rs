//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - TeamCity REST API (build metadata, closures, tags, pins)
//! - Bitbucket REST API (release tags)

pub mod bitbucket;
#[cfg(test)]
pub mod fakes;
pub mod http;
pub mod teamcity;

// Re-export commonly used types
pub use bitbucket::{BitbucketClient, BitbucketCredentials};
pub use teamcity::{TeamCityClient, TeamCityCredentials};
