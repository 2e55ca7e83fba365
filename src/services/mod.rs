//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services reach TeamCity and Bitbucket only through the REST traits,
//! so every stage can be driven by the in-memory fakes in tests.

pub mod closure;
pub mod metadata;
pub mod pinner;
pub mod pool;
pub mod revision_mapper;
pub mod tag_service;

// Re-export the entry points used by main and the summary
pub use tag_service::{ReleaseRequest, RunReport, TagService};
