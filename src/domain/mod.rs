//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod build;
pub mod properties;
pub mod revision;
pub mod tag;
