//! prbump - Automated dependency update pull requests
//!
//! This library provides the core functionality for keeping package
//! references current across many repositories:
//! - Scanning working copies for package references
//! - Concurrent multi-feed version lookup and tiered classification
//! - Priority, dependency and age/count based update selection
//! - A branch/commit/pull-request workflow per repository

pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod finder;
pub mod git;
pub mod lookup;
pub mod message;
pub mod platform;
pub mod scan;
pub mod settings;
pub mod sort;
