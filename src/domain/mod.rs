//! Core domain models for prbump
//!
//! This module contains the fundamental types used throughout the application:
//! - Package identity and per-project occurrence types
//! - Declared version ranges with a single-version projection
//! - Published package metadata from version sources
//! - Tiered lookup results and allowed-change ceilings
//! - Update sets, the unit of work through sorting and orchestration
//! - Repository pull/push targets

mod lookup_result;
mod metadata;
mod package;
mod repository;
mod update_set;
mod version_range;

pub use lookup_result::{PackageLookupResult, VersionChange};
pub use metadata::{PackageIdentity, PackageSearchMetadata, PackageSource};
pub use package::{PackageId, PackageInProject, PackageLocation, ReferenceFormat};
pub use repository::{RemoteRepository, RepositoryData};
pub use update_set::PackageUpdateSet;
pub use version_range::PackageVersionRange;
