//! Published package metadata as reported by a version source

use super::PackageId;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configured package feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageSource {
    /// Feed base URL
    pub url: String,
}

impl PackageSource {
    /// Create a source from a feed URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl fmt::Display for PackageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// A package id at one exact version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Package identifier
    pub id: PackageId,
    /// Exact version
    pub version: Version,
}

impl PackageIdentity {
    /// Create a new identity
    pub fn new(id: impl Into<PackageId>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// One known published version of a package
///
/// Created fresh each discovery pass and discarded after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSearchMetadata {
    /// Identity of the published version
    pub identity: PackageIdentity,
    /// The feed that reported it
    pub source: PackageSource,
    /// Publish timestamp, when the feed reports one
    pub published: Option<DateTime<Utc>>,
    /// Ids of packages this version declares as dependencies
    pub dependencies: Vec<PackageId>,
}

impl PackageSearchMetadata {
    /// Create new metadata
    pub fn new(
        identity: PackageIdentity,
        source: PackageSource,
        published: Option<DateTime<Utc>>,
        dependencies: Vec<PackageId>,
    ) -> Self {
        Self {
            identity,
            source,
            published,
            dependencies,
        }
    }

    /// The published version
    pub fn version(&self) -> &Version {
        &self.identity.version
    }

    /// True if this version declares a dependency on the given package
    pub fn depends_on(&self, id: &PackageId) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }
}
