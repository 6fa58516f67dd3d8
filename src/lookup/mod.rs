//! Concurrent multi-source version lookup
//!
//! This module provides:
//! - Tiered version-change classification
//! - Source clients and the shared per-feed client cache
//! - Fan-out/fan-in lookup across all configured feeds

mod classifier;
mod source_cache;
mod source_client;

pub use classifier::classify;
pub use source_cache::{HttpSourceClientFactory, SourceClientCache, SourceClientFactory};
pub use source_client::{HttpSourceClient, SourceClient};

use crate::domain::{PackageId, PackageLookupResult, PackageSearchMetadata, PackageSource, VersionChange};
use futures::future::join_all;
use semver::Version;
use std::sync::Arc;
use tracing::warn;

/// Looks up update candidates for packages across all configured feeds
pub struct PackageLookup {
    cache: Arc<SourceClientCache>,
}

impl PackageLookup {
    /// Create a lookup over a shared client cache
    pub fn new(cache: Arc<SourceClientCache>) -> Self {
        Self { cache }
    }

    /// Find the tiered update candidates for one package
    ///
    /// Fans out one request per feed and merges the results. A failing feed
    /// is logged and contributes nothing; it never fails the whole lookup.
    /// Prerelease candidates are considered only when the current version
    /// is itself on a prerelease track.
    pub async fn find_version_update(
        &self,
        id: &PackageId,
        current: &Version,
        allowed_change: VersionChange,
        sources: &[PackageSource],
    ) -> PackageLookupResult {
        let include_prerelease = !current.pre.is_empty();

        let requests = sources
            .iter()
            .map(|source| self.versions_from_source(id, include_prerelease, source));
        let per_source = join_all(requests).await;

        let candidates: Vec<PackageSearchMetadata> =
            per_source.into_iter().flatten().collect();

        classify(allowed_change, current, &candidates)
    }

    /// Fetch versions from one feed, mapping any failure to an empty result
    async fn versions_from_source(
        &self,
        id: &PackageId,
        include_prerelease: bool,
        source: &PackageSource,
    ) -> Vec<PackageSearchMetadata> {
        let client = match self.cache.get(source) {
            Ok(client) => client,
            Err(e) => {
                warn!("skipping feed {}: {}", source, e);
                return Vec::new();
            }
        };

        match client.get_package_versions(id, include_prerelease).await {
            Ok(versions) => versions,
            Err(e) => {
                warn!("feed {} failed for {}: {}", source, id, e);
                Vec::new()
            }
        }
    }
}
