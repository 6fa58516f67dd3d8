//! Update discovery: one pass per repository
//!
//! Composes scanning, metapackage exclusion, include/exclude filtering and
//! version lookup into the list of possible updates for one working copy.

mod filter;
mod metapackages;

pub use filter::PackageFilter;
pub use metapackages::Metapackages;

use crate::domain::{
    PackageId, PackageInProject, PackageSource, PackageUpdateSet, VersionChange,
};
use crate::error::ScanError;
use crate::lookup::PackageLookup;
use crate::scan::PackageScanner;
use futures::future::join_all;
use semver::Version;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Discovers the possible package updates in one repository working copy
pub struct UpdateFinder {
    scanner: Box<dyn PackageScanner>,
    lookup: PackageLookup,
    metapackages: Metapackages,
    filter: PackageFilter,
}

impl UpdateFinder {
    /// Create a finder over its collaborators
    pub fn new(
        scanner: Box<dyn PackageScanner>,
        lookup: PackageLookup,
        metapackages: Metapackages,
        filter: PackageFilter,
    ) -> Self {
        Self {
            scanner,
            lookup,
            metapackages,
            filter,
        }
    }

    /// Run one discovery pass over a working copy
    pub async fn find_package_updates(
        &self,
        folder: &Path,
        allowed_change: VersionChange,
        sources: &[PackageSource],
    ) -> Result<Vec<PackageUpdateSet>, ScanError> {
        let packages = self.scanner.find_all_packages(folder)?;
        let package_count = packages.len();

        let packages = self.without_metapackages(packages);
        let packages: Vec<PackageInProject> = packages
            .into_iter()
            .filter(|p| {
                let keep = self.filter.accepts(&p.id);
                if !keep {
                    debug!("filtered out {}", p.id);
                }
                keep
            })
            .collect();

        let groups = group_by_id(packages);

        let lookups = groups.into_iter().map(|(id, usages)| async move {
            let current = highest_version(&usages);
            let result = self
                .lookup
                .find_version_update(&id, &current, allowed_change, sources)
                .await;
            (usages, result)
        });

        let mut updates = Vec::new();
        for (usages, result) in join_all(lookups).await {
            if result.selected().is_none() {
                continue;
            }
            match PackageUpdateSet::new(usages, result) {
                Ok(update) => updates.push(update),
                Err(e) => warn!("dropping malformed update set: {}", e),
            }
        }

        info!(
            "found {} package references in {}, {} possible updates",
            package_count,
            folder.display(),
            updates.len()
        );
        Ok(updates)
    }

    /// Drop metapackage occurrences, logging each as an error
    ///
    /// A metapackage carrying an explicit version is a project defect worth
    /// shouting about, but it never aborts the run.
    fn without_metapackages(&self, packages: Vec<PackageInProject>) -> Vec<PackageInProject> {
        packages
            .into_iter()
            .filter(|p| {
                if self.metapackages.contains(&p.id) {
                    error!(
                        "{} in {} is a metapackage and must not have an explicit version",
                        p.id,
                        p.location.relative_path.display()
                    );
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

/// Group occurrences by package id, preserving first-seen order
fn group_by_id(packages: Vec<PackageInProject>) -> Vec<(PackageId, Vec<PackageInProject>)> {
    let mut order: Vec<PackageId> = Vec::new();
    let mut by_id: HashMap<PackageId, Vec<PackageInProject>> = HashMap::new();

    for package in packages {
        let entry = by_id.entry(package.id.clone()).or_default();
        if entry.is_empty() {
            order.push(package.id.clone());
        }
        entry.push(package);
    }

    order
        .into_iter()
        .filter_map(|id| by_id.remove(&id).map(|usages| (id, usages)))
        .collect()
}

/// Highest version among a group's usages; the lookup classifies against it
fn highest_version(usages: &[PackageInProject]) -> Version {
    usages
        .iter()
        .map(|p| p.version.clone())
        .max()
        .unwrap_or_else(|| Version::new(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PackageIdentity, PackageLocation, PackageSearchMetadata, ReferenceFormat};
    use crate::error::LookupError;
    use crate::lookup::{SourceClient, SourceClientCache, SourceClientFactory};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn usage(id: &str, version: &str, path: &str) -> PackageInProject {
        PackageInProject::new(
            id,
            Version::parse(version).unwrap(),
            PackageLocation::new("/repo", path, ReferenceFormat::ProjectFile),
        )
    }

    /// Scanner returning a fixed package list
    struct FixedScanner {
        packages: Vec<PackageInProject>,
    }

    impl PackageScanner for FixedScanner {
        fn find_all_packages(&self, _folder: &Path) -> Result<Vec<PackageInProject>, ScanError> {
            Ok(self.packages.clone())
        }
    }

    /// Feed serving 9.0.0 for every package it is asked about
    struct UpgradeEverything {
        source: PackageSource,
    }

    #[async_trait]
    impl SourceClient for UpgradeEverything {
        fn source(&self) -> &PackageSource {
            &self.source
        }

        async fn get_package_versions(
            &self,
            id: &PackageId,
            _include_prerelease: bool,
        ) -> Result<Vec<PackageSearchMetadata>, LookupError> {
            Ok(vec![PackageSearchMetadata::new(
                PackageIdentity::new(id.clone(), Version::new(9, 0, 0)),
                self.source.clone(),
                None,
                Vec::new(),
            )])
        }
    }

    struct UpgradeFactory;

    impl SourceClientFactory for UpgradeFactory {
        fn create(&self, source: &PackageSource) -> Result<Arc<dyn SourceClient>, LookupError> {
            Ok(Arc::new(UpgradeEverything {
                source: source.clone(),
            }))
        }
    }

    fn finder_over(packages: Vec<PackageInProject>, filter: PackageFilter) -> UpdateFinder {
        let cache = Arc::new(SourceClientCache::new(Box::new(UpgradeFactory)));
        UpdateFinder::new(
            Box::new(FixedScanner { packages }),
            PackageLookup::new(cache),
            Metapackages::default(),
            filter,
        )
    }

    fn sources() -> Vec<PackageSource> {
        vec![PackageSource::new("https://feed.test/v3")]
    }

    #[tokio::test]
    async fn test_usages_of_one_package_become_one_update_set() {
        let finder = finder_over(
            vec![
                usage("foo", "1.0.0", "a.csproj"),
                usage("Foo", "1.1.0", "b.csproj"),
                usage("bar", "2.0.0", "a.csproj"),
            ],
            PackageFilter::default(),
        );

        let updates = finder
            .find_package_updates(Path::new("/repo"), VersionChange::Major, &sources())
            .await
            .unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].id().as_str(), "foo");
        assert_eq!(updates[0].usage_count(), 2);
        assert_eq!(updates[0].selected_version(), &Version::new(9, 0, 0));
    }

    #[tokio::test]
    async fn test_metapackages_are_dropped() {
        let finder = finder_over(
            vec![
                usage("Microsoft.AspNetCore.App", "2.1.0", "a.csproj"),
                usage("foo", "1.0.0", "a.csproj"),
            ],
            PackageFilter::default(),
        );

        let updates = finder
            .find_package_updates(Path::new("/repo"), VersionChange::Major, &sources())
            .await
            .unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id().as_str(), "foo");
    }

    #[tokio::test]
    async fn test_exclude_filter_applies() {
        let finder = finder_over(
            vec![
                usage("foo", "1.0.0", "a.csproj"),
                usage("bar", "1.0.0", "a.csproj"),
            ],
            PackageFilter::from_patterns(None, Some("^bar$")).unwrap(),
        );

        let updates = finder
            .find_package_updates(Path::new("/repo"), VersionChange::Major, &sources())
            .await
            .unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id().as_str(), "foo");
    }

    #[test]
    fn test_group_by_id_preserves_first_seen_order() {
        let groups = group_by_id(vec![
            usage("b", "1.0.0", "x.csproj"),
            usage("a", "1.0.0", "x.csproj"),
            usage("B", "2.0.0", "y.csproj"),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.as_str(), "b");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0.as_str(), "a");
    }
}
