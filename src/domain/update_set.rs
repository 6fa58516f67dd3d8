//! The unit of work carried through sorting, selection and orchestration

use super::{PackageId, PackageInProject, PackageLookupResult, PackageSearchMetadata};
use crate::error::UpdateSetError;
use semver::Version;
use std::fmt;

/// All current usages of one package id plus its chosen upgrade candidate
///
/// Invariant: `current_packages` is non-empty and every occurrence shares
/// the package id of the lookup result's selected candidate.
#[derive(Debug, Clone)]
pub struct PackageUpdateSet {
    current_packages: Vec<PackageInProject>,
    lookup: PackageLookupResult,
    selected: PackageSearchMetadata,
}

impl PackageUpdateSet {
    /// Build an update set, enforcing the id invariant
    pub fn new(
        current_packages: Vec<PackageInProject>,
        lookup: PackageLookupResult,
    ) -> Result<Self, UpdateSetError> {
        let selected = lookup
            .selected()
            .cloned()
            .ok_or(UpdateSetError::NoSelectedUpdate)?;

        if current_packages.is_empty() {
            return Err(UpdateSetError::NoCurrentUsages {
                package: selected.identity.id.to_string(),
            });
        }

        if let Some(mismatch) = current_packages
            .iter()
            .find(|p| p.id != selected.identity.id)
        {
            return Err(UpdateSetError::MismatchedPackageId {
                expected: selected.identity.id.to_string(),
                found: mismatch.id.to_string(),
            });
        }

        Ok(Self {
            current_packages,
            lookup,
            selected,
        })
    }

    /// The package id this set updates
    pub fn id(&self) -> &PackageId {
        &self.selected.identity.id
    }

    /// The candidate the allowed-change ceiling selected
    pub fn selected(&self) -> &PackageSearchMetadata {
        &self.selected
    }

    /// The version the set upgrades to
    pub fn selected_version(&self) -> &Version {
        &self.selected.identity.version
    }

    /// The full tiered lookup result, for reporting
    pub fn lookup(&self) -> &PackageLookupResult {
        &self.lookup
    }

    /// All current usages of the package
    pub fn current_packages(&self) -> &[PackageInProject] {
        &self.current_packages
    }

    /// Number of places the package is referenced
    pub fn usage_count(&self) -> usize {
        self.current_packages.len()
    }

    /// Number of distinct versions currently in use across usages
    pub fn distinct_current_versions(&self) -> usize {
        let mut versions: Vec<&Version> =
            self.current_packages.iter().map(|p| &p.version).collect();
        versions.sort();
        versions.dedup();
        versions.len()
    }

    /// The highest version currently in use
    pub fn highest_current_version(&self) -> &Version {
        let mut highest = &self.current_packages[0].version;
        for pkg in &self.current_packages[1..] {
            if pkg.version > *highest {
                highest = &pkg.version;
            }
        }
        highest
    }

    /// True if the selected candidate declares a dependency on `other`'s
    /// package; used to order updates dependency-first
    pub fn depends_on(&self, other: &PackageUpdateSet) -> bool {
        self.selected.depends_on(other.id())
    }
}

impl fmt::Display for PackageUpdateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} ({} usages)",
            self.id(),
            self.selected_version(),
            self.usage_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        PackageIdentity, PackageLocation, PackageSource, ReferenceFormat, VersionChange,
    };

    fn usage(id: &str, version: &str, path: &str) -> PackageInProject {
        PackageInProject::new(
            id,
            Version::parse(version).unwrap(),
            PackageLocation::new("/repo", path, ReferenceFormat::ProjectFile),
        )
    }

    fn lookup_for(id: &str, version: &str) -> PackageLookupResult {
        let meta = PackageSearchMetadata::new(
            PackageIdentity::new(id, Version::parse(version).unwrap()),
            PackageSource::new("https://feed.test/v3"),
            None,
            Vec::new(),
        );
        PackageLookupResult::new(VersionChange::Major, Some(meta), None, None, None)
    }

    #[test]
    fn test_new_accepts_matching_ids() {
        let set = PackageUpdateSet::new(
            vec![usage("foo", "1.0.0", "a.csproj"), usage("Foo", "1.1.0", "b.csproj")],
            lookup_for("foo", "2.0.0"),
        )
        .unwrap();

        assert_eq!(set.usage_count(), 2);
        assert_eq!(set.distinct_current_versions(), 2);
        assert_eq!(set.selected_version(), &Version::new(2, 0, 0));
        assert_eq!(set.highest_current_version(), &Version::new(1, 1, 0));
    }

    #[test]
    fn test_new_rejects_mismatched_id() {
        let err = PackageUpdateSet::new(
            vec![usage("bar", "1.0.0", "a.csproj")],
            lookup_for("foo", "2.0.0"),
        )
        .unwrap_err();
        assert!(matches!(err, UpdateSetError::MismatchedPackageId { .. }));
    }

    #[test]
    fn test_new_rejects_empty_usages() {
        let err = PackageUpdateSet::new(Vec::new(), lookup_for("foo", "2.0.0")).unwrap_err();
        assert!(matches!(err, UpdateSetError::NoCurrentUsages { .. }));
    }

    #[test]
    fn test_new_rejects_lookup_without_selection() {
        let lookup = PackageLookupResult::new(VersionChange::Patch, None, None, None, None);
        let err =
            PackageUpdateSet::new(vec![usage("foo", "1.0.0", "a.csproj")], lookup).unwrap_err();
        assert!(matches!(err, UpdateSetError::NoSelectedUpdate));
    }

    #[test]
    fn test_distinct_versions_dedupes() {
        let set = PackageUpdateSet::new(
            vec![
                usage("foo", "1.0.0", "a.csproj"),
                usage("foo", "1.0.0", "b.csproj"),
                usage("foo", "1.2.0", "c.csproj"),
            ],
            lookup_for("foo", "2.0.0"),
        )
        .unwrap();
        assert_eq!(set.distinct_current_versions(), 2);
        assert_eq!(set.usage_count(), 3);
    }
}
