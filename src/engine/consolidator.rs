//! Grouping updates into branches/PRs

use crate::domain::PackageUpdateSet;

/// Split updates into the groups that each get one branch and one PR
///
/// Consolidated runs put everything on a single branch; otherwise each
/// update gets its own. Order within and across groups is preserved.
pub fn consolidate(
    updates: Vec<PackageUpdateSet>,
    consolidate: bool,
) -> Vec<Vec<PackageUpdateSet>> {
    if updates.is_empty() {
        return Vec::new();
    }
    if consolidate {
        vec![updates]
    } else {
        updates.into_iter().map(|u| vec![u]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        PackageIdentity, PackageInProject, PackageLocation, PackageLookupResult,
        PackageSearchMetadata, PackageSource, ReferenceFormat, VersionChange,
    };
    use semver::Version;

    fn update(id: &str) -> PackageUpdateSet {
        let usage = PackageInProject::new(
            id,
            Version::new(1, 0, 0),
            PackageLocation::new("/repo", "a.csproj", ReferenceFormat::ProjectFile),
        );
        let meta = PackageSearchMetadata::new(
            PackageIdentity::new(id, Version::new(2, 0, 0)),
            PackageSource::new("https://feed.test/v3"),
            None,
            Vec::new(),
        );
        let lookup = PackageLookupResult::new(VersionChange::Major, Some(meta), None, None, None);
        PackageUpdateSet::new(vec![usage], lookup).unwrap()
    }

    #[test]
    fn test_unconsolidated_yields_singleton_groups() {
        let groups = consolidate(vec![update("foo"), update("bar")], false);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[0][0].id().as_str(), "foo");
        assert_eq!(groups[1][0].id().as_str(), "bar");
    }

    #[test]
    fn test_consolidated_yields_one_group() {
        let groups = consolidate(vec![update("foo"), update("bar")], true);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(consolidate(Vec::new(), true).is_empty());
        assert!(consolidate(Vec::new(), false).is_empty());
    }
}
