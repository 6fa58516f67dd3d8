//! Tiered version-change classification
//!
//! Given the current version and an unordered candidate set, compute the
//! best candidate at every change tier. All tiers are always computed,
//! independent of the requested ceiling, so reporting can say "a higher
//! version exists but was not allowed".

use crate::domain::{PackageLookupResult, PackageSearchMetadata, VersionChange};
use semver::Version;

/// Pick the best candidate per tier from an unordered candidate set
///
/// Candidates are ordered descending by version; for each tier the first
/// candidate satisfying that tier's predicate is retained:
/// - major: any version higher than current
/// - minor: higher, same major
/// - patch: higher, same major and minor
/// - exact: equal to current
pub fn classify(
    allowed_change: VersionChange,
    current: &Version,
    candidates: &[PackageSearchMetadata],
) -> PackageLookupResult {
    let mut ordered: Vec<&PackageSearchMetadata> = candidates.iter().collect();
    ordered.sort_by(|a, b| b.version().cmp(a.version()));

    let first_match = |predicate: &dyn Fn(&Version) -> bool| {
        ordered
            .iter()
            .find(|m| predicate(m.version()))
            .map(|m| (*m).clone())
    };

    let major = first_match(&|v| v > current);
    let minor = first_match(&|v| v > current && v.major == current.major);
    let patch =
        first_match(&|v| v > current && v.major == current.major && v.minor == current.minor);
    let exact = first_match(&|v| v == current);

    PackageLookupResult::new(allowed_change, major, minor, patch, exact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PackageIdentity, PackageSource};

    fn meta(version: &str) -> PackageSearchMetadata {
        PackageSearchMetadata::new(
            PackageIdentity::new("foo", Version::parse(version).unwrap()),
            PackageSource::new("https://feed.test/v3"),
            None,
            Vec::new(),
        )
    }

    fn candidates(versions: &[&str]) -> Vec<PackageSearchMetadata> {
        versions.iter().map(|v| meta(v)).collect()
    }

    #[test]
    fn test_each_tier_picks_its_best_candidate() {
        let current = Version::new(1, 2, 3);
        let result = classify(
            VersionChange::Major,
            &current,
            &candidates(&["2.0.0", "1.5.0", "1.2.9", "1.2.3"]),
        );

        assert_eq!(result.major.unwrap().version(), &Version::new(2, 0, 0));
        assert_eq!(result.minor.unwrap().version(), &Version::new(1, 5, 0));
        assert_eq!(result.patch.unwrap().version(), &Version::new(1, 2, 9));
        assert_eq!(result.exact.unwrap().version(), &Version::new(1, 2, 3));
    }

    #[test]
    fn test_tiers_only_tighten() {
        // Whenever all tiers exist: major pick >= minor pick >= patch pick
        let current = Version::new(2, 3, 1);
        let result = classify(
            VersionChange::Major,
            &current,
            &candidates(&["2.3.4", "2.4.0", "3.1.0", "2.3.2", "4.0.0"]),
        );

        let major = result.major.unwrap().identity.version;
        let minor = result.minor.unwrap().identity.version;
        let patch = result.patch.unwrap().identity.version;
        assert!(major >= minor);
        assert!(minor >= patch);
        assert_eq!(major, Version::new(4, 0, 0));
        assert_eq!(minor, Version::new(2, 4, 0));
        assert_eq!(patch, Version::new(2, 3, 4));
    }

    #[test]
    fn test_tiers_computed_independent_of_ceiling() {
        // A Patch ceiling still reports the available major jump
        let current = Version::new(1, 0, 0);
        let result = classify(
            VersionChange::Patch,
            &current,
            &candidates(&["1.0.1", "2.0.0"]),
        );

        assert_eq!(result.selected().unwrap().version(), &Version::new(1, 0, 1));
        assert_eq!(result.major.unwrap().version(), &Version::new(2, 0, 0));
    }

    #[test]
    fn test_no_higher_candidate_selects_nothing() {
        let current = Version::new(3, 0, 0);
        let result = classify(
            VersionChange::Major,
            &current,
            &candidates(&["2.9.0", "3.0.0"]),
        );

        assert!(result.major.is_none());
        assert!(result.selected().is_none());
        assert_eq!(result.exact.unwrap().version(), &Version::new(3, 0, 0));
    }

    #[test]
    fn test_none_ceiling_selects_exact_match_only() {
        let current = Version::new(1, 2, 3);
        let result = classify(
            VersionChange::None,
            &current,
            &candidates(&["1.2.3", "9.9.9"]),
        );
        assert_eq!(result.selected().unwrap().version(), &Version::new(1, 2, 3));
    }

    #[test]
    fn test_empty_candidate_set() {
        let result = classify(VersionChange::Major, &Version::new(1, 0, 0), &[]);
        assert!(result.major.is_none());
        assert!(result.minor.is_none());
        assert!(result.patch.is_none());
        assert!(result.exact.is_none());
    }
}
