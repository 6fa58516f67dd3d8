//! Include/exclude filtering of package ids

use crate::domain::PackageId;
use crate::error::ConfigError;
use regex::Regex;

/// Regex include/exclude filter over package ids
///
/// A missing include pattern matches everything; a missing exclude pattern
/// matches nothing. A package is kept iff it is included and not excluded.
#[derive(Debug, Default)]
pub struct PackageFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl PackageFilter {
    /// Build a filter from optional pattern strings
    pub fn from_patterns(
        include: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let compile = |which: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                which,
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
        };

        Ok(Self {
            include: include.map(|p| compile("include", p)).transpose()?,
            exclude: exclude.map(|p| compile("exclude", p)).transpose()?,
        })
    }

    /// True if the package passes both patterns
    pub fn accepts(&self, id: &PackageId) -> bool {
        let included = self
            .include
            .as_ref()
            .is_none_or(|r| r.is_match(id.as_str()));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|r| r.is_match(id.as_str()));
        included && !excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_patterns_accepts_everything() {
        let filter = PackageFilter::from_patterns(None, None).unwrap();
        assert!(filter.accepts(&PackageId::new("anything")));
    }

    #[test]
    fn test_include_narrows() {
        let filter = PackageFilter::from_patterns(Some("^Acme\\."), None).unwrap();
        assert!(filter.accepts(&PackageId::new("Acme.Core")));
        assert!(!filter.accepts(&PackageId::new("Other.Core")));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = PackageFilter::from_patterns(Some("^Acme\\."), Some("Legacy")).unwrap();
        assert!(filter.accepts(&PackageId::new("Acme.Core")));
        assert!(!filter.accepts(&PackageId::new("Acme.Legacy")));
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let err = PackageFilter::from_patterns(Some("("), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { which: "include", .. }));
    }
}
