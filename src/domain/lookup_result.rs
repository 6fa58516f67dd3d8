//! Allowed-change ceilings and tiered lookup results

use super::PackageSearchMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy cap bounding how large an automatic version jump may be
///
/// The ceiling is an enum, so an unrecognized value is rejected where the
/// configuration is parsed rather than surfacing later as a selection error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionChange {
    /// Only an exact match of the current version
    None,
    /// Same major and minor version
    Patch,
    /// Same major version
    Minor,
    /// Any higher version
    Major,
}

impl FromStr for VersionChange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(VersionChange::None),
            "patch" => Ok(VersionChange::Patch),
            "minor" => Ok(VersionChange::Minor),
            "major" => Ok(VersionChange::Major),
            other => Err(format!("unknown version change '{}'", other)),
        }
    }
}

impl fmt::Display for VersionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionChange::None => "none",
            VersionChange::Patch => "patch",
            VersionChange::Minor => "minor",
            VersionChange::Major => "major",
        };
        write!(f, "{}", name)
    }
}

/// Best candidate found at each change tier
///
/// All tiers are computed regardless of the requested ceiling, so reporting
/// can show that a higher version exists even when it was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLookupResult {
    /// The ceiling the lookup was asked to respect
    pub allowed_change: VersionChange,
    /// Best candidate with any higher version
    pub major: Option<PackageSearchMetadata>,
    /// Best higher candidate within the current major version
    pub minor: Option<PackageSearchMetadata>,
    /// Best higher candidate within the current major.minor version
    pub patch: Option<PackageSearchMetadata>,
    /// Candidate exactly matching the current version
    pub exact: Option<PackageSearchMetadata>,
}

impl PackageLookupResult {
    /// Create a lookup result from per-tier picks
    pub fn new(
        allowed_change: VersionChange,
        major: Option<PackageSearchMetadata>,
        minor: Option<PackageSearchMetadata>,
        patch: Option<PackageSearchMetadata>,
        exact: Option<PackageSearchMetadata>,
    ) -> Self {
        Self {
            allowed_change,
            major,
            minor,
            patch,
            exact,
        }
    }

    /// The candidate for the requested ceiling, if one was found
    pub fn selected(&self) -> Option<&PackageSearchMetadata> {
        match self.allowed_change {
            VersionChange::Major => self.major.as_ref(),
            VersionChange::Minor => self.minor.as_ref(),
            VersionChange::Patch => self.patch.as_ref(),
            VersionChange::None => self.exact.as_ref(),
        }
    }

    /// The overall highest candidate, for "a higher version exists but was
    /// not applied" reporting
    pub fn highest(&self) -> Option<&PackageSearchMetadata> {
        self.major
            .as_ref()
            .or(self.minor.as_ref())
            .or(self.patch.as_ref())
            .or(self.exact.as_ref())
    }
}
