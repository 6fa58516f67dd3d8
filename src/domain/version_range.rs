//! Declared version ranges and their single-version projection
//!
//! Project files may declare either a pinned version (`1.2.3`, `[1.2.3]`)
//! or a floating/bounded range (`1.2.*`, `[1.0,2.0)`). Only declarations
//! that collapse to exactly one version are update candidates; everything
//! else is excluded from candidacy by the scanner.

use super::PackageId;
use semver::Version;
use std::fmt;

/// A package id plus the version expression as written in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersionRange {
    /// Package identifier
    pub id: PackageId,
    /// The raw version expression
    pub raw: String,
    single: Option<Version>,
}

impl PackageVersionRange {
    /// Parse a declared version expression
    ///
    /// Always succeeds; expressions that do not denote exactly one version
    /// simply have no single-version projection.
    pub fn parse(id: impl Into<PackageId>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let single = parse_single_version(&raw);
        Self {
            id: id.into(),
            raw,
            single,
        }
    }

    /// The exact version this range denotes, when it denotes exactly one
    pub fn single_version(&self) -> Option<&Version> {
        self.single.as_ref()
    }
}

impl fmt::Display for PackageVersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.raw)
    }
}

/// Extract the single version denoted by a version expression, if any
///
/// Recognized single-version forms:
/// - a plain version: `1.2.3`, `1.2`, `1.2.3-beta1`
/// - an exact bracket range: `[1.2.3]`
///
/// Wildcards (`1.2.*`), open brackets and multi-bound ranges (`[1.0,2.0)`)
/// have no single version.
fn parse_single_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('*') {
        return None;
    }

    // Exact bracket form: [1.2.3] with no second bound
    let inner = if let Some(stripped) = raw.strip_prefix('[') {
        let stripped = stripped.strip_suffix(']')?;
        if stripped.contains(',') {
            return None;
        }
        stripped.trim()
    } else if raw.starts_with('(') || raw.contains(',') {
        return None;
    } else {
        raw
    };

    parse_lenient(inner)
}

/// Parse a version string, tolerating two-part (`1.2`) and four-part
/// (`1.2.3.4`) forms by normalizing to three numeric components
fn parse_lenient(text: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(text) {
        return Some(v);
    }

    let (numbers, suffix) = match text.find(['-', '+']) {
        Some(idx) => (&text[..idx], &text[idx..]),
        None => (text, ""),
    };

    let parts: Vec<&str> = numbers.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0{}", parts[0], suffix),
        2 => format!("{}.{}.0{}", parts[0], parts[1], suffix),
        4 => format!("{}.{}.{}{}", parts[0], parts[1], parts[2], suffix),
        _ => return None,
    };

    Version::parse(&normalized).ok()
}
