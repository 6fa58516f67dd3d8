//! Package identity and per-project occurrence types

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// A package identifier, compared case-insensitively
///
/// Package feeds treat `Newtonsoft.Json` and `newtonsoft.json` as the same
/// package, so equality and hashing normalize to ASCII lowercase while the
/// original casing is preserved for display and file edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Create a new package id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as originally written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used for feed URLs and grouping keys
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The syntax a package reference was found in
///
/// File-edit commands are dispatched on this tag, so every scanner output
/// must carry the format it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFormat {
    /// `<PackageReference Include=".." Version=".."/>` in a project file
    ProjectFile,
    /// `<package id=".." version=".."/>` in packages.config
    PackagesConfig,
    /// `<PackageReference ..>` in Directory.Build.props / .targets
    DirectoryProps,
}

impl fmt::Display for ReferenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceFormat::ProjectFile => "project file",
            ReferenceFormat::PackagesConfig => "packages.config",
            ReferenceFormat::DirectoryProps => "directory props",
        };
        write!(f, "{}", name)
    }
}

/// Where a package reference lives on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageLocation {
    /// Root of the scanned repository working copy
    pub base_dir: PathBuf,
    /// Path of the containing file, relative to `base_dir`
    pub relative_path: PathBuf,
    /// Reference syntax of the containing file
    pub format: ReferenceFormat,
}

impl PackageLocation {
    /// Create a new location
    pub fn new(
        base_dir: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        format: ReferenceFormat,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            relative_path: relative_path.into(),
            format,
        }
    }

    /// Absolute path of the containing file
    pub fn full_path(&self) -> PathBuf {
        self.base_dir.join(&self.relative_path)
    }
}

/// One occurrence of a package reference in one project/config file
///
/// Immutable once scanned; discarded after the discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInProject {
    /// Package identifier
    pub id: PackageId,
    /// The single resolved version this occurrence declares
    pub version: Version,
    /// File the reference was found in
    pub location: PackageLocation,
    /// Paths of projects referenced by the containing project, used to
    /// build project build-order edges
    pub project_references: Vec<PathBuf>,
}

impl PackageInProject {
    /// Create a new occurrence
    pub fn new(id: impl Into<PackageId>, version: Version, location: PackageLocation) -> Self {
        Self {
            id: id.into(),
            version,
            location,
            project_references: Vec::new(),
        }
    }

    /// Attach referenced-project paths (builder pattern)
    pub fn with_project_references(mut self, references: Vec<PathBuf>) -> Self {
        self.project_references = references;
        self
    }

    /// True if this occurrence's project references the given project file
    pub fn references_project(&self, other_full_path: &Path) -> bool {
        self.project_references
            .iter()
            .any(|r| r.as_path() == other_full_path)
    }
}

impl fmt::Display for PackageInProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} in {}",
            self.id,
            self.version,
            self.location.relative_path.display()
        )
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.0
    }
}
