//! Repository scanning for package references
//!
//! This module provides:
//! - The `PackageScanner` trait consumed by update discovery
//! - A regex-based scanner for MSBuild-style project files
//!   (`<PackageReference>` in .csproj/.props/.targets) and packages.config
//! - Project-reference extraction for build-order edges

mod editor;

pub use editor::apply_update;

use crate::domain::{
    PackageInProject, PackageLocation, PackageVersionRange, ReferenceFormat,
};
use crate::error::ScanError;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static PACKAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<PackageReference\s+(?:Include|Update)="([^"]+)"\s+Version="([^"]+)""#).unwrap()
});

static PACKAGES_CONFIG_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<package\s+id="([^"]+)"\s+version="([^"]+)""#).unwrap());

static PROJECT_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<ProjectReference\s+Include="([^"]+)""#).unwrap());

/// Directories that never contain project files worth scanning
const SKIPPED_DIRS: &[&str] = &[".git", "bin", "obj", "packages", "node_modules"];

/// Finds every package reference under a folder
pub trait PackageScanner: Send + Sync {
    /// Scan a working copy and return one entry per package occurrence
    fn find_all_packages(&self, folder: &Path) -> Result<Vec<PackageInProject>, ScanError>;
}

/// Regex-based scanner over MSBuild project files and packages.config
#[derive(Debug, Default)]
pub struct ProjectFileScanner;

impl ProjectFileScanner {
    /// Create a scanner
    pub fn new() -> Self {
        Self
    }
}

impl PackageScanner for ProjectFileScanner {
    fn find_all_packages(&self, folder: &Path) -> Result<Vec<PackageInProject>, ScanError> {
        let mut files = Vec::new();
        collect_files(folder, folder, &mut files)?;
        files.sort();

        let mut packages = Vec::new();
        for relative in files {
            let Some(format) = reference_format(&relative) else {
                continue;
            };
            let full_path = folder.join(&relative);
            let content = fs::read_to_string(&full_path).map_err(|e| ScanError::Read {
                path: full_path.clone(),
                source: e,
            })?;

            packages.extend(read_file(folder, &relative, format, &content));
        }

        debug!(
            "scanned {} and found {} package references",
            folder.display(),
            packages.len()
        );
        Ok(packages)
    }
}

/// Parse one file's package references
fn read_file(
    base_dir: &Path,
    relative: &Path,
    format: ReferenceFormat,
    content: &str,
) -> Vec<PackageInProject> {
    let pattern = match format {
        ReferenceFormat::PackagesConfig => &*PACKAGES_CONFIG_ENTRY,
        ReferenceFormat::ProjectFile | ReferenceFormat::DirectoryProps => &*PACKAGE_REFERENCE,
    };

    let project_references = if format == ReferenceFormat::ProjectFile {
        read_project_references(base_dir, relative, content)
    } else {
        Vec::new()
    };

    let mut found = Vec::new();
    for captures in pattern.captures_iter(content) {
        let id = &captures[1];
        let raw_version = &captures[2];
        let range = PackageVersionRange::parse(id, raw_version);

        match range.single_version() {
            Some(version) => {
                let location = PackageLocation::new(base_dir, relative, format);
                found.push(
                    PackageInProject::new(id, version.clone(), location)
                        .with_project_references(project_references.clone()),
                );
            }
            None => {
                // Floating and bounded ranges are excluded from update candidacy
                warn!(
                    "ignoring {} in {}: '{}' does not denote a single version",
                    id,
                    relative.display(),
                    raw_version
                );
            }
        }
    }
    found
}

/// Extract `<ProjectReference>` targets as absolute, normalized paths
fn read_project_references(base_dir: &Path, relative: &Path, content: &str) -> Vec<PathBuf> {
    let project_dir = base_dir
        .join(relative)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base_dir.to_path_buf());

    PROJECT_REFERENCE
        .captures_iter(content)
        .map(|c| {
            // Project files use Windows-style separators regardless of host
            let referenced = c[1].replace('\\', "/");
            normalize(&project_dir.join(referenced))
        })
        .collect()
}

/// Resolve `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Map a file name to its reference format, if it is scannable at all
fn reference_format(path: &Path) -> Option<ReferenceFormat> {
    let name = path.file_name()?.to_str()?;
    if name.eq_ignore_ascii_case("packages.config") {
        return Some(ReferenceFormat::PackagesConfig);
    }
    match path.extension()?.to_str()? {
        "csproj" | "fsproj" | "vbproj" => Some(ReferenceFormat::ProjectFile),
        "props" | "targets" => Some(ReferenceFormat::DirectoryProps),
        _ => None,
    }
}

/// Recursive walk collecting paths relative to the scan root
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ScanError> {
    let entries = fs::read_dir(dir).map_err(|e| ScanError::Walk {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        if path.is_dir() {
            let skip = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIPPED_DIRS.contains(&n));
            if !skip {
                collect_files(root, &path, out)?;
            }
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;
    use tempfile::TempDir;

    const APP_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Foo.Lib" Version="1.2.3" />
    <PackageReference Include="Bar" Version="2.0.*" />
    <ProjectReference Include="..\Lib\Lib.csproj" />
  </ItemGroup>
</Project>
"#;

    const PACKAGES_CONFIG: &str = r#"<?xml version="1.0"?>
<packages>
  <package id="Old.Thing" version="3.1.0" targetFramework="net48" />
</packages>
"#;

    fn write_fixture(dir: &TempDir) {
        let app = dir.path().join("App");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("App.csproj"), APP_PROJECT).unwrap();
        std::fs::write(dir.path().join("packages.config"), PACKAGES_CONFIG).unwrap();
    }

    #[test]
    fn test_scanner_finds_project_and_config_references() {
        let dir = TempDir::new().unwrap();
        write_fixture(&dir);

        let packages = ProjectFileScanner::new()
            .find_all_packages(dir.path())
            .unwrap();

        let ids: Vec<&str> = packages.iter().map(|p| p.id.as_str()).collect();
        assert!(ids.contains(&"Foo.Lib"));
        assert!(ids.contains(&"Old.Thing"));
        // the wildcard version is not a single version
        assert!(!ids.contains(&"Bar"));
    }

    #[test]
    fn test_scanner_resolves_project_references() {
        let dir = TempDir::new().unwrap();
        write_fixture(&dir);

        let packages = ProjectFileScanner::new()
            .find_all_packages(dir.path())
            .unwrap();
        let foo = packages.iter().find(|p| p.id.as_str() == "Foo.Lib").unwrap();

        assert_eq!(foo.version, Version::new(1, 2, 3));
        assert_eq!(
            foo.project_references,
            vec![dir.path().join("Lib/Lib.csproj")]
        );
        assert_eq!(foo.location.format, ReferenceFormat::ProjectFile);
    }

    #[test]
    fn test_scanner_skips_build_output_dirs() {
        let dir = TempDir::new().unwrap();
        let obj = dir.path().join("obj");
        std::fs::create_dir_all(&obj).unwrap();
        std::fs::write(obj.join("Cached.csproj"), APP_PROJECT).unwrap();

        let packages = ProjectFileScanner::new()
            .find_all_packages(dir.path())
            .unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_reference_format_mapping() {
        assert_eq!(
            reference_format(Path::new("a/b.csproj")),
            Some(ReferenceFormat::ProjectFile)
        );
        assert_eq!(
            reference_format(Path::new("Directory.Build.props")),
            Some(ReferenceFormat::DirectoryProps)
        );
        assert_eq!(
            reference_format(Path::new("packages.config")),
            Some(ReferenceFormat::PackagesConfig)
        );
        assert_eq!(reference_format(Path::new("readme.md")), None);
    }

    #[test]
    fn test_normalize_resolves_parent_components() {
        assert_eq!(
            normalize(Path::new("/repo/src/App/../Lib/Lib.csproj")),
            PathBuf::from("/repo/src/Lib/Lib.csproj")
        );
    }
}
