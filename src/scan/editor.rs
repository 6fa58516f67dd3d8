//! File-edit commands, dispatched by reference format
//!
//! Rewrites the version of one package occurrence in place, preserving the
//! rest of the file byte for byte.

use crate::domain::{PackageInProject, ReferenceFormat};
use crate::error::EngineError;
use regex::Regex;
use semver::Version;
use std::fs;
use tracing::debug;

/// Apply a version update to one package occurrence on disk
pub fn apply_update(package: &PackageInProject, new_version: &Version) -> Result<(), EngineError> {
    let path = package.location.full_path();
    let content = fs::read_to_string(&path).map_err(|e| EngineError::Edit {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let pattern = version_pattern(package).map_err(|e| EngineError::Edit {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let replacement = format!("${{1}}{}${{2}}", new_version);
    let updated = pattern.replace_all(&content, replacement.as_str());

    if updated == content {
        return Err(EngineError::Edit {
            path,
            message: format!("no reference to {} found to update", package.id),
        });
    }

    debug!(
        "updating {} to {} in {}",
        package.id,
        new_version,
        path.display()
    );
    fs::write(&path, updated.as_bytes()).map_err(|e| EngineError::Edit {
        path,
        message: e.to_string(),
    })
}

/// Build the format-specific pattern matching this package's version text
fn version_pattern(package: &PackageInProject) -> Result<Regex, regex::Error> {
    let id = regex::escape(package.id.as_str());
    let pattern = match package.location.format {
        ReferenceFormat::ProjectFile | ReferenceFormat::DirectoryProps => format!(
            r#"(?i)(<PackageReference\s+(?:Include|Update)="{}"\s+Version=")[^"]+(")"#,
            id
        ),
        ReferenceFormat::PackagesConfig => {
            format!(r#"(?i)(<package\s+id="{}"\s+version=")[^"]+(")"#, id)
        }
    };
    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageLocation;
    use tempfile::TempDir;

    fn write_project(dir: &TempDir, name: &str, content: &str) -> PackageLocation {
        std::fs::write(dir.path().join(name), content).unwrap();
        let format = if name == "packages.config" {
            ReferenceFormat::PackagesConfig
        } else {
            ReferenceFormat::ProjectFile
        };
        PackageLocation::new(dir.path(), name, format)
    }

    #[test]
    fn test_updates_project_file_version_only() {
        let dir = TempDir::new().unwrap();
        let content = concat!(
            "<Project>\n",
            "  <PackageReference Include=\"Foo\" Version=\"1.0.0\" />\n",
            "  <PackageReference Include=\"Bar\" Version=\"1.0.0\" />\n",
            "</Project>\n"
        );
        let location = write_project(&dir, "App.csproj", content);
        let package = PackageInProject::new("Foo", Version::new(1, 0, 0), location);

        apply_update(&package, &Version::new(2, 1, 0)).unwrap();

        let updated = std::fs::read_to_string(dir.path().join("App.csproj")).unwrap();
        assert!(updated.contains(r#"<PackageReference Include="Foo" Version="2.1.0" />"#));
        assert!(updated.contains(r#"<PackageReference Include="Bar" Version="1.0.0" />"#));
    }

    #[test]
    fn test_updates_packages_config_entry() {
        let dir = TempDir::new().unwrap();
        let content = r#"<packages><package id="Foo" version="1.0.0" targetFramework="net48" /></packages>"#;
        let location = write_project(&dir, "packages.config", content);
        let package = PackageInProject::new("foo", Version::new(1, 0, 0), location);

        apply_update(&package, &Version::new(1, 5, 0)).unwrap();

        let updated = std::fs::read_to_string(dir.path().join("packages.config")).unwrap();
        assert!(updated.contains(r#"<package id="Foo" version="1.5.0""#));
    }

    #[test]
    fn test_missing_reference_is_an_error() {
        let dir = TempDir::new().unwrap();
        let location = write_project(&dir, "App.csproj", "<Project></Project>");
        let package = PackageInProject::new("Foo", Version::new(1, 0, 0), location);

        let err = apply_update(&package, &Version::new(2, 0, 0)).unwrap_err();
        assert!(matches!(err, EngineError::Edit { .. }));
    }

    #[test]
    fn test_dotted_package_id_is_escaped() {
        let dir = TempDir::new().unwrap();
        let content = concat!(
            "<Project>\n",
            "  <PackageReference Include=\"FooXLib\" Version=\"1.0.0\" />\n",
            "  <PackageReference Include=\"Foo.Lib\" Version=\"1.0.0\" />\n",
            "</Project>\n"
        );
        let location = write_project(&dir, "App.csproj", content);
        let package = PackageInProject::new("Foo.Lib", Version::new(1, 0, 0), location);

        apply_update(&package, &Version::new(3, 0, 0)).unwrap();

        let updated = std::fs::read_to_string(dir.path().join("App.csproj")).unwrap();
        assert!(updated.contains(r#"Include="FooXLib" Version="1.0.0""#));
        assert!(updated.contains(r#"Include="Foo.Lib" Version="3.0.0""#));
    }
}
