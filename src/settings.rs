//! Run settings
//!
//! Defaults, an optional `prbump.toml` file, and CLI flags, merged in that
//! order: the file overrides defaults, flags override the file.

use crate::domain::{PackageSource, VersionChange};
use crate::error::ConfigError;
use crate::platform::PlatformKind;
use chrono::Duration;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// The public NuGet v3 registration feed
pub const DEFAULT_SOURCE: &str = "https://api.nuget.org/v3/registration5-gz-semver2";

/// Token environment variable checked when no `--token` flag is given
pub const TOKEN_ENV_VAR: &str = "PRBUMP_TOKEN";

/// How the run behaves, independent of any platform
#[derive(Debug, Clone)]
pub struct UserSettings {
    /// Candidates younger than this are skipped
    pub minimum_age: Duration,
    /// At most this many updates are applied per repository
    pub max_package_updates: usize,
    /// Stop opening PRs on a repository once it has this many open
    pub max_open_pull_requests: usize,
    /// Stop the run after this many repositories received an update
    pub max_repositories_changed: usize,
    /// Put all of a repository's updates on one branch and PR
    pub consolidate: bool,
    /// Highest version-change tier to select
    pub allowed_change: VersionChange,
    /// Branch name template with a `{default}` placeholder
    pub branch_name_template: Option<String>,
    /// Ask the platform to delete the branch once the PR merges
    pub delete_branch_after_merge: bool,
    /// Only packages matching this pattern are updated
    pub include: Option<String>,
    /// Packages matching this pattern are never updated
    pub exclude: Option<String>,
    /// Package feeds to look versions up in
    pub sources: Vec<PackageSource>,
    /// Labels applied to each opened PR
    pub labels: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            minimum_age: Duration::days(7),
            max_package_updates: 3,
            max_open_pull_requests: 1,
            max_repositories_changed: 10,
            consolidate: false,
            allowed_change: VersionChange::Major,
            branch_name_template: None,
            delete_branch_after_merge: false,
            include: None,
            exclude: None,
            sources: vec![PackageSource::new(DEFAULT_SOURCE)],
            labels: Vec::new(),
        }
    }
}

/// Which platform to talk to and how to authenticate
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Hosting platform
    pub platform: PlatformKind,
    /// API token
    pub token: Option<String>,
    /// API root override, for self-hosted instances
    pub api_base: Option<String>,
}

/// On-disk settings file, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub minimum_age: Option<String>,
    pub max_package_updates: Option<usize>,
    pub max_open_pull_requests: Option<usize>,
    pub max_repositories_changed: Option<usize>,
    pub consolidate: Option<bool>,
    pub allowed_change: Option<String>,
    pub branch_name_template: Option<String>,
    pub delete_branch_after_merge: Option<bool>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub sources: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
    pub api_base: Option<String>,
}

impl SettingsFile {
    /// Load the file if it exists; a missing file is an empty overlay
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("no settings file at {}", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::SettingsFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay the file's values onto the given settings
    pub fn apply_to(&self, settings: &mut UserSettings) -> Result<(), ConfigError> {
        if let Some(age) = &self.minimum_age {
            let std_duration =
                crate::cli::parse_duration(age).map_err(|message| ConfigError::InvalidSetting {
                    name: "minimum_age",
                    message,
                })?;
            settings.minimum_age = to_chrono(std_duration)?;
        }
        if let Some(n) = self.max_package_updates {
            settings.max_package_updates = n;
        }
        if let Some(n) = self.max_open_pull_requests {
            settings.max_open_pull_requests = n;
        }
        if let Some(n) = self.max_repositories_changed {
            settings.max_repositories_changed = n;
        }
        if let Some(consolidate) = self.consolidate {
            settings.consolidate = consolidate;
        }
        if let Some(change) = &self.allowed_change {
            settings.allowed_change =
                change.parse().map_err(|message| ConfigError::InvalidSetting {
                    name: "allowed_change",
                    message,
                })?;
        }
        if let Some(template) = &self.branch_name_template {
            settings.branch_name_template = Some(template.clone());
        }
        if let Some(delete) = self.delete_branch_after_merge {
            settings.delete_branch_after_merge = delete;
        }
        if let Some(include) = &self.include {
            settings.include = Some(include.clone());
        }
        if let Some(exclude) = &self.exclude {
            settings.exclude = Some(exclude.clone());
        }
        if let Some(sources) = &self.sources {
            settings.sources = sources.iter().map(PackageSource::new).collect();
        }
        if let Some(labels) = &self.labels {
            settings.labels = labels.clone();
        }
        Ok(())
    }
}

/// Convert a parsed std duration to the chrono form the age filter uses
pub fn to_chrono(duration: std::time::Duration) -> Result<Duration, ConfigError> {
    Duration::from_std(duration).map_err(|e| ConfigError::InvalidSetting {
        name: "minimum_age",
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = UserSettings::default();
        assert_eq!(settings.minimum_age, Duration::days(7));
        assert_eq!(settings.max_package_updates, 3);
        assert_eq!(settings.max_open_pull_requests, 1);
        assert_eq!(settings.max_repositories_changed, 10);
        assert!(!settings.consolidate);
        assert_eq!(settings.allowed_change, VersionChange::Major);
        assert_eq!(settings.sources, vec![PackageSource::new(DEFAULT_SOURCE)]);
    }

    #[test]
    fn test_missing_file_is_empty_overlay() {
        let file = SettingsFile::load(Path::new("/no/such/prbump.toml")).unwrap();
        let mut settings = UserSettings::default();
        file.apply_to(&mut settings).unwrap();
        assert_eq!(settings.max_package_updates, 3);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
minimum_age = "14d"
max_package_updates = 5
consolidate = true
allowed_change = "minor"
sources = ["https://feed.test/v3"]
labels = ["dependencies"]
"#
        )
        .unwrap();

        let overlay = SettingsFile::load(file.path()).unwrap();
        let mut settings = UserSettings::default();
        overlay.apply_to(&mut settings).unwrap();

        assert_eq!(settings.minimum_age, Duration::days(14));
        assert_eq!(settings.max_package_updates, 5);
        assert!(settings.consolidate);
        assert_eq!(settings.allowed_change, VersionChange::Minor);
        assert_eq!(settings.sources, vec![PackageSource::new("https://feed.test/v3")]);
        assert_eq!(settings.labels, vec!["dependencies".to_string()]);
        // Untouched fields keep their defaults
        assert_eq!(settings.max_open_pull_requests, 1);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_packag_updates = 5").unwrap();
        let err = SettingsFile::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::SettingsFile { .. }));
    }

    #[test]
    fn test_bad_allowed_change_is_rejected() {
        let overlay = SettingsFile {
            allowed_change: Some("gigantic".to_string()),
            ..SettingsFile::default()
        };
        let mut settings = UserSettings::default();
        let err = overlay.apply_to(&mut settings).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                name: "allowed_change",
                ..
            }
        ));
    }
}
