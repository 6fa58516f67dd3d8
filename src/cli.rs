//! CLI argument parsing module for prbump

use crate::domain::VersionChange;
use crate::error::ConfigError;
use crate::platform::{PlatformKind, RepositoryTarget};
use crate::settings::{self, AuthSettings, SettingsFile, UserSettings, TOKEN_ENV_VAR};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Parse duration string in format: Nd (days), Nw (weeks), Nm (months)
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, unit) = if let Some(n) = s.strip_suffix('d') {
        (n, 'd')
    } else if let Some(n) = s.strip_suffix('w') {
        (n, 'w')
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 'm')
    } else {
        return Err(format!("invalid duration format: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", num_str))?;

    let seconds = match unit {
        'd' => num * 24 * 60 * 60,      // days
        'w' => num * 7 * 24 * 60 * 60,  // weeks
        'm' => num * 30 * 24 * 60 * 60, // months (30 days)
        _ => unreachable!(),
    };

    Ok(Duration::from_secs(seconds))
}

/// Automated dependency update pull requests
#[derive(Parser, Debug, Clone)]
#[command(name = "prbump", version, about = "Automated dependency update pull requests")]
pub struct CliArgs {
    // Target
    /// Repository to update, in owner/name form
    #[arg(long, conflicts_with = "organization")]
    pub repository: Option<String>,

    /// Update every non-archived repository of an organization
    #[arg(long)]
    pub organization: Option<String>,

    // Platform
    /// Hosting platform (github, gitlab, bitbucket, azuredevops, gitea)
    #[arg(long, default_value = "github", value_parser = PlatformKind::from_str)]
    pub platform: PlatformKind,

    /// API token (falls back to the PRBUMP_TOKEN environment variable)
    #[arg(long)]
    pub token: Option<String>,

    /// Platform API root, for self-hosted instances
    #[arg(long)]
    pub api_base: Option<String>,

    // Update policy
    /// Only apply versions released at least this long ago (e.g., 2w, 10d, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub age: Option<Duration>,

    /// Largest allowed version jump (none, patch, minor, major)
    #[arg(long, value_parser = VersionChange::from_str)]
    pub change: Option<VersionChange>,

    /// Maximum updates applied per repository
    #[arg(long)]
    pub max_package_updates: Option<usize>,

    /// Skip a repository once it has this many open pull requests
    #[arg(long)]
    pub max_open_pull_requests: Option<usize>,

    /// Stop after this many repositories received an update
    #[arg(long)]
    pub max_repositories_changed: Option<usize>,

    /// Put all updates on one branch and pull request per repository
    #[arg(long)]
    pub consolidate: bool,

    // Package filters
    /// Update only packages matching this regex
    #[arg(long)]
    pub include: Option<String>,

    /// Never update packages matching this regex
    #[arg(long)]
    pub exclude: Option<String>,

    // Feeds
    /// Package feed to look versions up in (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub source: Vec<String>,

    // Pull request shape
    /// Label applied to opened pull requests (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub label: Vec<String>,

    /// Branch name template with a {default} placeholder
    #[arg(long)]
    pub branch_name_template: Option<String>,

    /// Ask the platform to delete the branch once the PR merges
    #[arg(long)]
    pub delete_branch_after_merge: bool,

    // Files
    /// Settings file
    #[arg(long, default_value = "prbump.toml")]
    pub config: PathBuf,

    /// Directory working copies are cloned into
    #[arg(long, default_value = ".prbump")]
    pub workspace: PathBuf,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,
}

impl CliArgs {
    /// What the run operates on
    pub fn target(&self) -> Result<RepositoryTarget, ConfigError> {
        if let Some(repository) = &self.repository {
            let (owner, name) =
                repository
                    .split_once('/')
                    .ok_or_else(|| ConfigError::InvalidSetting {
                        name: "repository",
                        message: format!("expected owner/name, got '{}'", repository),
                    })?;
            if owner.is_empty() || name.is_empty() || name.contains('/') {
                return Err(ConfigError::InvalidSetting {
                    name: "repository",
                    message: format!("expected owner/name, got '{}'", repository),
                });
            }
            return Ok(RepositoryTarget::Repository {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        if let Some(organization) = &self.organization {
            return Ok(RepositoryTarget::Organization {
                name: organization.clone(),
            });
        }
        Err(ConfigError::InvalidSetting {
            name: "repository",
            message: "one of --repository or --organization is required".to_string(),
        })
    }

    /// Platform and credentials: the flag wins over the settings file,
    /// and the token falls back to the environment
    pub fn auth(&self, file: &SettingsFile) -> AuthSettings {
        let token = self
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok());
        AuthSettings {
            platform: self.platform,
            token,
            api_base: self.api_base.clone().or_else(|| file.api_base.clone()),
        }
    }

    /// Final run settings: defaults, then the settings file, then flags
    pub fn settings(&self, file: &SettingsFile) -> Result<UserSettings, ConfigError> {
        let mut merged = UserSettings::default();
        file.apply_to(&mut merged)?;

        if let Some(age) = self.age {
            merged.minimum_age = settings::to_chrono(age)?;
        }
        if let Some(change) = self.change {
            merged.allowed_change = change;
        }
        if let Some(n) = self.max_package_updates {
            merged.max_package_updates = n;
        }
        if let Some(n) = self.max_open_pull_requests {
            merged.max_open_pull_requests = n;
        }
        if let Some(n) = self.max_repositories_changed {
            merged.max_repositories_changed = n;
        }
        if self.consolidate {
            merged.consolidate = true;
        }
        if let Some(include) = &self.include {
            merged.include = Some(include.clone());
        }
        if let Some(exclude) = &self.exclude {
            merged.exclude = Some(exclude.clone());
        }
        if !self.source.is_empty() {
            merged.sources = self
                .source
                .iter()
                .map(crate::domain::PackageSource::new)
                .collect();
        }
        if !self.label.is_empty() {
            merged.labels = self.label.clone();
        }
        if let Some(template) = &self.branch_name_template {
            merged.branch_name_template = Some(template.clone());
        }
        if self.delete_branch_after_merge {
            merged.delete_branch_after_merge = true;
        }

        Ok(merged)
    }
}
