//! Collaboration platform abstraction
//!
//! This module provides:
//! - The platform trait set (collaboration API, repository discovery, fork
//!   lookup) the engine works against
//! - A registry mapping a platform identifier to its capability bundle
//!
//! One real bundle ships: GitHub. The other identifiers are registry slots;
//! selecting one without a registered bundle is a fatal configuration error.

mod github;

pub use github::{GitHubDiscovery, GitHubPlatform, GITHUB_API_BASE};

use crate::domain::{RemoteRepository, RepositoryData};
use crate::error::{ConfigError, PlatformError};
use crate::message::{CommitWorder, DefaultCommitWorder};
use crate::settings::AuthSettings;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The authenticated platform user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformUser {
    /// Login name
    pub login: String,
}

/// The fields of a pull request to open
#[derive(Debug, Clone)]
pub struct PullRequestRequest {
    /// PR title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Head ref, qualified with the owner when pushed to a fork
    pub head: String,
    /// Base branch on the pull target
    pub base: String,
    /// Whether the platform should delete the branch after merge
    pub delete_branch_after_merge: bool,
}

/// What a run operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryTarget {
    /// A single repository
    Repository { owner: String, name: String },
    /// Every accessible, non-archived repository of an organization
    Organization { name: String },
}

/// The hosting platform's pull request API, as the engine needs it
#[async_trait]
pub trait CollaborationPlatform: Send + Sync {
    /// Resolve the user the token authenticates as
    async fn get_current_user(&self) -> Result<PlatformUser, PlatformError>;

    /// Number of currently open pull requests on the repository
    async fn get_open_pull_request_count(
        &self,
        target: &RemoteRepository,
    ) -> Result<usize, PlatformError>;

    /// True if an open pull request from `head` into `base` already exists
    async fn pull_request_exists(
        &self,
        target: &RemoteRepository,
        head: &str,
        base: &str,
    ) -> Result<bool, PlatformError>;

    /// Open a pull request, applying the given labels
    async fn open_pull_request(
        &self,
        target: &RemoteRepository,
        request: &PullRequestRequest,
        labels: &[String],
    ) -> Result<(), PlatformError>;
}

/// Resolves the repositories a run iterates over
#[async_trait]
pub trait RepositoryDiscovery: Send + Sync {
    /// List the repositories for the given target
    async fn get_repositories(
        &self,
        target: &RepositoryTarget,
    ) -> Result<Vec<RepositoryData>, PlatformError>;
}

/// Resolves where commits are pushed for a pull target
#[async_trait]
pub trait ForkFinder: Send + Sync {
    /// The repository to push branches to
    async fn push_target(
        &self,
        user: &PlatformUser,
        pull: &RemoteRepository,
    ) -> Result<RemoteRepository, PlatformError>;
}

/// Pushes directly to a branch on the pull target
pub struct SameRepositoryForkFinder;

#[async_trait]
impl ForkFinder for SameRepositoryForkFinder {
    async fn push_target(
        &self,
        _user: &PlatformUser,
        pull: &RemoteRepository,
    ) -> Result<RemoteRepository, PlatformError> {
        Ok(pull.clone())
    }
}

/// Known platform identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    GitHub,
    GitLab,
    Bitbucket,
    AzureDevOps,
    Gitea,
}

impl FromStr for PlatformKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(PlatformKind::GitHub),
            "gitlab" => Ok(PlatformKind::GitLab),
            "bitbucket" => Ok(PlatformKind::Bitbucket),
            "azuredevops" | "azure-devops" => Ok(PlatformKind::AzureDevOps),
            "gitea" => Ok(PlatformKind::Gitea),
            other => Err(ConfigError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformKind::GitHub => "github",
            PlatformKind::GitLab => "gitlab",
            PlatformKind::Bitbucket => "bitbucket",
            PlatformKind::AzureDevOps => "azuredevops",
            PlatformKind::Gitea => "gitea",
        };
        write!(f, "{}", name)
    }
}

/// Everything the engine needs from one platform
pub struct PlatformBundle {
    /// Pull request API
    pub collaboration: Arc<dyn CollaborationPlatform>,
    /// Repository listing
    pub discovery: Arc<dyn RepositoryDiscovery>,
    /// Push target resolution
    pub fork_finder: Arc<dyn ForkFinder>,
    /// Commit and PR wording
    pub worder: Arc<dyn CommitWorder>,
}

impl std::fmt::Debug for PlatformBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformBundle").finish_non_exhaustive()
    }
}

type BundleFactory = fn(&AuthSettings) -> Result<PlatformBundle, ConfigError>;

/// Maps platform identifiers to capability bundle factories
pub struct PlatformRegistry {
    factories: HashMap<PlatformKind, BundleFactory>,
}

impl PlatformRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a bundle factory for a platform
    pub fn register(&mut self, kind: PlatformKind, factory: BundleFactory) {
        self.factories.insert(kind, factory);
    }

    /// Build the bundle for a platform, or fail if none is registered
    pub fn create(
        &self,
        kind: PlatformKind,
        auth: &AuthSettings,
    ) -> Result<PlatformBundle, ConfigError> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| ConfigError::UnsupportedPlatform {
                platform: kind.to_string(),
            })?;
        factory(auth)
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(PlatformKind::GitHub, github_bundle);
        registry
    }
}

fn github_bundle(auth: &AuthSettings) -> Result<PlatformBundle, ConfigError> {
    let token = auth
        .token
        .as_deref()
        .ok_or_else(|| ConfigError::MissingCredentials {
            platform: PlatformKind::GitHub.to_string(),
        })?;
    let api_base = auth.api_base.as_deref().unwrap_or(GITHUB_API_BASE);

    let platform =
        GitHubPlatform::new(api_base, token).map_err(|e| ConfigError::InvalidSetting {
            name: "api_base",
            message: e.to_string(),
        })?;
    let discovery = GitHubDiscovery::new(platform.clone());

    Ok(PlatformBundle {
        collaboration: Arc::new(platform),
        discovery: Arc::new(discovery),
        fork_finder: Arc::new(SameRepositoryForkFinder),
        worder: Arc::new(DefaultCommitWorder),
    })
}
