//! Multi-repository orchestration
//!
//! This module provides:
//! - The run loop over discovered repositories with per-repository fault
//!   isolation and the changed-repositories stop condition
//! - The per-repository update pipeline
//! - Branch naming, idempotent-commit filtering and update consolidation

mod branch;
mod commit_filter;
mod consolidator;
mod updater;

pub use branch::{BranchNamer, ContentHasher, Fnv1a64};
pub use commit_filter::ExistingCommitFilter;
pub use consolidator::consolidate;
pub use updater::PackageUpdater;

use crate::domain::RepositoryData;
use crate::error::{EngineError, RepositoryFailure};
use crate::finder::UpdateFinder;
use crate::git::LibGit2Driver;
use crate::platform::{PlatformBundle, PlatformUser, RepositoryTarget};
use crate::settings::UserSettings;
use std::path::PathBuf;
use tracing::{error, info};

/// What a completed run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineReport {
    /// Repositories that received at least one update
    pub repositories_changed: usize,
    /// Updates committed across all repositories
    pub updates_made: usize,
}

/// Drives the update workflow across every discovered repository
pub struct CollaborationEngine {
    bundle: PlatformBundle,
    updater: PackageUpdater,
    settings: UserSettings,
    token: Option<String>,
    workspace: PathBuf,
}

impl CollaborationEngine {
    /// Wire an engine from a platform bundle and the discovery pipeline
    pub fn new(
        bundle: PlatformBundle,
        finder: UpdateFinder,
        settings: UserSettings,
        token: Option<String>,
        workspace: PathBuf,
    ) -> Self {
        let updater = PackageUpdater::new(
            finder,
            bundle.collaboration.clone(),
            bundle.worder.clone(),
            settings.clone(),
        );
        Self {
            bundle,
            updater,
            settings,
            token,
            workspace,
        }
    }

    /// Run the full workflow against a target
    ///
    /// Repositories are processed strictly in sequence. A failing repository
    /// is logged and recorded, and the loop moves on; the recorded failures
    /// surface as one error after every repository was attempted. The
    /// credential check up front is the only fatal failure.
    pub async fn run(&self, target: &RepositoryTarget) -> Result<EngineReport, EngineError> {
        let user = self
            .bundle
            .collaboration
            .get_current_user()
            .await
            .map_err(EngineError::Credentials)?;
        info!("authenticated as {}", user.login);

        let repositories = self.bundle.discovery.get_repositories(target).await?;
        info!("running on {} repositories", repositories.len());

        let mut changed = 0;
        let mut updates_made = 0;
        let mut failures: Vec<RepositoryFailure> = Vec::new();

        for repo in &repositories {
            if changed >= self.settings.max_repositories_changed {
                info!(
                    "{} repositories changed, at the limit; stopping",
                    changed
                );
                break;
            }

            match self.run_repository(&user, repo).await {
                Ok(applied) => {
                    updates_made += applied;
                    if applied > 0 {
                        changed += 1;
                    }
                }
                Err(e) => {
                    error!("repository {} failed: {}", repo.pull, e);
                    failures.push(RepositoryFailure {
                        repository: repo.pull.full_name(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "run finished: {} updates across {} repositories, {} failures",
            updates_made,
            changed,
            failures.len()
        );

        if failures.is_empty() {
            Ok(EngineReport {
                repositories_changed: changed,
                updates_made,
            })
        } else {
            Err(EngineError::RepositoriesFailed {
                updates_made,
                failures,
            })
        }
    }

    async fn run_repository(
        &self,
        user: &PlatformUser,
        repo: &RepositoryData,
    ) -> Result<usize, EngineError> {
        let push = self.bundle.fork_finder.push_target(user, &repo.pull).await?;
        let repo = RepositoryData::new(repo.pull.clone(), push, repo.default_branch.clone());

        let path = self.workspace.join(&repo.pull.owner).join(&repo.pull.name);
        let git = LibGit2Driver::clone_or_open(&repo.push.clone_url, &path, self.token.clone())?;

        self.updater.apply_updates(&git, &repo).await
    }
}
