//! Per-repository update pipeline
//!
//! Discovery, ordering, selection, then one branch/commit/PR cycle per
//! group. The working copy is always returned to the default branch, even
//! when a group fails.

use super::branch::BranchNamer;
use super::commit_filter::ExistingCommitFilter;
use super::consolidator::consolidate;
use crate::domain::{PackageUpdateSet, RepositoryData};
use crate::error::{EngineError, GitError};
use crate::finder::UpdateFinder;
use crate::git::GitDriver;
use crate::message::CommitWorder;
use crate::platform::{CollaborationPlatform, PullRequestRequest};
use crate::scan::apply_update;
use crate::settings::UserSettings;
use crate::sort::{order_updates, sort_projects_for_build, UpdateSelection};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Applies a repository's updates as branches, commits and pull requests
pub struct PackageUpdater {
    finder: UpdateFinder,
    selection: UpdateSelection,
    collaboration: Arc<dyn CollaborationPlatform>,
    worder: Arc<dyn CommitWorder>,
    commit_filter: ExistingCommitFilter,
    namer: BranchNamer,
    settings: UserSettings,
}

impl PackageUpdater {
    /// Wire the pipeline from its collaborators and settings
    pub fn new(
        finder: UpdateFinder,
        collaboration: Arc<dyn CollaborationPlatform>,
        worder: Arc<dyn CommitWorder>,
        settings: UserSettings,
    ) -> Self {
        let selection = UpdateSelection::new(settings.minimum_age, settings.max_package_updates);
        let commit_filter = ExistingCommitFilter::new(worder.clone());
        let namer = BranchNamer::new(settings.branch_name_template.clone());
        Self {
            finder,
            selection,
            collaboration,
            worder,
            commit_filter,
            namer,
            settings,
        }
    }

    /// Run the pipeline on one checked-out repository
    ///
    /// Returns the number of updates committed in this run.
    pub async fn apply_updates(
        &self,
        git: &dyn GitDriver,
        repo: &RepositoryData,
    ) -> Result<usize, EngineError> {
        let updates = self
            .finder
            .find_package_updates(
                git.workdir(),
                self.settings.allowed_change,
                &self.settings.sources,
            )
            .await?;

        let now = Utc::now();
        let ordered = order_updates(updates, now);
        let selected = self.selection.select(ordered, now);
        if selected.is_empty() {
            info!("no updates to apply to {}", repo.pull);
            return Ok(0);
        }

        let mut applied = 0;
        for group in consolidate(selected, self.settings.consolidate) {
            let open = self
                .collaboration
                .get_open_pull_request_count(&repo.pull)
                .await?;
            if open >= self.settings.max_open_pull_requests {
                info!(
                    "{} has {} open pull requests, at the limit of {}; leaving remaining updates",
                    repo.pull, open, self.settings.max_open_pull_requests
                );
                break;
            }

            let result = self.process_group(git, repo, &group).await;
            if let Err(e) = git.checkout(&repo.default_branch) {
                warn!(
                    "could not return {} to branch {}: {}",
                    repo.pull, repo.default_branch, e
                );
            }
            applied += result?;
        }

        Ok(applied)
    }

    /// One branch/commit/PR cycle
    async fn process_group(
        &self,
        git: &dyn GitDriver,
        repo: &RepositoryData,
        group: &[PackageUpdateSet],
    ) -> Result<usize, EngineError> {
        git.checkout(&repo.default_branch)?;

        let branch = self.namer.name(group);
        let created = git.checkout_new_branch(&branch)?;
        if !created {
            info!("resuming existing branch {}", branch);
            match git.checkout_remote_to_local(&branch) {
                Ok(()) => {}
                // Branch exists locally only
                Err(GitError::BranchNotFound { .. }) => git.checkout(&branch)?,
                Err(e) => return Err(e.into()),
            }
        }

        let surviving =
            self.commit_filter
                .filter(git, &repo.default_branch, &branch, group.to_vec());
        if surviving.is_empty() {
            info!("everything on {} is already committed", branch);
            return Ok(0);
        }

        for update in &surviving {
            self.apply_one(git, update)?;
        }

        git.push("origin", &branch)?;

        let head = repo.qualified_head(&branch);
        let exists = self
            .collaboration
            .pull_request_exists(&repo.pull, &head, &repo.default_branch)
            .await?;
        if exists {
            info!(
                "pull request from {} into {} already exists on {}",
                head, repo.default_branch, repo.pull
            );
            return Ok(surviving.len());
        }

        let request = PullRequestRequest {
            title: self.worder.pr_title(group),
            body: self.worder.pr_body(group),
            head,
            base: repo.default_branch.clone(),
            delete_branch_after_merge: self.settings.delete_branch_after_merge,
        };
        self.collaboration
            .open_pull_request(&repo.pull, &request, &self.settings.labels)
            .await?;

        Ok(surviving.len())
    }

    /// Edit every usage of one update in build order, then commit once
    fn apply_one(&self, git: &dyn GitDriver, update: &PackageUpdateSet) -> Result<(), EngineError> {
        let usages = sort_projects_for_build(update.current_packages().to_vec());
        for usage in &usages {
            apply_update(usage, update.selected_version())?;
        }
        git.commit(&self.worder.commit_message(update))?;
        info!(
            "updated {} to {} in {} file{}",
            update.id(),
            update.selected_version(),
            usages.len(),
            if usages.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }
}
