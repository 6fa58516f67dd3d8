//! Repository targets for the pull/push workflow

use serde::{Deserialize, Serialize};
use std::fmt;

/// A remote repository on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    /// Owning user or organization
    pub owner: String,
    /// Repository name
    pub name: String,
    /// URL to clone/push over
    pub clone_url: String,
}

impl RemoteRepository {
    /// Create a new remote repository reference
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        clone_url: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            clone_url: clone_url.into(),
        }
    }

    /// `owner/name` form
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RemoteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Pull target, push target and default branch for one repository
///
/// In a fork workflow the push target differs from the pull target: commits
/// are pushed to the fork while the pull request is opened against the
/// upstream repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryData {
    /// Where pull requests are opened
    pub pull: RemoteRepository,
    /// Where branches are pushed
    pub push: RemoteRepository,
    /// Default branch of the pull target
    pub default_branch: String,
}

impl RepositoryData {
    /// Create repository data
    pub fn new(pull: RemoteRepository, push: RemoteRepository, default_branch: impl Into<String>) -> Self {
        Self {
            pull,
            push,
            default_branch: default_branch.into(),
        }
    }

    /// True if pushes go to a fork rather than the pull target
    pub fn is_fork(&self) -> bool {
        self.pull.owner != self.push.owner || self.pull.name != self.push.name
    }

    /// Head reference as the platform expects it in a pull request:
    /// `owner:branch` when pushing to a fork, plain branch name otherwise
    pub fn qualified_head(&self, branch: &str) -> String {
        if self.is_fork() {
            format!("{}:{}", self.push.owner, branch)
        } else {
            branch.to_string()
        }
    }
}
