//! Local git operations behind a trait
//!
//! This module provides:
//! - The `GitDriver` trait the updater works against
//! - A libgit2 implementation handling clone/open, branches, commits, push
//!   and commit-message history

mod libgit2;

pub use libgit2::LibGit2Driver;

use crate::error::GitError;
use std::path::Path;

/// The git operations one repository pipeline needs
pub trait GitDriver: Send {
    /// Root of the working directory
    fn workdir(&self) -> &Path;

    /// Check out an existing local branch
    fn checkout(&self, branch: &str) -> Result<(), GitError>;

    /// Create and check out a new branch at HEAD
    ///
    /// Returns false without switching when the branch already exists
    /// locally or on the remote; the caller resumes it instead.
    fn checkout_new_branch(&self, branch: &str) -> Result<bool, GitError>;

    /// Create a local branch tracking the remote branch of the same name
    /// and check it out
    fn checkout_remote_to_local(&self, branch: &str) -> Result<(), GitError>;

    /// Stage everything and commit with the given message
    fn commit(&self, message: &str) -> Result<(), GitError>;

    /// Push a branch to the named remote
    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError>;

    /// Messages of commits reachable from `head` but not from `base`,
    /// newest first
    fn get_new_commit_messages(&self, base: &str, head: &str)
        -> Result<Vec<String>, GitError>;
}
