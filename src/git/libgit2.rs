//! libgit2 implementation of the git driver

use super::GitDriver;
use crate::error::GitError;
use git2::build::RepoBuilder;
use git2::{BranchType, Cred, FetchOptions, PushOptions, RemoteCallbacks, Repository, Signature};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Committer identity when the repository config carries none
const FALLBACK_NAME: &str = "prbump";
const FALLBACK_EMAIL: &str = "prbump@localhost";

/// Git driver over libgit2
pub struct LibGit2Driver {
    repo: Repository,
    workdir: PathBuf,
    token: Option<String>,
}

impl std::fmt::Debug for LibGit2Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibGit2Driver")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

impl LibGit2Driver {
    /// Open an existing working copy
    pub fn open(path: &Path, token: Option<String>) -> Result<Self, GitError> {
        let repo = Repository::open(path)?;
        Self::from_repo(repo, token)
    }

    /// Clone a repository, or open it if the path already holds one
    pub fn clone_or_open(
        url: &str,
        path: &Path,
        token: Option<String>,
    ) -> Result<Self, GitError> {
        if path.join(".git").exists() {
            debug!("reusing existing clone at {}", path.display());
            return Self::open(path, token);
        }

        info!("cloning {} into {}", url, path.display());
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks(token.as_deref()));
        let repo = RepoBuilder::new().fetch_options(fetch).clone(url, path)?;
        Self::from_repo(repo, token)
    }

    fn from_repo(repo: Repository, token: Option<String>) -> Result<Self, GitError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::NoWorkdir {
                path: repo.path().to_path_buf(),
            })?
            .to_path_buf();
        Ok(Self {
            repo,
            workdir,
            token,
        })
    }

    fn signature(&self) -> Result<Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
        }
    }

    fn checkout_ref(&self, refname: &str) -> Result<(), GitError> {
        let (object, _) = self.repo.revparse_ext(refname)?;
        self.repo.checkout_tree(&object, None)?;
        self.repo.set_head(refname)?;
        Ok(())
    }

    fn branch_exists(&self, branch: &str, kind: BranchType) -> bool {
        let name = match kind {
            BranchType::Local => branch.to_string(),
            BranchType::Remote => format!("origin/{}", branch),
        };
        self.repo.find_branch(&name, kind).is_ok()
    }
}

fn callbacks(token: Option<&str>) -> RemoteCallbacks<'_> {
    let mut cb = RemoteCallbacks::new();
    if let Some(token) = token {
        let token = token.to_string();
        // Token-as-password convention for HTTPS remotes
        cb.credentials(move |_url, username, _allowed| {
            Cred::userpass_plaintext(username.unwrap_or("x-access-token"), &token)
        });
    }
    cb
}

impl GitDriver for LibGit2Driver {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn checkout(&self, branch: &str) -> Result<(), GitError> {
        if !self.branch_exists(branch, BranchType::Local) {
            return Err(GitError::BranchNotFound {
                branch: branch.to_string(),
            });
        }
        debug!("checkout {}", branch);
        self.checkout_ref(&format!("refs/heads/{}", branch))
    }

    fn checkout_new_branch(&self, branch: &str) -> Result<bool, GitError> {
        if self.branch_exists(branch, BranchType::Local)
            || self.branch_exists(branch, BranchType::Remote)
        {
            debug!("branch {} already exists", branch);
            return Ok(false);
        }

        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(branch, &head, false)?;
        self.checkout_ref(&format!("refs/heads/{}", branch))?;
        info!("created branch {}", branch);
        Ok(true)
    }

    fn checkout_remote_to_local(&self, branch: &str) -> Result<(), GitError> {
        let remote_name = format!("origin/{}", branch);
        let remote_branch = self
            .repo
            .find_branch(&remote_name, BranchType::Remote)
            .map_err(|_| GitError::BranchNotFound {
                branch: remote_name.clone(),
            })?;
        let commit = remote_branch.get().peel_to_commit()?;

        if !self.branch_exists(branch, BranchType::Local) {
            let mut local = self.repo.branch(branch, &commit, false)?;
            local.set_upstream(Some(&remote_name))?;
        }
        debug!("resuming remote branch {}", branch);
        self.checkout_ref(&format!("refs/heads/{}", branch))
    }

    fn commit(&self, message: &str) -> Result<(), GitError> {
        let sig = self.signature()?;
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        debug!("committed: {}", message);
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        let mut remote = self.repo.find_remote(remote)?;
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks(self.token.as_deref()));
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        remote.push(&[refspec.as_str()], Some(&mut options))?;
        info!("pushed {}", branch);
        Ok(())
    }

    fn get_new_commit_messages(
        &self,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, GitError> {
        let base_commit = self
            .repo
            .revparse_single(&format!("refs/heads/{}", base))
            .or_else(|_| self.repo.revparse_single(&format!("refs/remotes/origin/{}", base)))
            .map_err(|_| GitError::BranchNotFound {
                branch: base.to_string(),
            })?;
        let head_commit = self
            .repo
            .revparse_single(&format!("refs/heads/{}", head))
            .map_err(|_| GitError::BranchNotFound {
                branch: head.to_string(),
            })?;

        let mut walk = self.repo.revwalk()?;
        walk.push(head_commit.id())?;
        walk.hide(base_commit.id())?;

        let mut messages = Vec::new();
        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            messages.push(commit.message().unwrap_or_default().to_string());
        }
        Ok(messages)
    }
}
