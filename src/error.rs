//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: fatal configuration problems (credentials, platform choice)
//! - ScanError: repository scanning failures
//! - LookupError: version source communication failures
//! - GitError: local git driver failures
//! - PlatformError: collaboration platform API failures
//! - UpdateSetError: update-set invariant violations
//! - EngineError: per-repository pipeline and end-of-run failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Orchestration engine errors
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Fatal configuration problems, surfaced before any repository work
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No credentials supplied for the selected platform
    #[error("no credentials for {platform}: set a token via --token or PRBUMP_TOKEN")]
    MissingCredentials { platform: String },

    /// Selected platform has no registered capability bundle
    #[error("platform '{platform}' is not supported")]
    UnsupportedPlatform { platform: String },

    /// An include/exclude pattern failed to compile
    #[error("invalid {which} pattern '{pattern}': {message}")]
    InvalidPattern {
        which: &'static str,
        pattern: String,
        message: String,
    },

    /// Settings file could not be read or parsed
    #[error("failed to load settings file {path}: {message}")]
    SettingsFile { path: PathBuf, message: String },

    /// A settings value is out of range or malformed
    #[error("invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },
}

/// Errors while scanning a working copy for package references
#[derive(Error, Debug)]
pub enum ScanError {
    /// Directory walk failed
    #[error("failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A project/config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors talking to a package version source
#[derive(Error, Debug)]
pub enum LookupError {
    /// Transport-level failure
    #[error("request to {source_name} for {package} failed: {message}")]
    Request {
        package: String,
        source_name: String,
        message: String,
    },

    /// The source answered with something unusable
    #[error("invalid response from {source_name} for {package}: {message}")]
    InvalidResponse {
        package: String,
        source_name: String,
        message: String,
    },

    /// A source client could not be constructed
    #[error("failed to create client for {source_name}: {message}")]
    ClientCreation {
        source_name: String,
        message: String,
    },
}

/// Errors from the local git driver
#[derive(Error, Debug)]
pub enum GitError {
    /// Underlying libgit2 failure
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// A named branch could not be resolved
    #[error("branch '{branch}' not found")]
    BranchNotFound { branch: String },

    /// The repository has no working directory (bare repo)
    #[error("repository at {path} has no working directory")]
    NoWorkdir { path: PathBuf },
}

/// Errors from the collaboration platform API
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Transport-level failure
    #[error("platform request failed: {0}")]
    Request(String),

    /// The platform rejected the request
    #[error("platform returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Authentication failed or the current user could not be resolved
    #[error("platform authentication failed: {0}")]
    Auth(String),
}

/// Violations of the update-set invariant
#[derive(Error, Debug)]
pub enum UpdateSetError {
    /// The lookup result has no candidate for the requested ceiling
    #[error("lookup result has no selected update")]
    NoSelectedUpdate,

    /// An update set must hold at least one current usage
    #[error("update set for {package} has no current usages")]
    NoCurrentUsages { package: String },

    /// Usages and lookup result must agree on the package id
    #[error("update set mixes package ids: expected {expected}, found {found}")]
    MismatchedPackageId { expected: String, found: String },
}

/// One repository's failure, recorded while the run loop continues
#[derive(Debug, Clone)]
pub struct RepositoryFailure {
    /// `owner/name` of the repository that failed
    pub repository: String,
    /// Rendered error
    pub message: String,
}

impl std::fmt::Display for RepositoryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.repository, self.message)
    }
}

/// Errors from the orchestration engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Platform credentials were rejected before any repository work
    #[error("credentials rejected: {0}")]
    Credentials(#[source] PlatformError),

    /// Platform API failure inside a repository pipeline
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Git failure inside a repository pipeline
    #[error(transparent)]
    Git(#[from] GitError),

    /// Scanner failure inside a repository pipeline
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Update-set construction failure
    #[error(transparent)]
    UpdateSet(#[from] UpdateSetError),

    /// A file-edit command failed
    #[error("failed to apply update to {path}: {message}")]
    Edit { path: PathBuf, message: String },

    /// One or more repositories failed; surfaced after all were attempted
    #[error("{} of the attempted repositories failed ({updates_made} updates were made): {}",
        .failures.len(),
        .failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; "))]
    RepositoriesFailed {
        updates_made: usize,
        failures: Vec<RepositoryFailure>,
    },
}
