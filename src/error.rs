//! Error types for worktree-status
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for worktree-status
#[derive(Error, Debug)]
pub enum Error {
    /// The repository could not be opened. Fatal for the handle that hit it.
    #[error("Failed to open repository at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("No status entry for {0}")]
    NotFound(String),

    #[error("Git error: {0}")]
    Backend(#[from] BackendError),

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Repository has been destroyed")]
    Destroyed,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced by the version-control backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Git command failed: {command} - {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Git command timed out after {0:?}")]
    Timeout(Duration),

    #[error("No current branch: {0}")]
    NoBranch(String),

    #[error("Checkout of {paths:?} failed: {reason}")]
    Checkout { paths: Vec<String>, reason: String },

    #[error("Failed to parse git output: {0}")]
    Parse(String),

    #[error("Gitoxide error: {0}")]
    Gix(String),

    #[error("Semaphore acquire failed")]
    SemaphoreError,

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(PathBuf),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<gix::discover::Error> for BackendError {
    fn from(e: gix::discover::Error) -> Self {
        BackendError::Gix(e.to_string())
    }
}

impl From<tokio::task::JoinError> for BackendError {
    fn from(e: tokio::task::JoinError) -> Self {
        BackendError::Task(e.to_string())
    }
}
