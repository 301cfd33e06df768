//! Worktree Status - Cached working-tree git status with change notifications
//!
//! Answers "what is the git status of this file or directory" for an editor,
//! keeps the last answers in a cache and notifies observers when they change.
//!
//! # Modules
//!
//! - [`status`] - Status flags, path keys and the status cache
//! - [`git`] - Backend trait and the git implementation
//! - [`repository`] - Refresh coordination, notifications and the public facade
//! - [`config`] - Layered configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod git;
pub mod repository;
pub mod status;

pub use config::Config;
pub use error::{Error, Result};
pub use repository::{OpenOptions, PathStatusChange, Repository, Subscription};
pub use status::{StatusFlags, StatusSnapshot};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
