//! Interface required from the version-control backend
//!
//! The status layer only asks these questions; how they are answered is the
//! backend's business.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::status::RawStatus;

/// One path reported by a status scan, relative to the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub status: RawStatus,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, status: RawStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// How a checkout treats the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutStrategy {
    /// Overwrite local modifications
    pub force: bool,
    /// Treat the given paths literally instead of as pathspec patterns
    pub disable_pathspec_match: bool,
}

impl CheckoutStrategy {
    /// Force-restore exactly the given paths
    pub const fn force_exact_paths() -> Self {
        Self {
            force: true,
            disable_pathspec_match: true,
        }
    }
}

/// An opened repository
#[async_trait]
pub trait Backend: Send + Sync {
    /// Repository metadata directory (`.git`)
    fn git_dir(&self) -> &Path;

    /// Absolute working directory
    fn working_directory(&self) -> &Path;

    /// Every non-current path, optionally limited to a pathspec
    async fn list_statuses(&self, pathspec: Option<&str>) -> Result<Vec<StatusEntry>>;

    /// Short name of the checked-out branch
    async fn current_branch(&self) -> Result<String>;

    async fn is_ignored(&self, relative_path: &str) -> Result<bool>;

    /// Restore index and working tree to HEAD for the given paths
    async fn checkout(&self, relative_paths: &[String], strategy: CheckoutStrategy) -> Result<()>;
}

/// Opens repositories for [`Repository`](crate::repository::Repository)
#[async_trait]
pub trait BackendOpener: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Arc<dyn Backend>>;
}
