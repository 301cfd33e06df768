//! Refresh coordination
//!
//! Runs full and per-path refreshes against the backend, commits the answers
//! to the status cache and decides which notifications to send.
//!
//! Refreshes are not serialized: any number may be in flight, and for an
//! overlapping key the last one to finish wins. The in-flight counter is an
//! observability aid only.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, instrument};

use super::sync::{read, write};
use super::{PathStatusChange, StatusEvents};
use crate::error::{BackendError, Error, Result};
use crate::git::Backend;
use crate::status::{CaseSensitivity, Relativizer, StatusCache, StatusFlags, StatusSnapshot};

/// An opened backend together with its path conventions
#[derive(Clone)]
pub struct RepositoryHandle {
    backend: Arc<dyn Backend>,
    relativizer: Relativizer,
    working_directory: String,
}

impl RepositoryHandle {
    pub fn new(backend: Arc<dyn Backend>, case_sensitivity: CaseSensitivity) -> Self {
        let work_dir = backend.working_directory();
        let relativizer = Relativizer::new(case_sensitivity.is_insensitive(work_dir));
        let working_directory = work_dir.to_string_lossy().into_owned();

        Self {
            backend,
            relativizer,
            working_directory,
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    pub fn relativizer(&self) -> &Relativizer {
        &self.relativizer
    }

    /// Path relative to the working directory, original case
    pub fn relativize(&self, path: &Path) -> String {
        self.relativizer
            .relativize(&path.to_string_lossy(), &self.working_directory)
    }

    /// Cache key for a relative path
    pub fn key(&self, relative: &str) -> String {
        self.relativizer.fold(relative)
    }

    /// Pathspec scoping a backend query to `relative`.
    ///
    /// Pathspecs match case-sensitively, so a case-folding handle scans the
    /// whole tree and filters by key instead.
    pub fn pathspec<'a>(&self, relative: &'a str) -> Option<&'a str> {
        (!relative.is_empty() && !self.relativizer.is_case_insensitive()).then_some(relative)
    }

    /// Whether `path` is the working directory or lies beneath it
    pub fn contains(&self, path: &Path) -> bool {
        let original = path.to_string_lossy();
        let relative = self.relativizer.relativize(&original, &self.working_directory);
        relative.is_empty() || relative != original
    }
}

/// Outcome of a full refresh
#[derive(Debug)]
pub struct FullRefresh {
    /// Snapshot committed to the cache
    pub snapshot: StatusSnapshot,
    /// Whether it differed from the previous cache contents
    pub changed: bool,
    /// Branch half of the refresh, reported separately
    pub branch: Result<String>,
}

/// Keeps the in-flight counter balanced, including when a refresh future is dropped
#[derive(Debug)]
pub struct RefreshGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> RefreshGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Issues refreshes and owns the status cache
pub struct RefreshCoordinator {
    cache: RwLock<StatusCache>,
    branch: RwLock<Option<String>>,
    events: Arc<StatusEvents>,
    in_flight: AtomicUsize,
}

impl RefreshCoordinator {
    pub fn new(events: Arc<StatusEvents>) -> Self {
        Self {
            cache: RwLock::new(StatusCache::new()),
            branch: RwLock::new(None),
            events,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Number of refreshes currently in flight
    pub fn refresh_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_count() > 0
    }

    /// Full rescan of statuses and the current branch, run concurrently.
    ///
    /// Each half commits independently. A status failure is returned as the
    /// error; a branch failure is carried in [`FullRefresh::branch`].
    #[instrument(skip_all)]
    pub async fn refresh_all(&self, handle: &RepositoryHandle) -> Result<FullRefresh> {
        let _guard = RefreshGuard::new(&self.in_flight);
        debug!("Full refresh started");

        let (statuses, branch) = tokio::join!(self.refresh_statuses(handle), self.refresh_branch(handle));
        let (snapshot, changed) = statuses?;

        debug!(entries = snapshot.len(), changed, "Full refresh finished");
        Ok(FullRefresh {
            snapshot,
            changed,
            branch,
        })
    }

    async fn refresh_statuses(&self, handle: &RepositoryHandle) -> Result<(StatusSnapshot, bool)> {
        let entries = handle.backend().list_statuses(None).await?;
        let snapshot: StatusSnapshot = entries
            .into_iter()
            .map(|entry| (handle.key(&entry.path), StatusFlags::from(entry.status)))
            .collect();

        let changed = write(&self.cache).apply_full_snapshot(&snapshot);
        if changed {
            self.events.emit_did_change_statuses();
        }
        Ok((snapshot, changed))
    }

    /// Look up the current branch and cache it; a detached or unborn HEAD clears the cache
    pub async fn refresh_branch(&self, handle: &RepositoryHandle) -> Result<String> {
        match handle.backend().current_branch().await {
            Ok(name) => {
                *write(&self.branch) = Some(name.clone());
                Ok(name)
            }
            Err(e) => {
                if matches!(e, Error::Backend(BackendError::NoBranch(_))) {
                    *write(&self.branch) = None;
                }
                Err(e)
            }
        }
    }

    /// Targeted refresh of one absolute path.
    ///
    /// Paths outside the working directory are CURRENT and never cached.
    #[instrument(skip(self, handle), fields(path = %path.display()))]
    pub async fn refresh_path(&self, handle: &RepositoryHandle, path: &Path) -> Result<StatusFlags> {
        if !handle.contains(path) {
            debug!("Path is outside the working directory");
            return Ok(StatusFlags::CURRENT);
        }

        let _guard = RefreshGuard::new(&self.in_flight);
        let relative = handle.relativize(path);
        let key = handle.key(&relative);

        let status = self.query_path(handle, &relative).await?;

        let changed = write(&self.cache).apply_single_path_update(&key, status);
        debug!(%status, changed, "Path refresh finished");
        if changed {
            self.events.emit_did_change_status(PathStatusChange {
                path: path.to_path_buf(),
                status,
            });
        }
        Ok(status)
    }

    /// Fresh status of one relative path without touching the cache
    pub async fn query_path(&self, handle: &RepositoryHandle, relative: &str) -> Result<StatusFlags> {
        let key = handle.key(relative);
        let entries = handle.backend().list_statuses(handle.pathspec(relative)).await?;

        Ok(entries
            .into_iter()
            .rev()
            .find(|entry| handle.key(&entry.path) == key)
            .map(|entry| StatusFlags::from(entry.status))
            .unwrap_or_default())
    }

    /// Fresh OR of every status under a relative directory, without touching the cache
    pub async fn query_directory(&self, handle: &RepositoryHandle, relative_dir: &str) -> Result<StatusFlags> {
        let pathspec = handle.pathspec(relative_dir);
        let prefix = match relative_dir {
            "" => String::new(),
            dir => format!("{}/", handle.key(dir.trim_end_matches('/'))),
        };

        let entries = handle.backend().list_statuses(pathspec).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| handle.key(&entry.path).starts_with(&prefix))
            .fold(StatusFlags::CURRENT, |acc, entry| acc | StatusFlags::from(entry.status)))
    }

    pub fn cached(&self, key: &str) -> Option<StatusFlags> {
        read(&self.cache).get_cached(key)
    }

    pub fn cached_directory(&self, prefix: &str) -> StatusFlags {
        read(&self.cache).directory_aggregate(prefix)
    }

    pub fn cached_snapshot(&self) -> StatusSnapshot {
        read(&self.cache).snapshot()
    }

    pub fn cached_branch(&self) -> Option<String> {
        read(&self.branch).clone()
    }

    /// Drop all cached state
    pub fn clear(&self) {
        write(&self.cache).clear();
        write(&self.branch).take();
    }
}
