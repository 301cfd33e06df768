//! Public repository API
//!
//! [`Repository`] composes the backend, path keys, status cache, refresh
//! coordinator and notifications, and wires host editor events into
//! refreshes. Opening is deferred: the backend is opened on first use and a
//! failure to open is remembered for the lifetime of the handle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use super::sync::lock;
use super::{
    AheadBehind, Capability, FullRefresh, OpenOptions, PathStatusChange, RefreshCoordinator,
    RepositoryHandle, StatusEvents, Subscription, TriggerWiring,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{BackendOpener, CheckoutStrategy, GitOpener};
use crate::status::{self, CaseSensitivity, StatusFlags, StatusSnapshot};

struct Inner {
    /// Path the repository was opened from
    path: PathBuf,
    opener: Arc<dyn BackendOpener>,
    case_sensitivity: CaseSensitivity,
    /// Opened backend, or the reason opening failed
    handle: OnceCell<std::result::Result<RepositoryHandle, String>>,
    events: Arc<StatusEvents>,
    coordinator: RefreshCoordinator,
    wiring: Mutex<Option<Arc<TriggerWiring>>>,
    /// Runtime used for refreshes started by host events
    runtime: Option<Handle>,
    destroyed: AtomicBool,
}

/// Working-tree status of one repository
///
/// Cloning is cheap and every clone refers to the same repository.
#[derive(Clone)]
pub struct Repository {
    inner: Arc<Inner>,
}

impl Repository {
    /// Open the repository containing `path`.
    ///
    /// Returns immediately; the backend is opened on first use. Host triggers
    /// in `options` are subscribed now and run their refreshes on the current
    /// tokio runtime.
    pub fn open(path: impl AsRef<Path>, opener: Arc<dyn BackendOpener>, options: OpenOptions) -> Self {
        let events = Arc::new(StatusEvents::new());
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            warn!("No tokio runtime available, host triggers will not refresh");
        }

        let inner = Arc::new(Inner {
            path: path.as_ref().to_path_buf(),
            opener,
            case_sensitivity: options.case_sensitivity,
            handle: OnceCell::new(),
            coordinator: RefreshCoordinator::new(Arc::clone(&events)),
            events,
            wiring: Mutex::new(None),
            runtime,
            destroyed: AtomicBool::new(false),
        });

        let for_path = Arc::downgrade(&inner);
        let for_all = Arc::downgrade(&inner);
        let wiring = TriggerWiring::attach(
            &options,
            move |path| spawn_refresh_path(&for_path, path),
            move || spawn_refresh_all(&for_all),
        );
        *lock(&inner.wiring) = Some(wiring);

        Self { inner }
    }

    /// Open with the git backend configured by `config`
    pub fn open_with_git(path: impl AsRef<Path>, config: &Config, options: OpenOptions) -> Self {
        Self::open(path, Arc::new(GitOpener::from_config(config)), options)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            Err(Error::Destroyed)
        } else {
            Ok(())
        }
    }

    async fn handle(&self) -> Result<&RepositoryHandle> {
        self.ensure_alive()?;

        let inner = &self.inner;
        let opened = inner
            .handle
            .get_or_init(|| async {
                match inner.opener.open(&inner.path).await {
                    Ok(backend) => {
                        info!(
                            "Opened repository at {}",
                            backend.working_directory().display()
                        );
                        Ok(RepositoryHandle::new(backend, inner.case_sensitivity))
                    }
                    Err(e) => {
                        warn!("Failed to open repository at {}: {}", inner.path.display(), e);
                        Err(match e {
                            Error::Open { reason, .. } => reason,
                            other => other.to_string(),
                        })
                    }
                }
            })
            .await;

        opened.as_ref().map_err(|reason| Error::Open {
            path: inner.path.clone(),
            reason: reason.clone(),
        })
    }

    /// Opened handle, if opening already succeeded and the repository is alive
    fn opened(&self) -> Option<&RepositoryHandle> {
        if self.is_destroyed() {
            return None;
        }
        self.inner.handle.get().and_then(|opened| opened.as_ref().ok())
    }

    /// Repository metadata directory, without a trailing separator
    pub async fn get_path(&self) -> Result<PathBuf> {
        let git_dir = self.handle().await?.backend().git_dir().to_string_lossy().into_owned();
        let trimmed = git_dir.trim_end_matches(['/', '\\']);
        Ok(PathBuf::from(if trimmed.is_empty() { git_dir.as_str() } else { trimmed }))
    }

    pub async fn get_working_directory(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.handle().await?.working_directory()))
    }

    /// Relativize `path` against `working_directory` using host conventions
    pub fn relativize(path: &str, working_directory: &str) -> String {
        status::relativize(path, working_directory)
    }

    /// Whether `path` has modifications, from a fresh status query
    pub async fn is_path_modified(&self, path: impl AsRef<Path>) -> Result<bool> {
        Ok(self.query_path(path.as_ref()).await?.is_modified())
    }

    /// Whether `path` is new, from a fresh status query
    pub async fn is_path_new(&self, path: impl AsRef<Path>) -> Result<bool> {
        Ok(self.query_path(path.as_ref()).await?.is_new())
    }

    async fn query_path(&self, path: &Path) -> Result<StatusFlags> {
        let handle = self.handle().await?;
        if !handle.contains(path) {
            return Ok(StatusFlags::CURRENT);
        }
        let relative = handle.relativize(path);
        self.inner.coordinator.query_path(handle, &relative).await
    }

    pub async fn is_path_ignored(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let handle = self.handle().await?;
        if !handle.contains(path) {
            return Ok(false);
        }
        handle.backend().is_ignored(&handle.relativize(path)).await
    }

    /// OR of the statuses of every path under `directory`, from a fresh query
    pub async fn get_directory_status(&self, directory: impl AsRef<Path>) -> Result<StatusFlags> {
        let directory = directory.as_ref();
        let handle = self.handle().await?;
        if !handle.contains(directory) {
            return Ok(StatusFlags::CURRENT);
        }
        let relative = handle.relativize(directory);
        self.inner.coordinator.query_directory(handle, &relative).await
    }

    /// Refresh and return the status of `path`
    pub async fn get_path_status(&self, path: impl AsRef<Path>) -> Result<StatusFlags> {
        self.refresh_status_for_path(path).await
    }

    /// Refresh one path, updating the cache and notifying if it changed
    pub async fn refresh_status_for_path(&self, path: impl AsRef<Path>) -> Result<StatusFlags> {
        let handle = self.handle().await?;
        self.inner.coordinator.refresh_path(handle, path.as_ref()).await
    }

    /// Full refresh of every status and the current branch
    pub async fn refresh_status(&self) -> Result<FullRefresh> {
        let handle = self.handle().await?;
        self.inner.coordinator.refresh_all(handle).await
    }

    /// Last cached status of `path`; `None` if never refreshed, not yet opened or destroyed
    pub fn get_cached_path_status(&self, path: impl AsRef<Path>) -> Option<StatusFlags> {
        let handle = self.opened()?;
        let key = handle.key(&handle.relativize(path.as_ref()));
        self.inner.coordinator.cached(&key)
    }

    /// OR of the cached statuses under `directory`
    pub fn get_cached_directory_status(&self, directory: impl AsRef<Path>) -> StatusFlags {
        let Some(handle) = self.opened() else {
            return StatusFlags::CURRENT;
        };
        let directory = directory.as_ref();
        if !handle.contains(directory) {
            return StatusFlags::CURRENT;
        }
        let relative = handle.relativize(directory);
        let prefix = match handle.key(relative.trim_end_matches('/')) {
            key if key.is_empty() => key,
            key => format!("{}/", key),
        };
        self.inner.coordinator.cached_directory(&prefix)
    }

    /// Copy of the whole cache; empty once destroyed
    pub fn get_cached_statuses(&self) -> StatusSnapshot {
        if self.is_destroyed() {
            return StatusSnapshot::default();
        }
        self.inner.coordinator.cached_snapshot()
    }

    /// Restore `path` in the index and working tree to HEAD, then refresh it.
    ///
    /// A failed checkout is returned as-is and triggers no refresh.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn checkout_head(&self, path: impl AsRef<Path>) -> Result<StatusFlags> {
        let path = path.as_ref();
        let handle = self.handle().await?;
        if !handle.contains(path) {
            return Err(Error::NotFound(path.display().to_string()));
        }

        let relative = handle.relativize(path);
        handle
            .backend()
            .checkout(&[relative], CheckoutStrategy::force_exact_paths())
            .await?;

        self.inner.coordinator.refresh_path(handle, path).await
    }

    /// Current branch name, from the last full refresh or a fresh lookup
    pub async fn get_short_head(&self) -> Result<String> {
        let handle = self.handle().await?;
        match self.inner.coordinator.cached_branch() {
            Some(branch) => Ok(branch),
            None => self.inner.coordinator.refresh_branch(handle).await,
        }
    }

    pub fn get_cached_branch(&self) -> Option<String> {
        if self.is_destroyed() {
            return None;
        }
        self.inner.coordinator.cached_branch()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    pub fn refresh_count(&self) -> usize {
        self.inner.coordinator.refresh_count()
    }

    /// See [`StatusFlags::is_new`]
    pub fn is_status_new(status: StatusFlags) -> bool {
        status.is_new()
    }

    /// See [`StatusFlags::is_modified`]
    pub fn is_status_modified(status: StatusFlags) -> bool {
        status.is_modified()
    }

    /// See [`StatusFlags::is_staged`]
    pub fn is_status_staged(status: StatusFlags) -> bool {
        status.is_staged()
    }

    /// See [`StatusFlags::is_ignored`]
    pub fn is_status_ignored(status: StatusFlags) -> bool {
        status.is_ignored()
    }

    /// See [`StatusFlags::is_deleted`]
    pub fn is_status_deleted(status: StatusFlags) -> bool {
        status.is_deleted()
    }

    pub fn ahead_behind_count(&self, _reference: &str) -> Capability<AheadBehind> {
        Capability::NotSupported("ahead/behind count")
    }

    pub fn upstream_branch(&self) -> Capability<String> {
        Capability::NotSupported("upstream branch")
    }

    pub fn references(&self) -> Capability<Vec<String>> {
        Capability::NotSupported("reference enumeration")
    }

    pub fn config_value(&self, _key: &str) -> Capability<String> {
        Capability::NotSupported("config values")
    }

    pub fn origin_url(&self) -> Capability<String> {
        Capability::NotSupported("origin URL")
    }

    pub fn is_submodule(&self, _path: impl AsRef<Path>) -> Capability<bool> {
        Capability::NotSupported("submodule detection")
    }

    pub fn on_did_change_status(
        &self,
        callback: impl Fn(&PathStatusChange) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.events.on_did_change_status(callback)
    }

    pub fn on_did_change_statuses(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.inner.events.on_did_change_statuses(callback)
    }

    pub fn on_did_destroy(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.inner.events.on_did_destroy(callback)
    }

    /// Release host subscriptions, fire `did-destroy` once and drop the cache.
    ///
    /// Refreshes still in flight may finish, but notify nobody.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Destroying repository {}", self.inner.path.display());

        let wiring = lock(&self.inner.wiring).take();
        if let Some(wiring) = wiring {
            wiring.dispose();
        }

        self.inner.events.destroy();
        self.inner.coordinator.clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }
}

fn spawn_refresh_path(inner: &Weak<Inner>, path: PathBuf) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Some(runtime) = inner.runtime.clone() else {
        debug!("No runtime, dropping refresh for {}", path.display());
        return;
    };

    let repository = Repository { inner };
    runtime.spawn(async move {
        match repository.refresh_status_for_path(&path).await {
            Ok(_) | Err(Error::Destroyed) => {}
            Err(e) => warn!("Refresh of {} failed: {}", path.display(), e),
        }
    });
}

fn spawn_refresh_all(inner: &Weak<Inner>) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Some(runtime) = inner.runtime.clone() else {
        debug!("No runtime, dropping full refresh");
        return;
    };

    let repository = Repository { inner };
    runtime.spawn(async move {
        match repository.refresh_status().await {
            Ok(refresh) => {
                if let Err(e) = refresh.branch {
                    debug!("Branch refresh failed: {}", e);
                }
            }
            Err(Error::Destroyed) => {}
            Err(e) => warn!("Full refresh failed: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::repository::testing::{FakeBackend, FakeOpener};
    use crate::repository::triggers::fakes::{FakeBuffer, FakeFocus, FakeProject};
    use crate::status::RawStatus;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn open(backend: &Arc<FakeBackend>) -> Repository {
        Repository::open(
            "/repo",
            Arc::new(FakeOpener::new(backend.clone())),
            OpenOptions::new().with_case_sensitivity(CaseSensitivity::Sensitive),
        )
    }

    fn count(counter: &Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Let spawned trigger refreshes run to completion
    async fn settle(repo: &Repository) {
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if !repo.is_refreshing() {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if !repo.is_refreshing() {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_unmodified_path_is_current_and_silent() {
        let backend = FakeBackend::new("/repo");
        let repo = open(&backend);
        let fired = Arc::new(AtomicUsize::new(0));
        let _sub = repo.on_did_change_status({
            let f = count(&fired);
            move |_| f()
        });

        let status = repo.get_path_status("/repo/README.md").await.unwrap();

        assert!(status.is_current());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(repo.get_cached_path_status("/repo/README.md"), Some(StatusFlags::CURRENT));
    }

    #[tokio::test]
    async fn test_modified_path_fires_once() {
        let backend = FakeBackend::new("/repo");
        let repo = open(&backend);
        let changes = Arc::new(Mutex::new(Vec::new()));
        let _sub = repo.on_did_change_status({
            let changes = Arc::clone(&changes);
            move |change| changes.lock().unwrap().push(change.clone())
        });

        backend.set_status("src/main.rs", RawStatus::WT_MODIFIED);
        let status = repo.refresh_status_for_path("/repo/src/main.rs").await.unwrap();

        assert!(Repository::is_status_modified(status));
        assert_eq!(repo.get_cached_path_status("/repo/src/main.rs"), Some(status));
        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].status, status);
    }

    #[tokio::test]
    async fn test_identical_full_refreshes_notify_once() {
        let backend = FakeBackend::new("/repo");
        backend.set_status("a.txt", RawStatus::WT_NEW);
        let repo = open(&backend);
        let fired = Arc::new(AtomicUsize::new(0));
        let _sub = repo.on_did_change_statuses(count(&fired));

        assert!(repo.refresh_status().await.unwrap().changed);
        assert!(!repo.refresh_status().await.unwrap().changed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(repo.get_cached_statuses().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_head_restores_and_refreshes() {
        let backend = FakeBackend::new("/repo");
        backend.set_status("a.txt", RawStatus::WT_MODIFIED);
        let repo = open(&backend);
        assert!(repo.get_path_status("/repo/a.txt").await.unwrap().is_modified());

        let status = repo.checkout_head("/repo/a.txt").await.unwrap();

        assert!(status.is_current());
        assert_eq!(
            backend.checkouts(),
            vec![(vec!["a.txt".to_string()], CheckoutStrategy::force_exact_paths())]
        );
        assert!(repo.refresh_status_for_path("/repo/a.txt").await.unwrap().is_current());
    }

    #[tokio::test]
    async fn test_failed_checkout_skips_refresh() {
        let backend = FakeBackend::new("/repo");
        backend.set_status("a.txt", RawStatus::WT_NEW);
        backend.fail_checkout(true);
        let repo = open(&backend);

        let result = repo.checkout_head("/repo/a.txt").await;

        assert!(matches!(
            result,
            Err(Error::Backend(BackendError::Checkout { .. }))
        ));
        assert_eq!(backend.status_calls(), 0);
        assert_eq!(repo.get_cached_path_status("/repo/a.txt"), None);
    }

    #[tokio::test]
    async fn test_checkout_outside_repository_is_not_found() {
        let backend = FakeBackend::new("/repo");
        let repo = open(&backend);
        assert!(matches!(
            repo.checkout_head("/other/a.txt").await,
            Err(Error::NotFound(_))
        ));
        assert!(backend.checkouts().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_is_sticky() {
        let opener = Arc::new(FakeOpener::failing());
        let repo = Repository::open("/not/a/repo", opener.clone(), OpenOptions::new());

        for _ in 0..2 {
            match repo.get_path_status("/not/a/repo/file").await {
                Err(Error::Open { path, reason }) => {
                    assert_eq!(path, PathBuf::from("/not/a/repo"));
                    assert_eq!(reason, "not a git repository");
                }
                other => panic!("expected open error, got {:?}", other),
            }
        }
        assert!(matches!(repo.refresh_status().await, Err(Error::Open { .. })));
        assert_eq!(opener.opens(), 1);
        assert_eq!(repo.get_cached_path_status("/not/a/repo/file"), None);
    }

    #[tokio::test]
    async fn test_fresh_queries_do_not_touch_cache() {
        let backend = FakeBackend::new("/repo");
        backend.set_status("new.txt", RawStatus::WT_NEW);
        backend.set_status("dir/changed.txt", RawStatus::INDEX_MODIFIED);
        backend.set_ignored("target");
        let repo = open(&backend);

        assert!(repo.is_path_new("/repo/new.txt").await.unwrap());
        assert!(!repo.is_path_modified("/repo/new.txt").await.unwrap());
        assert!(repo.is_path_ignored("/repo/target").await.unwrap());
        assert!(repo.get_directory_status("/repo/dir").await.unwrap().is_staged());
        assert!(repo.get_cached_statuses().is_empty());
    }

    #[tokio::test]
    async fn test_cached_directory_status() {
        let backend = FakeBackend::new("/repo");
        backend.set_status("foo/a.txt", RawStatus::WT_MODIFIED);
        backend.set_status("foobar/b.txt", RawStatus::WT_NEW);
        let repo = open(&backend);
        assert!(repo.get_cached_directory_status("/repo/foo").is_current());

        repo.refresh_status().await.unwrap();

        let foo = repo.get_cached_directory_status("/repo/foo");
        assert!(foo.is_modified() && !foo.is_new());
        let root = repo.get_cached_directory_status("/repo");
        assert!(root.is_modified() && root.is_new());
    }

    #[tokio::test]
    async fn test_paths_and_branch() {
        let backend = FakeBackend::new("/repo");
        let repo = open(&backend);

        assert_eq!(repo.get_path().await.unwrap(), PathBuf::from("/repo/.git"));
        assert_eq!(repo.get_working_directory().await.unwrap(), PathBuf::from("/repo"));
        assert_eq!(repo.get_cached_branch(), None);
        assert_eq!(repo.get_short_head().await.unwrap(), "main");
        assert_eq!(repo.get_cached_branch().as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_unsupported_capabilities() {
        let repo = open(&FakeBackend::new("/repo"));
        assert!(!repo.ahead_behind_count("HEAD").is_supported());
        assert!(!repo.upstream_branch().is_supported());
        assert!(!repo.references().is_supported());
        assert!(!repo.config_value("user.name").is_supported());
        assert!(!repo.origin_url().is_supported());
        assert!(matches!(
            repo.is_submodule("/repo/vendor").into_result(),
            Err(Error::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_destroy_while_refresh_pending() {
        let backend = FakeBackend::new("/repo");
        backend.set_status("a.txt", RawStatus::WT_MODIFIED);
        let repo = open(&backend);

        let destroyed = Arc::new(AtomicUsize::new(0));
        let statuses = Arc::new(AtomicUsize::new(0));
        let _d = repo.on_did_destroy(count(&destroyed));
        let _s = repo.on_did_change_statuses(count(&statuses));

        // Open the backend before parking the refresh
        repo.get_working_directory().await.unwrap();
        backend.hold_statuses();
        let pending = tokio::spawn({
            let repo = repo.clone();
            async move { repo.refresh_status().await }
        });
        while !repo.is_refreshing() {
            tokio::task::yield_now().await;
        }

        repo.destroy();
        repo.destroy();
        backend.release_statuses();

        let result = pending.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
        assert!(repo.get_cached_statuses().is_empty());
        assert_eq!(repo.get_cached_path_status("/repo/a.txt"), None);
        assert!(repo.get_cached_directory_status("/repo").is_current());
        assert_eq!(repo.get_cached_branch(), None);
        assert_eq!(statuses.load(Ordering::SeqCst), 0);
        assert!(matches!(repo.refresh_status().await, Err(Error::Destroyed)));
        assert!(matches!(repo.get_path_status("/repo/a.txt").await, Err(Error::Destroyed)));
        assert!(repo.is_destroyed());
    }

    #[tokio::test]
    async fn test_buffer_save_triggers_refresh() {
        let backend = FakeBackend::new("/repo");
        let project = Arc::new(FakeProject::default());
        let buffer = FakeBuffer::new(Some("/repo/src/lib.rs"));
        project.add_buffer(Arc::clone(&buffer));

        let repo = Repository::open(
            "/repo",
            Arc::new(FakeOpener::new(backend.clone())),
            OpenOptions::new()
                .with_project(project)
                .with_case_sensitivity(CaseSensitivity::Sensitive),
        );
        let fired = Arc::new(AtomicUsize::new(0));
        let _sub = repo.on_did_change_status({
            let f = count(&fired);
            move |_| f()
        });

        backend.set_status("src/lib.rs", RawStatus::WT_MODIFIED);
        buffer.saved.emit(&());
        settle(&repo).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(repo.get_cached_path_status("/repo/src/lib.rs").unwrap().is_modified());

        backend.clear_status("src/lib.rs");
        buffer.destroyed.emit(&());
        buffer.saved.emit(&());
        settle(&repo).await;
        assert!(repo.get_cached_path_status("/repo/src/lib.rs").unwrap().is_modified());
    }

    #[tokio::test]
    async fn test_focus_triggers_full_refresh_until_destroyed() {
        let backend = FakeBackend::new("/repo");
        backend.set_status("a.txt", RawStatus::WT_NEW);
        let focus = Arc::new(FakeFocus::default());
        let repo = Repository::open(
            "/repo",
            Arc::new(FakeOpener::new(backend.clone())),
            OpenOptions::new()
                .with_focus(focus.clone())
                .with_case_sensitivity(CaseSensitivity::Sensitive),
        );

        focus.focused.emit(&());
        settle(&repo).await;
        assert_eq!(repo.get_cached_statuses().len(), 1);
        assert_eq!(backend.status_calls(), 1);

        repo.destroy();
        focus.focused.emit(&());
        settle(&repo).await;
        assert_eq!(focus.focused.observer_count(), 0);
        assert_eq!(backend.status_calls(), 1);
    }
}
