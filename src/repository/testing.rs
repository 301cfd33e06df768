//! In-memory backend for unit tests

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{BackendError, Error, Result};
use crate::git::{Backend, BackendOpener, CheckoutStrategy, StatusEntry};
use crate::status::RawStatus;

pub struct FakeBackend {
    work_dir: PathBuf,
    git_dir: PathBuf,
    statuses: Mutex<BTreeMap<String, RawStatus>>,
    branch: Mutex<std::result::Result<String, String>>,
    ignored: Mutex<BTreeSet<String>>,
    fail_statuses: AtomicBool,
    fail_checkout: AtomicBool,
    hold: AtomicBool,
    release: Notify,
    status_calls: AtomicUsize,
    checkouts: Mutex<Vec<(Vec<String>, CheckoutStrategy)>>,
}

impl FakeBackend {
    pub fn new(work_dir: &str) -> Arc<Self> {
        let work_dir = PathBuf::from(work_dir);
        Arc::new(Self {
            git_dir: work_dir.join(".git"),
            work_dir,
            statuses: Mutex::new(BTreeMap::new()),
            branch: Mutex::new(Ok("main".to_string())),
            ignored: Mutex::new(BTreeSet::new()),
            fail_statuses: AtomicBool::new(false),
            fail_checkout: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            release: Notify::new(),
            status_calls: AtomicUsize::new(0),
            checkouts: Mutex::new(Vec::new()),
        })
    }

    pub fn set_status(&self, path: &str, status: RawStatus) {
        self.statuses.lock().unwrap().insert(path.to_string(), status);
    }

    pub fn clear_status(&self, path: &str) {
        self.statuses.lock().unwrap().remove(path);
    }

    pub fn set_branch(&self, name: &str) {
        *self.branch.lock().unwrap() = Ok(name.to_string());
    }

    pub fn set_detached(&self) {
        *self.branch.lock().unwrap() = Err("HEAD is detached".to_string());
    }

    pub fn set_ignored(&self, path: &str) {
        self.ignored.lock().unwrap().insert(path.to_string());
    }

    pub fn fail_statuses(&self, fail: bool) {
        self.fail_statuses.store(fail, Ordering::SeqCst);
    }

    pub fn fail_checkout(&self, fail: bool) {
        self.fail_checkout.store(fail, Ordering::SeqCst);
    }

    /// Park every status scan until [`release_statuses`](Self::release_statuses)
    pub fn hold_statuses(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release_statuses(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn checkouts(&self) -> Vec<(Vec<String>, CheckoutStrategy)> {
        self.checkouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn working_directory(&self) -> &Path {
        &self.work_dir
    }

    async fn list_statuses(&self, pathspec: Option<&str>) -> Result<Vec<StatusEntry>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_statuses.load(Ordering::SeqCst) {
            return Err(BackendError::CommandFailed {
                command: "git status".to_string(),
                stderr: "index file corrupt".to_string(),
            }
            .into());
        }

        // Pathspecs match case-sensitively, like git's default
        let statuses = self.statuses.lock().unwrap();
        Ok(statuses
            .iter()
            .filter(|(path, _)| pathspec.is_none_or(|spec| path.starts_with(spec)))
            .map(|(path, status)| StatusEntry::new(path.clone(), *status))
            .collect())
    }

    async fn current_branch(&self) -> Result<String> {
        self.branch
            .lock()
            .unwrap()
            .clone()
            .map_err(|e| BackendError::NoBranch(e).into())
    }

    async fn is_ignored(&self, relative_path: &str) -> Result<bool> {
        Ok(self.ignored.lock().unwrap().contains(relative_path))
    }

    async fn checkout(&self, relative_paths: &[String], strategy: CheckoutStrategy) -> Result<()> {
        self.checkouts
            .lock()
            .unwrap()
            .push((relative_paths.to_vec(), strategy));

        if self.fail_checkout.load(Ordering::SeqCst) {
            return Err(BackendError::Checkout {
                paths: relative_paths.to_vec(),
                reason: "pathspec did not match any file(s) known to git".to_string(),
            }
            .into());
        }

        let mut statuses = self.statuses.lock().unwrap();
        for path in relative_paths {
            statuses.remove(path);
        }
        Ok(())
    }
}

/// Opener handing out one shared fake, or failing every time
pub struct FakeOpener {
    backend: Option<Arc<FakeBackend>>,
    opens: AtomicUsize,
}

impl FakeOpener {
    pub fn new(backend: Arc<FakeBackend>) -> Self {
        Self {
            backend: Some(backend),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            backend: None,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendOpener for FakeOpener {
    async fn open(&self, path: &Path) -> Result<Arc<dyn Backend>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match &self.backend {
            Some(backend) => Ok(backend.clone()),
            None => Err(Error::Open {
                path: path.to_path_buf(),
                reason: "not a git repository".to_string(),
            }),
        }
    }
}
