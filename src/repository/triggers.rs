//! Host editor refresh triggers
//!
//! The host supplies its buffers, project and window focus through the traits
//! below. [`TriggerWiring`] turns their events into refresh requests and owns
//! every registration it makes, so teardown never depends on the host
//! dropping callbacks.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::sync::lock;
use super::{CompositeSubscription, Subscription};
use crate::config::Config;
use crate::status::CaseSensitivity;

/// Host callback without payload
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Host callback receiving a newly opened buffer
pub type BufferCallback = Arc<dyn Fn(Arc<dyn TextBuffer>) + Send + Sync>;

/// An open editor buffer
pub trait TextBuffer: Send + Sync {
    /// Current file path, `None` for a buffer that was never saved
    fn path(&self) -> Option<PathBuf>;

    fn on_did_save(&self, callback: Callback) -> Subscription;

    fn on_did_reload(&self, callback: Callback) -> Subscription;

    fn on_did_change_path(&self, callback: Callback) -> Subscription;

    fn on_did_destroy(&self, callback: Callback) -> Subscription;
}

/// The project whose buffers are tracked
pub trait Project: Send + Sync {
    fn buffers(&self) -> Vec<Arc<dyn TextBuffer>>;

    fn on_did_add_buffer(&self, callback: BufferCallback) -> Subscription;
}

/// Source of window/application focus events
pub trait FocusSource: Send + Sync {
    fn on_did_focus(&self, callback: Callback) -> Subscription;
}

/// Options for [`Repository::open`](super::Repository::open)
#[derive(Clone)]
pub struct OpenOptions {
    /// Project whose buffers trigger per-path refreshes
    pub project: Option<Arc<dyn Project>>,
    /// Focus source that triggers full refreshes
    pub focus: Option<Arc<dyn FocusSource>>,
    /// Whether focus events refresh at all
    pub refresh_on_window_focus: bool,
    /// Path key case folding
    pub case_sensitivity: CaseSensitivity,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self {
            project: None,
            focus: None,
            refresh_on_window_focus: true,
            case_sensitivity: CaseSensitivity::Auto,
        }
    }

    /// Defaults taken from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            refresh_on_window_focus: config.refresh_on_window_focus,
            case_sensitivity: config.case_sensitivity,
            ..Self::new()
        }
    }

    pub fn with_project(mut self, project: Arc<dyn Project>) -> Self {
        self.project = Some(project);
        self
    }

    pub fn with_focus(mut self, focus: Arc<dyn FocusSource>) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn refresh_on_window_focus(mut self, enabled: bool) -> Self {
        self.refresh_on_window_focus = enabled;
        self
    }

    pub fn with_case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("project", &self.project.is_some())
            .field("focus", &self.focus.is_some())
            .field("refresh_on_window_focus", &self.refresh_on_window_focus)
            .field("case_sensitivity", &self.case_sensitivity)
            .finish()
    }
}

type PathTrigger = Arc<dyn Fn(PathBuf) + Send + Sync>;

/// Registrations made on behalf of one repository
pub struct TriggerWiring {
    refresh_path: PathTrigger,
    refresh_all: Callback,
    /// Project and focus registrations
    subscriptions: CompositeSubscription,
    /// Per-buffer groups (save, reload, path change, destroy); `None` once disposed
    buffers: Mutex<Option<HashMap<u64, Arc<CompositeSubscription>>>>,
    next_buffer_id: AtomicU64,
}

impl TriggerWiring {
    /// Subscribe to every trigger source named in `options`
    pub fn attach(
        options: &OpenOptions,
        refresh_path: impl Fn(PathBuf) + Send + Sync + 'static,
        refresh_all: impl Fn() + Send + Sync + 'static,
    ) -> Arc<Self> {
        let wiring = Arc::new(Self {
            refresh_path: Arc::new(refresh_path),
            refresh_all: Arc::new(refresh_all),
            subscriptions: CompositeSubscription::new(),
            buffers: Mutex::new(Some(HashMap::new())),
            next_buffer_id: AtomicU64::new(0),
        });

        if let Some(project) = &options.project {
            for buffer in project.buffers() {
                wiring.track_buffer(buffer);
            }

            let weak = Arc::downgrade(&wiring);
            wiring
                .subscriptions
                .add(project.on_did_add_buffer(Arc::new(move |buffer| {
                    if let Some(wiring) = weak.upgrade() {
                        wiring.track_buffer(buffer);
                    }
                })));
        }

        if options.refresh_on_window_focus {
            if let Some(focus) = &options.focus {
                let refresh_all = Arc::clone(&wiring.refresh_all);
                wiring
                    .subscriptions
                    .add(focus.on_did_focus(Arc::new(move || {
                        debug!("Window focused, refreshing all statuses");
                        refresh_all();
                    })));
            }
        }

        wiring
    }

    fn track_buffer(self: &Arc<Self>, buffer: Arc<dyn TextBuffer>) {
        let id = self.next_buffer_id.fetch_add(1, Ordering::SeqCst);
        let group = Arc::new(CompositeSubscription::new());

        let weak_buffer = Arc::downgrade(&buffer);
        let refresh_path = Arc::clone(&self.refresh_path);
        let refresh: Callback = Arc::new(move || {
            let Some(buffer) = weak_buffer.upgrade() else {
                return;
            };
            match buffer.path() {
                Some(path) => refresh_path(path),
                None => debug!("Buffer has no path, skipping refresh"),
            }
        });

        group.add(buffer.on_did_save(Arc::clone(&refresh)));
        group.add(buffer.on_did_reload(Arc::clone(&refresh)));
        group.add(buffer.on_did_change_path(refresh));

        let weak_self = Arc::downgrade(self);
        group.add(buffer.on_did_destroy(Arc::new(move || {
            if let Some(wiring) = weak_self.upgrade() {
                wiring.release_buffer(id);
            }
        })));

        let mut buffers = lock(&self.buffers);
        if let Some(buffers) = buffers.as_mut() {
            buffers.insert(id, group);
            return;
        }
        drop(buffers);
        group.dispose();
    }

    fn release_buffer(&self, id: u64) {
        let group = lock(&self.buffers)
            .as_mut()
            .and_then(|buffers| buffers.remove(&id));
        if let Some(group) = group {
            debug!(buffer = id, "Buffer destroyed, releasing its subscriptions");
            group.dispose();
        }
    }

    /// Number of buffers whose events are still observed
    pub fn tracked_buffers(&self) -> usize {
        lock(&self.buffers).as_ref().map_or(0, HashMap::len)
    }

    /// Release every registration exactly once
    pub fn dispose(&self) {
        self.subscriptions.dispose();
        let buffers = lock(&self.buffers).take();
        for group in buffers.into_iter().flat_map(HashMap::into_values) {
            group.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.subscriptions.is_disposed()
    }
}
