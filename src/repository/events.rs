//! Observer registration and status notifications
//!
//! Every registration returns a [`Subscription`]. Disposing it is idempotent
//! and removes exactly that observer. Dropping a subscription does not
//! dispose it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::sync::lock;
use crate::status::StatusFlags;

type DisposeFn = Box<dyn FnOnce() + Send>;

/// Handle for one registered observer
pub struct Subscription {
    dispose: Mutex<Option<DisposeFn>>,
}

impl Subscription {
    /// Subscription that runs `dispose` the first time it is disposed
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Mutex::new(Some(Box::new(dispose))),
        }
    }

    /// Subscription with nothing to release
    pub fn empty() -> Self {
        Self {
            dispose: Mutex::new(None),
        }
    }

    pub fn dispose(&self) {
        let dispose = lock(&self.dispose).take();
        if let Some(dispose) = dispose {
            dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.dispose).is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Subscriptions released together, exactly once
#[derive(Debug)]
pub struct CompositeSubscription {
    /// `None` once disposed
    members: Mutex<Option<Vec<Subscription>>>,
}

impl CompositeSubscription {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(Some(Vec::new())),
        }
    }

    /// Add a member; if the group is already disposed the member is disposed now
    pub fn add(&self, subscription: Subscription) {
        let mut members = lock(&self.members);
        if let Some(members) = members.as_mut() {
            members.push(subscription);
            return;
        }
        drop(members);
        subscription.dispose();
    }

    pub fn dispose(&self) {
        let members = lock(&self.members).take();
        for subscription in members.into_iter().flatten() {
            subscription.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.members).is_none()
    }

    pub fn len(&self) -> usize {
        lock(&self.members).as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CompositeSubscription {
    fn default() -> Self {
        Self::new()
    }
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Handlers<T> {
    next_id: u64,
    by_id: BTreeMap<u64, Handler<T>>,
}

/// Single event family with any number of observers
pub struct Emitter<T> {
    /// `None` once disposed
    handlers: Arc<Mutex<Option<Handlers<T>>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Some(Handlers {
                next_id: 0,
                by_id: BTreeMap::new(),
            }))),
        }
    }

    /// Register an observer. After [`dispose`](Self::dispose) this is a no-op.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let mut guard = lock(&self.handlers);
        let Some(handlers) = guard.as_mut() else {
            return Subscription::empty();
        };

        let id = handlers.next_id;
        handlers.next_id += 1;
        handlers.by_id.insert(id, Arc::new(callback));

        let weak = Arc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = weak.upgrade() {
                if let Some(handlers) = lock(&handlers).as_mut() {
                    handlers.by_id.remove(&id);
                }
            }
        })
    }

    /// Call every observer in registration order, returning how many ran
    pub fn emit(&self, value: &T) -> usize {
        // Observers may subscribe or dispose while being called
        let snapshot: Vec<Handler<T>> = match lock(&self.handlers).as_ref() {
            Some(handlers) => handlers.by_id.values().cloned().collect(),
            None => return 0,
        };

        for handler in &snapshot {
            handler(value);
        }
        snapshot.len()
    }

    /// Drop every observer and refuse new ones
    pub fn dispose(&self) {
        lock(&self.handlers).take();
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.handlers).is_none()
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.handlers)
            .as_ref()
            .map_or(0, |handlers| handlers.by_id.len())
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of `did-change-status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStatusChange {
    /// Absolute path that was refreshed
    pub path: PathBuf,
    pub status: StatusFlags,
}

/// The repository's three event families
pub struct StatusEvents {
    did_change_status: Emitter<PathStatusChange>,
    did_change_statuses: Emitter<()>,
    did_destroy: Emitter<()>,
    destroyed: AtomicBool,
}

impl StatusEvents {
    pub fn new() -> Self {
        Self {
            did_change_status: Emitter::new(),
            did_change_statuses: Emitter::new(),
            did_destroy: Emitter::new(),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn on_did_change_status(
        &self,
        callback: impl Fn(&PathStatusChange) + Send + Sync + 'static,
    ) -> Subscription {
        self.did_change_status.subscribe(callback)
    }

    pub fn on_did_change_statuses(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.did_change_statuses.subscribe(move |_| callback())
    }

    pub fn on_did_destroy(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.did_destroy.subscribe(move |_| callback())
    }

    pub fn emit_did_change_status(&self, change: PathStatusChange) {
        if self.is_destroyed() {
            return;
        }
        let delivered = self.did_change_status.emit(&change);
        debug!(path = %change.path.display(), delivered, "did-change-status");
    }

    pub fn emit_did_change_statuses(&self) {
        if self.is_destroyed() {
            return;
        }
        let delivered = self.did_change_statuses.emit(&());
        debug!(delivered, "did-change-statuses");
    }

    /// Silence the change events, fire `did-destroy` once, then release every observer.
    ///
    /// Returns `false` if already destroyed.
    pub fn destroy(&self) -> bool {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.did_change_status.dispose();
        self.did_change_statuses.dispose();
        self.did_destroy.emit(&());
        self.did_destroy.dispose();
        true
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Default for StatusEvents {
    fn default() -> Self {
        Self::new()
    }
}
