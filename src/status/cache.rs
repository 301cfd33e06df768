//! Per-path status cache
//!
//! Holds the last known status for every path key and decides whether a new
//! answer from the backend is worth a notification.

use std::collections::HashMap;

use serde::Serialize;

use super::StatusFlags;
use crate::error::{Error, Result};

/// Status of every non-current path as of one full refresh
///
/// A key that is absent is CURRENT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    entries: HashMap<String, StatusFlags>,
}

impl StatusSnapshot {
    /// Build a snapshot; a key reported twice keeps its last value
    pub fn from_entries(entries: impl IntoIterator<Item = (String, StatusFlags)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Status for `key`, CURRENT when absent
    pub fn status_of(&self, key: &str) -> StatusFlags {
        self.entries.get(key).copied().unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<StatusFlags> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StatusFlags)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries sorted by key, for stable output
    pub fn sorted(&self) -> Vec<(&str, StatusFlags)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl FromIterator<(String, StatusFlags)> for StatusSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, StatusFlags)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

/// Mapping from path key to last known status
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: HashMap<String, StatusFlags>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known status, `None` if the path was never refreshed
    pub fn get_cached(&self, key: &str) -> Option<StatusFlags> {
        self.entries.get(key).copied()
    }

    /// Like [`get_cached`](Self::get_cached), but a missing entry is an error
    pub fn lookup(&self, key: &str) -> Result<StatusFlags> {
        self.get_cached(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Replace the whole cache, returning whether anything differs
    pub fn apply_full_snapshot(&mut self, snapshot: &StatusSnapshot) -> bool {
        if self.entries == snapshot.entries {
            return false;
        }
        self.entries = snapshot.entries.clone();
        true
    }

    /// Update one entry, returning whether its value changed
    ///
    /// An absent entry compares as CURRENT.
    pub fn apply_single_path_update(&mut self, key: &str, status: StatusFlags) -> bool {
        let previous = self.entries.insert(key.to_string(), status);
        previous.unwrap_or_default() != status
    }

    /// OR of every entry whose key starts with `prefix`
    ///
    /// This is a plain string-prefix test; pass a trailing `/` to restrict
    /// matches to a directory.
    pub fn directory_aggregate(&self, prefix: &str) -> StatusFlags {
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .fold(StatusFlags::CURRENT, |acc, (_, status)| acc | *status)
    }

    /// Copy of the current cache contents
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            entries: self.entries.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
