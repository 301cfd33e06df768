//! Repository-relative path keys
//!
//! Converts absolute editor paths into the `/`-separated keys used by the
//! status cache. Relativization never fails: a path that cannot be made
//! relative is handed back unchanged.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// How path keys are compared against the working directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    /// Probe the working directory on disk
    #[default]
    Auto,
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Whether keys under `working_directory` must be case-folded
    pub fn is_insensitive(self, working_directory: &Path) -> bool {
        match self {
            CaseSensitivity::Sensitive => false,
            CaseSensitivity::Insensitive => true,
            CaseSensitivity::Auto => probe_case_insensitive(working_directory),
        }
    }
}

fn platform_default_insensitive() -> bool {
    cfg!(any(target_os = "windows", target_os = "macos"))
}

/// Detect a case-insensitive file system by looking up the directory under a
/// case-swapped name.
pub fn probe_case_insensitive(dir: &Path) -> bool {
    let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
        return platform_default_insensitive();
    };
    let swapped: String = name
        .chars()
        .flat_map(|c| {
            if c.is_lowercase() {
                c.to_uppercase().collect::<Vec<_>>()
            } else {
                c.to_lowercase().collect::<Vec<_>>()
            }
        })
        .collect();
    if swapped == name {
        return platform_default_insensitive();
    }
    let Some(parent) = dir.parent() else {
        return platform_default_insensitive();
    };

    match (std::fs::metadata(dir), std::fs::metadata(parent.join(&swapped))) {
        (Ok(_), Ok(_)) => true,
        (Ok(_), Err(_)) => false,
        _ => platform_default_insensitive(),
    }
}

/// Path relativizer for one host configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relativizer {
    case_insensitive: bool,
    backslash_separators: bool,
}

impl Relativizer {
    /// Create a relativizer using the host's separator convention
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            backslash_separators: cfg!(windows),
        }
    }

    /// Relativizer with the platform's default case behavior
    pub fn host() -> Self {
        Self::new(platform_default_insensitive())
    }

    /// Treat `\` as a path separator (Windows hosts)
    pub fn with_backslash_separators(mut self, enabled: bool) -> Self {
        self.backslash_separators = enabled;
        self
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Make `path` relative to `working_directory`.
    ///
    /// Returns the input unchanged when either argument is empty or when the
    /// path does not live under the working directory. The working directory
    /// itself relativizes to the empty string.
    pub fn relativize(&self, path: &str, working_directory: &str) -> String {
        if path.is_empty() || working_directory.is_empty() {
            return path.to_string();
        }

        let (normalized, working_directory) = if self.backslash_separators {
            (path.replace('\\', "/"), working_directory.replace('\\', "/"))
        } else if !path.starts_with('/') {
            return path.to_string();
        } else {
            (path.to_string(), working_directory.to_string())
        };

        let root = working_directory.trim_end_matches('/');
        let prefix = format!("{}/", root);

        let relative = if self.case_insensitive {
            strip_prefix_folded(&normalized, &prefix)
                .or_else(|| strip_prefix_folded(&normalized, root).filter(|rest| rest.is_empty()))
        } else {
            normalized
                .strip_prefix(prefix.as_str())
                .or_else(|| (normalized == root).then_some(""))
        };

        match relative {
            Some(relative) => relative.to_string(),
            None => path.to_string(),
        }
    }

    /// Cache key for `path`: relativized, then case-folded on insensitive hosts
    pub fn key(&self, path: &str, working_directory: &str) -> String {
        self.fold(&self.relativize(path, working_directory))
    }

    /// Case-fold an already relative path if this host needs it
    pub fn fold(&self, relative: &str) -> String {
        if self.case_insensitive {
            relative.to_lowercase()
        } else {
            relative.to_string()
        }
    }
}

impl Default for Relativizer {
    fn default() -> Self {
        Self::host()
    }
}

/// Relativize with the host's default separator and case conventions
pub fn relativize(path: &str, working_directory: &str) -> String {
    Relativizer::host().relativize(path, working_directory)
}

/// Strip `prefix` from `path` comparing case-folded characters, returning the
/// remainder in its original case.
fn strip_prefix_folded<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = path.char_indices();
    for expected in prefix.chars() {
        match chars.next() {
            Some((_, actual)) if actual.to_lowercase().eq(expected.to_lowercase()) => {}
            _ => return None,
        }
    }
    let rest = chars.next().map(|(idx, _)| idx).unwrap_or(path.len());
    Some(&path[rest..])
}
