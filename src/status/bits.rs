//! Status flag vocabulary and classification
//!
//! The cache and the classification predicates work on [`StatusFlags`], a
//! struct of named booleans. The backend's integer encoding ([`RawStatus`])
//! only exists at the gateway boundary.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Integer status encoding used by the backend (libgit2 values)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RawStatus: u32 {
        const INDEX_NEW = 1 << 0;
        const INDEX_MODIFIED = 1 << 1;
        const INDEX_DELETED = 1 << 2;
        const INDEX_RENAMED = 1 << 3;
        const INDEX_TYPECHANGE = 1 << 4;
        const WT_NEW = 1 << 7;
        const WT_MODIFIED = 1 << 8;
        const WT_DELETED = 1 << 9;
        const WT_TYPECHANGE = 1 << 10;
        const IGNORED = 1 << 14;
    }
}

impl RawStatus {
    /// No difference from HEAD
    pub const CURRENT: RawStatus = RawStatus::empty();
}

/// Working-tree and index state of a single path
///
/// `StatusFlags::default()` is CURRENT: the path matches HEAD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags {
    pub wt_new: bool,
    pub wt_modified: bool,
    pub wt_deleted: bool,
    pub wt_typechange: bool,
    pub index_new: bool,
    pub index_modified: bool,
    pub index_deleted: bool,
    pub index_renamed: bool,
    pub index_typechange: bool,
    pub ignored: bool,
}

impl StatusFlags {
    /// The path is unchanged relative to HEAD
    pub const CURRENT: StatusFlags = StatusFlags {
        wt_new: false,
        wt_modified: false,
        wt_deleted: false,
        wt_typechange: false,
        index_new: false,
        index_modified: false,
        index_deleted: false,
        index_renamed: false,
        index_typechange: false,
        ignored: false,
    };

    /// No flag is set
    pub fn is_current(&self) -> bool {
        *self == Self::CURRENT
    }

    /// Untracked, or added to the index
    pub fn is_new(&self) -> bool {
        self.wt_new || self.index_new
    }

    /// Deletion and type changes count as modifications too.
    pub fn is_modified(&self) -> bool {
        self.wt_modified
            || self.index_modified
            || self.wt_deleted
            || self.index_deleted
            || self.wt_typechange
            || self.index_typechange
    }

    /// Any index-side change
    pub fn is_staged(&self) -> bool {
        self.index_new
            || self.index_modified
            || self.index_deleted
            || self.index_renamed
            || self.index_typechange
    }

    /// Deleted from the working tree or the index
    pub fn is_deleted(&self) -> bool {
        self.wt_deleted || self.index_deleted
    }

    /// Excluded by an ignore rule
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Convert to the backend's integer encoding
    pub fn to_raw(self) -> RawStatus {
        let mut raw = RawStatus::CURRENT;
        raw.set(RawStatus::WT_NEW, self.wt_new);
        raw.set(RawStatus::WT_MODIFIED, self.wt_modified);
        raw.set(RawStatus::WT_DELETED, self.wt_deleted);
        raw.set(RawStatus::WT_TYPECHANGE, self.wt_typechange);
        raw.set(RawStatus::INDEX_NEW, self.index_new);
        raw.set(RawStatus::INDEX_MODIFIED, self.index_modified);
        raw.set(RawStatus::INDEX_DELETED, self.index_deleted);
        raw.set(RawStatus::INDEX_RENAMED, self.index_renamed);
        raw.set(RawStatus::INDEX_TYPECHANGE, self.index_typechange);
        raw.set(RawStatus::IGNORED, self.ignored);
        raw
    }

    /// Integer form, for hosts that still expect a bitmask
    pub fn bits(self) -> u32 {
        self.to_raw().bits()
    }

    /// Build from an integer bitmask, dropping bits this crate does not know
    pub fn from_bits_truncate(bits: u32) -> Self {
        RawStatus::from_bits_truncate(bits).into()
    }
}

impl From<RawStatus> for StatusFlags {
    fn from(raw: RawStatus) -> Self {
        Self {
            wt_new: raw.contains(RawStatus::WT_NEW),
            wt_modified: raw.contains(RawStatus::WT_MODIFIED),
            wt_deleted: raw.contains(RawStatus::WT_DELETED),
            wt_typechange: raw.contains(RawStatus::WT_TYPECHANGE),
            index_new: raw.contains(RawStatus::INDEX_NEW),
            index_modified: raw.contains(RawStatus::INDEX_MODIFIED),
            index_deleted: raw.contains(RawStatus::INDEX_DELETED),
            index_renamed: raw.contains(RawStatus::INDEX_RENAMED),
            index_typechange: raw.contains(RawStatus::INDEX_TYPECHANGE),
            ignored: raw.contains(RawStatus::IGNORED),
        }
    }
}

impl From<StatusFlags> for RawStatus {
    fn from(flags: StatusFlags) -> Self {
        flags.to_raw()
    }
}

impl BitOr for StatusFlags {
    type Output = StatusFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            wt_new: self.wt_new || rhs.wt_new,
            wt_modified: self.wt_modified || rhs.wt_modified,
            wt_deleted: self.wt_deleted || rhs.wt_deleted,
            wt_typechange: self.wt_typechange || rhs.wt_typechange,
            index_new: self.index_new || rhs.index_new,
            index_modified: self.index_modified || rhs.index_modified,
            index_deleted: self.index_deleted || rhs.index_deleted,
            index_renamed: self.index_renamed || rhs.index_renamed,
            index_typechange: self.index_typechange || rhs.index_typechange,
            ignored: self.ignored || rhs.ignored,
        }
    }
}

impl BitOrAssign for StatusFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl fmt::Display for StatusFlags {
    /// Two-column `XY` summary in the style of `git status --short`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignored {
            return f.write_str("!!");
        }
        if self.wt_new && !self.is_staged() {
            return f.write_str("??");
        }

        let index = if self.index_new {
            'A'
        } else if self.index_renamed {
            'R'
        } else if self.index_deleted {
            'D'
        } else if self.index_typechange {
            'T'
        } else if self.index_modified {
            'M'
        } else {
            ' '
        };
        let worktree = if self.wt_deleted {
            'D'
        } else if self.wt_typechange {
            'T'
        } else if self.wt_modified {
            'M'
        } else {
            ' '
        };

        write!(f, "{}{}", index, worktree)
    }
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

/// See [`StatusFlags::is_deleted`]
pub fn is_status_deleted(status: StatusFlags) -> bool {
    status.is_deleted()
}

/// See [`StatusFlags::is_ignored`]
pub fn is_status_ignored(status: StatusFlags) -> bool {
    status.is_ignored()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_current_is_default() {
        assert!(StatusFlags::default().is_current());
        assert_eq!(StatusFlags::CURRENT.bits(), 0);
        assert!(!StatusFlags::CURRENT.is_modified());
        assert!(!StatusFlags::CURRENT.is_new());
    }

    #[test]
    fn test_deletion_counts_as_modification() {
        let status = StatusFlags {
            wt_deleted: true,
            ..Default::default()
        };
        assert!(status.is_modified());
        assert!(status.is_deleted());
        assert!(!status.is_staged());
    }

    #[test]
    fn test_modified_and_staged_together() {
        let status = StatusFlags {
            index_modified: true,
            wt_modified: true,
            ..Default::default()
        };
        assert!(status.is_modified());
        assert!(status.is_staged());
        assert!(!status.is_new());
        assert_eq!(status.to_string(), "MM");
    }

    #[test]
    fn test_renamed_is_staged_but_not_modified() {
        let status = StatusFlags {
            index_renamed: true,
            ..Default::default()
        };
        assert!(status.is_staged());
        assert!(!status.is_modified());
    }

    #[test]
    fn test_raw_values_match_backend() {
        let status = StatusFlags {
            wt_modified: true,
            index_new: true,
            ..Default::default()
        };
        assert_eq!(status.bits(), 256 | 1);
        assert!(StatusFlags::from_bits_truncate(16384).ignored);
    }

    #[test]
    fn test_unknown_bits_are_dropped() {
        // 1 << 12 is WT_UNREADABLE in libgit2, which this crate does not track
        assert!(StatusFlags::from_bits_truncate(1 << 12).is_current());
    }

    #[test]
    fn test_display_untracked() {
        let status = StatusFlags {
            wt_new: true,
            ..Default::default()
        };
        assert_eq!(status.to_string(), "??");
    }

    proptest! {
        #[test]
        fn prop_raw_conversion_is_lossless(bits in 0u32..(1 << 15)) {
            let raw = RawStatus::from_bits_truncate(bits);
            let flags = StatusFlags::from(raw);
            prop_assert_eq!(flags.to_raw(), raw);
        }

        #[test]
        fn prop_non_current_is_always_classified(bits in 0u32..(1 << 15)) {
            let flags = StatusFlags::from_bits_truncate(bits);
            let classified = flags.is_new()
                || flags.is_modified()
                || flags.is_staged()
                || flags.is_ignored()
                || flags.is_deleted();
            prop_assert_eq!(classified, !flags.is_current());
        }

        #[test]
        fn prop_bitor_matches_raw_union(a in 0u32..(1 << 15), b in 0u32..(1 << 15)) {
            let merged = StatusFlags::from_bits_truncate(a) | StatusFlags::from_bits_truncate(b);
            prop_assert_eq!(merged.to_raw(), RawStatus::from_bits_truncate(a | b));
        }
    }
}
