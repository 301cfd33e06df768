//! Parser for `git status --porcelain=v1 -z`
//!
//! Each record is `XY <path>\0`. Renames and copies, on either the index or
//! the worktree side, are followed by a second NUL-terminated field holding
//! the original path.

use crate::error::{BackendError, Result};
use crate::status::RawStatus;

use super::StatusEntry;

/// Parse NUL-separated porcelain v1 output
pub fn parse_porcelain(output: &[u8]) -> Result<Vec<StatusEntry>> {
    let mut entries = Vec::new();
    let mut fields = output.split(|b| *b == 0).filter(|f| !f.is_empty());

    while let Some(record) = fields.next() {
        if record.len() < 4 || record[2] != b' ' {
            return Err(BackendError::Parse(format!(
                "malformed status record: {:?}",
                String::from_utf8_lossy(record)
            ))
            .into());
        }

        let (index, worktree) = (record[0], record[1]);
        let path = String::from_utf8_lossy(&record[3..]).into_owned();

        if matches!(index, b'R' | b'C') || matches!(worktree, b'R' | b'C') {
            // Original path of the rename or copy
            fields.next();
        }

        let status = status_from_codes(index, worktree);
        entries.push(StatusEntry::new(path, status));
    }

    Ok(entries)
}

/// Map a porcelain `XY` pair to backend status flags
pub fn status_from_codes(index: u8, worktree: u8) -> RawStatus {
    match (index, worktree) {
        (b'?', b'?') => return RawStatus::WT_NEW,
        (b'!', b'!') => return RawStatus::IGNORED,
        (b'U', _) | (_, b'U') | (b'A', b'A') | (b'D', b'D') => {
            return RawStatus::WT_MODIFIED | RawStatus::INDEX_MODIFIED;
        }
        _ => {}
    }

    let mut status = match index {
        b'M' => RawStatus::INDEX_MODIFIED,
        b'A' | b'C' => RawStatus::INDEX_NEW,
        b'D' => RawStatus::INDEX_DELETED,
        b'R' => RawStatus::INDEX_RENAMED,
        b'T' => RawStatus::INDEX_TYPECHANGE,
        _ => RawStatus::CURRENT,
    };

    status |= match worktree {
        b'M' => RawStatus::WT_MODIFIED,
        b'D' => RawStatus::WT_DELETED,
        b'T' => RawStatus::WT_TYPECHANGE,
        // Worktree-side renames and copies only happen for intent-to-add paths
        b'A' | b'R' | b'C' => RawStatus::WT_NEW,
        _ => RawStatus::CURRENT,
    };

    status
}
