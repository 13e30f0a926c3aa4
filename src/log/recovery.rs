//! Log Recovery
//!
//! Rebuilds the entry sequence after a crash.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;

use super::{Frame, LogEntry, LogReader};

/// Handles log recovery after crash
pub struct LogRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the log was truncated (partial writes removed)
    pub was_truncated: bool,
}

impl LogRecovery {
    /// Recover entries from a log file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Skip entries with a bad checksum or undecodable data; a damaged
    ///    header is skipped up to the next valid frame
    /// 3. Truncate a partial write at the end (or trailing damage with no
    ///    valid frame after it)
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<LogEntry>, RecoveryResult)> {
        let (entries, result, torn_at) = Self::scan(path)?;

        if let Some(offset) = torn_at {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(offset)?;
            file.sync_all()?;
            tracing::warn!(offset, path = %path.display(), "Truncated partial log entry");
        }

        Ok((entries, result))
    }

    /// Verify integrity of a log file without modifying it
    ///
    /// `was_truncated` reports whether `recover` would truncate.
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result, _) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> Result<(Vec<LogEntry>, RecoveryResult, Option<u64>)> {
        let mut reader = LogReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();
        let mut torn_at = None;

        while let Some(frame) = reader.next_frame() {
            match frame {
                Frame::Entry(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = result.last_lsn.max(entry.lsn);
                    entries.push(entry);
                }
                Frame::Corrupted { offset, reason } => {
                    result.entries_corrupted += 1;
                    tracing::warn!(offset, %reason, "Skipping corrupted log entry");
                }
                Frame::Torn { offset } => {
                    result.was_truncated = true;
                    torn_at = Some(offset);
                }
            }
        }

        Ok((entries, result, torn_at))
    }
}
