//! Log Writer
//!
//! Handles appending entries to the log file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::LogSyncStrategy;
use crate::error::Result;

use super::{LogEntry, Operation};

/// Appends entries to the log file
pub struct LogWriter {
    file: BufWriter<File>,
    current_lsn: u64,
    sync_strategy: LogSyncStrategy,
    unsynced: usize,
}

impl LogWriter {
    /// Open or create a log file for appending
    ///
    /// `last_lsn` is the highest LSN already in the file (0 for a new log).
    pub fn open(path: &Path, sync_strategy: LogSyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_file(file, sync_strategy, last_lsn))
    }

    /// Create an empty log file, discarding any existing content
    pub fn create(path: &Path, sync_strategy: LogSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::with_file(file, sync_strategy, 0))
    }

    fn with_file(file: File, sync_strategy: LogSyncStrategy, last_lsn: u64) -> Self {
        Self {
            file: BufWriter::new(file),
            current_lsn: last_lsn,
            sync_strategy,
            unsynced: 0,
        }
    }

    /// Append an operation to the log, returning its LSN
    ///
    /// The frame is handed to the OS before returning; fsync follows the
    /// sync strategy.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let frame = LogEntry::new(lsn, operation).serialize()?;

        self.file.write_all(&frame)?;
        self.file.flush()?;
        self.current_lsn = lsn;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            LogSyncStrategy::EveryWrite => true,
            LogSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Number of appended entries not yet fsynced
    pub fn unsynced(&self) -> usize {
        self.unsynced
    }
}
