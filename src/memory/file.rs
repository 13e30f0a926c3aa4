//! Durable backend
//!
//! [`Memory`] backed by the append-only record log.
//!
//! ## Layout
//! - Values live in an insertion-ordered in-memory index
//! - A sorted key set answers prefix queries with a range scan
//! - Every mutation is appended to `{data_dir}/stash.log` before it is
//!   applied to the index
//!
//! On open the log is recovered and replayed; once enough records are
//! stale the log is rewritten with only the live entries.

use std::collections::BTreeSet;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, StashError};
use crate::log::{LogRecovery, LogWriter, Operation, RecoveryResult};

use super::index::OrderedIndex;
use super::{Memory, PrefixAwareMemory};

/// Log-structured, durable backend
///
/// ## Concurrency:
/// - Reads take the read lock and never touch the file
/// - Writes take the write lock for the append and the index update, so
///   the log order matches the order mutations become visible
pub struct FileMemory {
    config: Config,
    log_path: PathBuf,
    recovery: RecoveryResult,
    state: RwLock<FileState>,
}

struct FileState {
    index: OrderedIndex,
    sorted: BTreeSet<String>,

    /// `None` once closed
    writer: Option<LogWriter>,

    /// Records currently in the log file, live or stale
    log_records: usize,
}

impl FileState {
    fn writer(&mut self) -> Result<&mut LogWriter> {
        self.writer.as_mut().ok_or(StashError::Closed)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.writer.is_none() {
            return Err(StashError::Closed);
        }
        Ok(())
    }

    fn stale_records(&self) -> usize {
        self.log_records.saturating_sub(self.index.len())
    }
}

impl FileMemory {
    const LOG_FILENAME: &'static str = "stash.log";
    const COMPACT_FILENAME: &'static str = "stash.log.compact";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Recover the log if it exists (truncating a torn tail)
    /// 3. Replay entries into the index
    /// 4. Open the log for appending
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let log_path = config.data_dir.join(Self::LOG_FILENAME);

        let mut index = OrderedIndex::new();
        let mut sorted = BTreeSet::new();

        let (log_records, recovery) = if log_path.exists() {
            let (entries, recovery) = LogRecovery::recover(&log_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    recovered = recovery.entries_recovered,
                    corrupted = recovery.entries_corrupted,
                    last_lsn = recovery.last_lsn,
                    truncated = recovery.was_truncated,
                    "Log recovery complete"
                );
            }

            let count = entries.len();
            for entry in entries {
                match entry.operation {
                    Operation::Set { key, value } => {
                        if !index.insert(&key, Bytes::from(value)) {
                            sorted.insert(key);
                        }
                    }
                    Operation::Delete { key } => {
                        index.remove(&key);
                        sorted.remove(&key);
                    }
                }
            }
            (count, recovery)
        } else {
            (0, RecoveryResult::default())
        };

        let writer = LogWriter::open(&log_path, config.log_sync_strategy, recovery.last_lsn)?;

        let memory = Self {
            config,
            log_path,
            recovery,
            state: RwLock::new(FileState {
                index,
                sorted,
                writer: Some(writer),
                log_records,
            }),
        };

        memory.maybe_compact(&mut memory.state.write());
        Ok(memory)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Rewrite the log so it holds only live entries, in insertion order
    pub fn compact(&self) -> Result<()> {
        let mut state = self.state.write();
        self.rewrite_log(&mut state)
    }

    /// Force buffered log entries to disk
    pub fn sync(&self) -> Result<()> {
        self.state.write().writer()?.sync()
    }

    /// Compact once the stale count reaches the threshold
    ///
    /// Failures are logged and not returned: the mutation that got here is
    /// already durable, and the next one tries again.
    fn maybe_compact(&self, state: &mut FileState) {
        let threshold = self.config.compaction_threshold;
        if threshold == 0 || state.stale_records() < threshold {
            return;
        }
        if let Err(e) = self.rewrite_log(state) {
            tracing::warn!(
                error = %e,
                stale = state.stale_records(),
                "Automatic compaction failed, will retry"
            );
        }
    }

    fn rewrite_log(&self, state: &mut FileState) -> Result<()> {
        state.writer()?.sync()?;
        let stale = state.stale_records();

        // Write live entries to a side file; the current log and writer stay
        // in place until the rename succeeds.
        let compact_path = self.config.data_dir.join(Self::COMPACT_FILENAME);
        let fresh = match self.write_live_entries(&compact_path, state) {
            Ok(fresh) => fresh,
            Err(e) => {
                let _ = fs::remove_file(&compact_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&compact_path, &self.log_path) {
            drop(fresh);
            let _ = fs::remove_file(&compact_path);
            return Err(e.into());
        }

        // The side file's handle now refers to the renamed log
        state.writer = Some(fresh);
        state.log_records = state.index.len();
        tracing::info!(
            live = state.log_records,
            dropped = stale,
            path = %self.log_path.display(),
            "Compacted log"
        );
        Ok(())
    }

    fn write_live_entries(&self, path: &Path, state: &FileState) -> Result<LogWriter> {
        let mut fresh = LogWriter::create(path, self.config.log_sync_strategy)?;
        for (key, value) in state.index.iter() {
            fresh.append(Operation::Set {
                key: key.to_string(),
                value: value.to_vec(),
            })?;
        }
        fresh.sync()?;
        Ok(fresh)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Path of the record log
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// What recovery found when this store was opened
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Records in the log that no longer describe a live entry
    pub fn stale_records(&self) -> usize {
        self.state.read().stale_records()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Memory for FileMemory {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state.index.get(key).cloned())
    }

    fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let mut state = self.state.write();
        state.writer()?.append(Operation::Set {
            key: key.to_string(),
            value: value.to_vec(),
        })?;

        state.log_records += 1;
        if !state.index.insert(key, value) {
            state.sorted.insert(key.to_string());
        }

        self.maybe_compact(&mut state);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write();
        state.ensure_open()?;
        if !state.index.contains_key(key) {
            return Ok(false);
        }

        state.writer()?.append(Operation::Delete {
            key: key.to_string(),
        })?;

        state.log_records += 1;
        state.index.remove(key);
        state.sorted.remove(key);

        self.maybe_compact(&mut state);
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state.index.keys())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        if let Some(mut writer) = state.writer.take() {
            writer.sync()?;
            tracing::debug!(last_lsn = writer.current_lsn(), "Closed log");
        }
        Ok(())
    }

    fn as_prefix_aware(&self) -> Option<&dyn PrefixAwareMemory> {
        Some(self)
    }
}

impl PrefixAwareMemory for FileMemory {
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        state.ensure_open()?;

        let keys = state
            .sorted
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        Ok(keys)
    }
}
