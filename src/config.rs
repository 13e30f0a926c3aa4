//! Configuration for the durable backend
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StashError};

/// Configuration for a [`FileMemory`](crate::memory::FileMemory) instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── stash.log        (append-only record log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the log
    pub log_sync_strategy: LogSyncStrategy,

    /// Number of stale records (overwritten or deleted) that triggers a
    /// log rewrite. 0 disables automatic compaction.
    pub compaction_threshold: usize,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./stashkv_data"),
            log_sync_strategy: LogSyncStrategy::EveryNEntries { count: 100 },
            compaction_threshold: 1000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for values the backend cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(StashError::Config("data_dir must not be empty".to_string()));
        }
        if let LogSyncStrategy::EveryNEntries { count: 0 } = self.log_sync_strategy {
            return Err(StashError::Config(
                "EveryNEntries sync strategy needs a count of at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the log sync strategy
    pub fn log_sync_strategy(mut self, strategy: LogSyncStrategy) -> Self {
        self.config.log_sync_strategy = strategy;
        self
    }

    /// Set the stale record count that triggers compaction (0 disables)
    pub fn compaction_threshold(mut self, count: usize) -> Self {
        self.config.compaction_threshold = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
