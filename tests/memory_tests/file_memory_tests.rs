//! Tests for FileMemory
//!
//! These tests verify:
//! - Directory and log creation
//! - Persistence across reopen (values, order, deletes)
//! - Recovery from a torn log tail and from a damaged frame header
//! - Automatic and explicit compaction, including failed compactions
//! - Close behavior

use std::fs::{self, OpenOptions};
use std::io::Write;

use bytes::Bytes;
use stashkv::{Config, FileMemory, LogSyncStrategy, Memory, PrefixAwareMemory, StashError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(temp_dir: &TempDir, compaction_threshold: usize) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .log_sync_strategy(LogSyncStrategy::EveryWrite)
        .compaction_threshold(compaction_threshold)
        .build()
}

fn setup_temp_memory() -> (TempDir, FileMemory) {
    let temp_dir = TempDir::new().unwrap();
    let memory = FileMemory::open(config_for(&temp_dir, 0)).unwrap();
    (temp_dir, memory)
}

fn reopen(temp_dir: &TempDir, compaction_threshold: usize) -> FileMemory {
    FileMemory::open(config_for(temp_dir, compaction_threshold)).unwrap()
}

fn value(s: &'static str) -> Bytes {
    Bytes::from_static(s.as_bytes())
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_log() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mystash");

    let memory = FileMemory::open(Config::builder().data_dir(&data_dir).build()).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("stash.log").exists());
    assert_eq!(memory.log_path(), data_dir.join("stash.log"));
    assert!(memory.is_empty());
}

#[test]
fn test_open_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .log_sync_strategy(LogSyncStrategy::EveryNEntries { count: 0 })
        .build();

    assert!(matches!(FileMemory::open(config), Err(StashError::Config(_))));
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_set_get_delete() {
    let (_temp, memory) = setup_temp_memory();

    memory.set("hello", value("world")).unwrap();
    assert_eq!(memory.get("hello").unwrap(), Some(value("world")));

    assert!(memory.delete("hello").unwrap());
    assert!(!memory.delete("hello").unwrap());
    assert_eq!(memory.get("hello").unwrap(), None);
}

#[test]
fn test_delete_absent_key_does_not_grow_log() {
    let (_temp, memory) = setup_temp_memory();
    memory.set("key", value("v")).unwrap();
    let size_before = fs::metadata(memory.log_path()).unwrap().len();

    assert!(!memory.delete("other").unwrap());

    assert_eq!(fs::metadata(memory.log_path()).unwrap().len(), size_before);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_values_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let memory = reopen(&temp_dir, 0);
        memory.set("a", value("1")).unwrap();
        memory.set("b", value("2")).unwrap();
        memory.close().unwrap();
    }

    let memory = reopen(&temp_dir, 0);
    assert_eq!(memory.get("a").unwrap(), Some(value("1")));
    assert_eq!(memory.get("b").unwrap(), Some(value("2")));
    assert_eq!(memory.recovery().entries_recovered, 2);
    assert_eq!(memory.recovery().last_lsn, 2);
}

#[test]
fn test_order_and_deletes_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let memory = reopen(&temp_dir, 0);
        for key in ["c", "a", "b"] {
            memory.set(key, value("x")).unwrap();
        }
        memory.set("a", value("y")).unwrap();
        memory.delete("c").unwrap();
        memory.set("c", value("z")).unwrap();
        memory.delete("b").unwrap();
    }

    let memory = reopen(&temp_dir, 0);
    assert_eq!(memory.keys().unwrap(), vec!["a", "c"]);
    assert_eq!(memory.get("a").unwrap(), Some(value("y")));
    assert_eq!(memory.get("b").unwrap(), None);
    assert_eq!(memory.keys_with_prefix("").unwrap(), vec!["a", "c"]);
}

#[test]
fn test_appends_continue_lsn_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let memory = reopen(&temp_dir, 0);
        memory.set("a", value("1")).unwrap();
    }
    {
        let memory = reopen(&temp_dir, 0);
        memory.set("b", value("2")).unwrap();
    }

    let memory = reopen(&temp_dir, 0);
    assert_eq!(memory.recovery().last_lsn, 2);
    assert_eq!(memory.keys().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_torn_tail_is_dropped_on_open() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("stash.log");
    {
        let memory = reopen(&temp_dir, 0);
        memory.set("kept", value("yes")).unwrap();
    }
    let clean_len = fs::metadata(&log_path).unwrap().len();

    // Simulate a crash in the middle of writing a frame
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    file.write_all(&[0, 0, 0, 0, 0, 0, 0, 2, 0xde, 0xad]).unwrap();
    drop(file);

    let memory = reopen(&temp_dir, 0);
    assert!(memory.recovery().was_truncated);
    assert_eq!(memory.keys().unwrap(), vec!["kept"]);
    assert_eq!(fs::metadata(&log_path).unwrap().len(), clean_len);

    memory.set("after", value("crash")).unwrap();
    drop(memory);

    let memory = reopen(&temp_dir, 0);
    assert!(!memory.recovery().was_truncated);
    assert_eq!(memory.keys().unwrap(), vec!["kept", "after"]);
}

#[test]
fn test_damaged_length_field_keeps_later_records() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("stash.log");
    {
        let memory = reopen(&temp_dir, 0);
        for key in ["k1", "k2", "k3", "k4"] {
            memory.set(key, value("v")).unwrap();
        }
    }

    let mut bytes = fs::read(&log_path).unwrap();
    bytes[11] ^= 0x7f;
    fs::write(&log_path, &bytes).unwrap();

    let memory = reopen(&temp_dir, 0);
    assert_eq!(memory.recovery().entries_corrupted, 1);
    assert_eq!(memory.recovery().entries_recovered, 3);
    assert!(!memory.recovery().was_truncated);
    assert_eq!(memory.keys().unwrap(), vec!["k2", "k3", "k4"]);
    assert_eq!(fs::metadata(&log_path).unwrap().len(), bytes.len() as u64);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_stale_records_counted() {
    let (_temp, memory) = setup_temp_memory();

    memory.set("a", value("1")).unwrap();
    memory.set("a", value("2")).unwrap();
    memory.set("b", value("3")).unwrap();
    memory.delete("b").unwrap();

    // one overwrite + (set, delete) of b
    assert_eq!(memory.stale_records(), 3);
}

#[test]
fn test_explicit_compaction_shrinks_log() {
    let (_temp, memory) = setup_temp_memory();

    for i in 0..20 {
        memory.set("hot", Bytes::from(format!("v{}", i))).unwrap();
    }
    memory.set("cold", value("c")).unwrap();
    let before = fs::metadata(memory.log_path()).unwrap().len();

    memory.compact().unwrap();

    let after = fs::metadata(memory.log_path()).unwrap().len();
    assert!(after < before);
    assert_eq!(memory.stale_records(), 0);
    assert_eq!(memory.get("hot").unwrap(), Some(value("v19")));
    assert_eq!(memory.keys().unwrap(), vec!["hot", "cold"]);
}

#[test]
fn test_compaction_preserves_state_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let memory = reopen(&temp_dir, 0);
        for key in ["x", "y", "z"] {
            memory.set(key, value("1")).unwrap();
        }
        memory.delete("x").unwrap();
        memory.set("x", value("2")).unwrap();
        memory.compact().unwrap();
        memory.set("w", value("3")).unwrap();
    }

    let memory = reopen(&temp_dir, 0);
    assert_eq!(memory.keys().unwrap(), vec!["y", "z", "x", "w"]);
    assert_eq!(memory.get("x").unwrap(), Some(value("2")));
    assert_eq!(memory.recovery().entries_recovered, 4);
    assert!(!temp_dir.path().join("stash.log.compact").exists());
}

#[test]
fn test_automatic_compaction_at_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let memory = reopen(&temp_dir, 5);

    memory.set("key", value("0")).unwrap();
    for _ in 0..4 {
        memory.set("key", value("n")).unwrap();
    }
    assert_eq!(memory.stale_records(), 4);

    memory.set("key", value("last")).unwrap();

    assert_eq!(memory.stale_records(), 0);
    assert_eq!(memory.get("key").unwrap(), Some(value("last")));
}

#[test]
fn test_compaction_on_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let memory = reopen(&temp_dir, 0);
        for _ in 0..10 {
            memory.set("key", value("v")).unwrap();
        }
    }

    let memory = reopen(&temp_dir, 3);
    assert_eq!(memory.recovery().entries_recovered, 10);
    assert_eq!(memory.stale_records(), 0);
    assert_eq!(memory.keys().unwrap(), vec!["key"]);
}

#[test]
fn test_failed_automatic_compaction_does_not_fail_writes() {
    let temp_dir = TempDir::new().unwrap();
    let compact_path = temp_dir.path().join("stash.log.compact");
    fs::create_dir(&compact_path).unwrap();
    let memory = reopen(&temp_dir, 1);

    memory.set("a", value("old")).unwrap();
    memory.set("a", value("new")).unwrap();
    memory.set("b", value("1")).unwrap();
    assert!(memory.delete("b").unwrap());

    assert_eq!(memory.get("a").unwrap(), Some(value("new")));
    assert_eq!(memory.stale_records(), 3);

    // Retried on the next mutation once the side file can be written
    fs::remove_dir(&compact_path).unwrap();
    memory.set("c", value("2")).unwrap();

    assert_eq!(memory.stale_records(), 0);
    assert_eq!(memory.keys().unwrap(), vec!["a", "c"]);
    drop(memory);

    let memory = reopen(&temp_dir, 0);
    assert_eq!(memory.get("a").unwrap(), Some(value("new")));
    assert_eq!(memory.keys().unwrap(), vec!["a", "c"]);
}

#[cfg(unix)]
#[test]
fn test_failed_rename_keeps_store_open() {
    let temp_dir = TempDir::new().unwrap();
    let memory = reopen(&temp_dir, 0);
    memory.set("a", value("1")).unwrap();
    memory.set("a", value("2")).unwrap();

    // Put a directory where the log lives so the rename over it fails
    fs::remove_file(memory.log_path()).unwrap();
    fs::create_dir(memory.log_path()).unwrap();

    assert!(matches!(memory.compact(), Err(StashError::Io(_))));
    assert!(!temp_dir.path().join("stash.log.compact").exists());

    memory.set("b", value("3")).unwrap();
    assert_eq!(memory.get("a").unwrap(), Some(value("2")));
    assert_eq!(memory.keys().unwrap(), vec!["a", "b"]);

    // Once the path is free again compaction writes every live entry
    fs::remove_dir(memory.log_path()).unwrap();
    memory.compact().unwrap();
    drop(memory);

    let memory = reopen(&temp_dir, 0);
    assert_eq!(memory.keys().unwrap(), vec!["a", "b"]);
    assert_eq!(memory.get("a").unwrap(), Some(value("2")));
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_operations_after_close_fail() {
    let (_temp, memory) = setup_temp_memory();
    memory.set("key", value("v")).unwrap();

    memory.close().unwrap();
    memory.close().unwrap();

    assert!(matches!(memory.get("key"), Err(StashError::Closed)));
    assert!(matches!(memory.set("key", value("v")), Err(StashError::Closed)));
    assert!(matches!(memory.delete("key"), Err(StashError::Closed)));
    assert!(matches!(memory.keys(), Err(StashError::Closed)));
    assert!(matches!(memory.keys_with_prefix("k"), Err(StashError::Closed)));
    assert!(matches!(memory.compact(), Err(StashError::Closed)));
}

#[test]
fn test_batched_sync_strategy_persists_on_close() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .log_sync_strategy(LogSyncStrategy::EveryNEntries { count: 100 })
        .build();
    {
        let memory = FileMemory::open(config.clone()).unwrap();
        for i in 0..10 {
            memory.set(&format!("k{}", i), Bytes::new()).unwrap();
        }
        memory.close().unwrap();
    }

    let memory = FileMemory::open(config).unwrap();
    assert_eq!(memory.len(), 10);
}
