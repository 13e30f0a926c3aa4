//! # stashkv
//!
//! A small key-value storage facade with:
//! - Typed get/set over pluggable value encoders (JSON, bincode)
//! - Pluggable byte backends (in-process map, durable record log)
//! - Insertion-ordered key listing and sorted prefix queries
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Storage                               │
//! │          (get / set / delete / keys / keys_with_prefix)      │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!         ┌─────────────┐                 ┌─────────────┐
//!         │   Encoder   │                 │   Memory    │
//!         │ JSON/bincode│                 │  (bytes)    │
//!         └─────────────┘                 └──────┬──────┘
//!                                                │
//!                                   ┌────────────┴────────────┐
//!                                   ▼                         ▼
//!                            ┌─────────────┐          ┌─────────────┐
//!                            │  InMemory   │          │ FileMemory  │
//!                            │  (RwLock)   │          │ (log+index) │
//!                            └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use stashkv::Storage;
//!
//! let store = Storage::new();
//! store.set("greeting", "hello").unwrap();
//!
//! let value: Option<String> = store.get("greeting").unwrap();
//! assert_eq!(value.as_deref(), Some("hello"));
//! assert_eq!(store.keys().unwrap(), vec!["greeting"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod encoder;
pub mod log;
pub mod memory;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CodecError, Result, StashError};
pub use config::{Config, LogSyncStrategy};
pub use encoder::{BincodeEncoder, Encoder, JsonEncoder};
pub use memory::{FileMemory, InMemory, Memory, PrefixAwareMemory};
pub use storage::Storage;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of stashkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
