//! Memory Module
//!
//! Byte-level backends used by [`Storage`](crate::Storage).
//!
//! ## Responsibilities
//! - Raw key → bytes get/set/delete
//! - Key enumeration in first-insertion order
//! - Optional native prefix queries ([`PrefixAwareMemory`])
//!
//! ## Implementations
//! - [`InMemory`]: process-local map (default)
//! - [`FileMemory`]: durable, backed by the record log; prefix-aware
//!
//! Backends are shared through `&self`; any thread-safety comes from the
//! backend's own locking.

mod file;
mod in_memory;
mod index;

use bytes::Bytes;

use crate::error::Result;

pub use file::FileMemory;
pub use in_memory::InMemory;

/// Byte-oriented key-value backend
pub trait Memory {
    /// Raw bytes stored under `key`, or `None` if absent
    fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Insert or overwrite `key`
    fn set(&self, key: &str, value: Bytes) -> Result<()>;

    /// Remove `key`, returning whether it was present
    fn delete(&self, key: &str) -> Result<bool>;

    /// All present keys in first-insertion order
    fn keys(&self) -> Result<Vec<String>>;

    /// Release backend resources. Calling it again is a no-op.
    fn close(&self) -> Result<()>;

    /// Capability query for native prefix support
    fn as_prefix_aware(&self) -> Option<&dyn PrefixAwareMemory> {
        None
    }
}

/// A backend that can answer prefix queries without a full scan
pub trait PrefixAwareMemory: Memory {
    /// Keys starting with `prefix`, sorted ascending
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Generic prefix query over any backend: scan, filter, sort
pub fn filter_by_prefix<M>(memory: &M, prefix: &str) -> Result<Vec<String>>
where
    M: Memory + ?Sized,
{
    let mut keys: Vec<String> = memory
        .keys()?
        .into_iter()
        .filter(|key| key.starts_with(prefix))
        .collect();
    keys.sort();
    Ok(keys)
}

impl<M: Memory + ?Sized> Memory for Box<M> {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Bytes) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn as_prefix_aware(&self) -> Option<&dyn PrefixAwareMemory> {
        (**self).as_prefix_aware()
    }
}
