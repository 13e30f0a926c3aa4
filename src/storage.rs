//! Storage Module
//!
//! The facade that composes one [`Memory`] and one [`Encoder`].
//!
//! ## Responsibilities
//! - Translate typed get/set calls into encode/decode + raw byte operations
//! - Tag encoder failures so callers can tell them from backend failures
//! - Serve prefix queries natively when the backend can, by scan otherwise

use std::mem;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Span;

use crate::encoder::{Encoder, JsonEncoder};
use crate::error::{Result, StashError};
use crate::memory::{filter_by_prefix, InMemory, Memory};

/// Typed key-value storage over a pluggable backend and encoder
///
/// ## Error handling
/// - Encoder failures come back as [`StashError::Encode`] /
///   [`StashError::Decode`] (`"encode data: ..."` / `"decode data: ..."`)
/// - Backend errors pass through unchanged
/// - A missing key is never an error
///
/// ## Concurrency
/// Storage takes no locks of its own; sharing it across threads is as safe
/// as the backend is. Replacing the backend or encoder needs `&mut self`
/// or ownership, so it cannot overlap with other calls.
pub struct Storage<M = InMemory, E = JsonEncoder> {
    memory: M,
    encoder: E,
    span: Span,
}

impl Storage {
    /// Storage over an [`InMemory`] backend with the [`JsonEncoder`]
    pub fn new() -> Self {
        Self::with_parts(InMemory::new(), JsonEncoder::new())
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Memory, E: Encoder> Storage<M, E> {
    /// Storage over the given backend and encoder
    pub fn with_parts(memory: M, encoder: E) -> Self {
        Self {
            memory,
            encoder,
            span: tracing::debug_span!("storage"),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the encoder. Bytes already stored are not re-encoded.
    pub fn with_encoder<E2: Encoder>(self, encoder: E2) -> Storage<M, E2> {
        Storage {
            memory: self.memory,
            encoder,
            span: self.span,
        }
    }

    /// Replace the backend. The old backend is dropped without `close()`.
    pub fn with_memory<M2: Memory>(self, memory: M2) -> Storage<M2, E> {
        Storage {
            memory,
            encoder: self.encoder,
            span: self.span,
        }
    }

    /// Use `span` as the logging context for every operation
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Swap in another encoder of the same type, returning the old one
    pub fn set_encoder(&mut self, encoder: E) -> E {
        mem::replace(&mut self.encoder, encoder)
    }

    /// Swap in another backend of the same type, returning the old one
    ///
    /// The old backend is not closed.
    pub fn set_memory(&mut self, memory: M) -> M {
        mem::replace(&mut self.memory, memory)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Look up `key` and decode it into `target`
    ///
    /// Returns whether the key exists. With `target == None` only existence
    /// is checked and the encoder is never called. On a decode failure the
    /// target is left untouched.
    ///
    /// For a pure existence check prefer [`contains`](Self::contains), which
    /// needs no target type; `get_into` with `None` still has to name one.
    pub fn get_into<T>(&self, key: &str, target: Option<&mut T>) -> Result<bool>
    where
        T: DeserializeOwned,
    {
        let _enter = self.span.enter();

        let Some(data) = self.memory.get(key)? else {
            tracing::trace!(key, "miss");
            return Ok(false);
        };

        let Some(target) = target else {
            return Ok(true);
        };

        *target = self.decode(key, &data)?;
        Ok(true)
    }

    /// Look up and decode `key`
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let _enter = self.span.enter();

        match self.memory.get(key)? {
            Some(data) => self.decode(key, &data).map(Some),
            None => Ok(None),
        }
    }

    /// Check whether `key` exists without decoding it
    pub fn contains(&self, key: &str) -> Result<bool> {
        let _enter = self.span.enter();
        Ok(self.memory.get(key)?.is_some())
    }

    /// Encode `value` and store it under `key`
    ///
    /// If encoding fails the backend is not touched, so a previous value
    /// for `key` survives.
    pub fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let _enter = self.span.enter();

        let data = self.encoder.encode(value).map_err(|e| {
            tracing::debug!(key, error = %e, "encode failed");
            StashError::Encode(e)
        })?;

        tracing::trace!(key, bytes = data.len(), "set");
        self.memory.set(key, Bytes::from(data))
    }

    /// Delete `key`, returning whether it existed
    pub fn delete(&self, key: &str) -> Result<bool> {
        let _enter = self.span.enter();
        let existed = self.memory.delete(key)?;
        tracing::trace!(key, existed, "delete");
        Ok(existed)
    }

    /// All keys in first-insertion order
    pub fn keys(&self) -> Result<Vec<String>> {
        let _enter = self.span.enter();
        self.memory.keys()
    }

    /// Keys starting with `prefix`, sorted ascending
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let _enter = self.span.enter();

        match self.memory.as_prefix_aware() {
            Some(native) => native.keys_with_prefix(prefix),
            None => {
                tracing::trace!(prefix, "no native prefix support, scanning keys");
                filter_by_prefix(&self.memory, prefix)
            }
        }
    }

    /// Close the backend
    pub fn close(self) -> Result<()> {
        let _enter = self.span.enter();
        tracing::debug!("closing storage");
        self.memory.close()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The backend
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// The encoder
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, data: &[u8]) -> Result<T> {
        self.encoder.decode(data).map_err(|e| {
            tracing::debug!(key, error = %e, "decode failed");
            StashError::Decode(e)
        })
    }
}
