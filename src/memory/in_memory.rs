//! In-process backend
//!
//! Default [`Memory`]: an insertion-ordered map behind a RwLock.

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{Result, StashError};

use super::index::OrderedIndex;
use super::Memory;

/// Process-local, non-durable backend
///
/// ## Concurrency:
/// - Every operation holds the lock for its whole duration, so it is atomic
///   and `keys()` sees a single consistent snapshot
/// - All methods use `&self`
#[derive(Default)]
pub struct InMemory {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    index: OrderedIndex,
    closed: bool,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Memory for InMemory {
    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let state = self.state.read();
        if state.closed {
            return Err(StashError::Closed);
        }
        Ok(state.index.get(key).cloned())
    }

    fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let mut state = self.state.write();
        if state.closed {
            return Err(StashError::Closed);
        }
        state.index.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write();
        if state.closed {
            return Err(StashError::Closed);
        }
        Ok(state.index.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let state = self.state.read();
        if state.closed {
            return Err(StashError::Closed);
        }
        Ok(state.index.keys())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        state.closed = true;
        state.index.clear();
        Ok(())
    }
}
