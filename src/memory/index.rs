//! Insertion-ordered key index shared by the backends.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

struct Slot {
    seq: u64,
    value: Bytes,
}

/// Map that remembers the order keys were first inserted in
///
/// Overwriting keeps a key's position; removing and re-inserting moves it
/// to the end.
#[derive(Default)]
pub(crate) struct OrderedIndex {
    entries: HashMap<String, Slot>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl OrderedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Bytes> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite. Returns true if the key was already present.
    pub fn insert(&mut self, key: &str, value: Bytes) -> bool {
        if let Some(slot) = self.entries.get_mut(key) {
            slot.value = value;
            return true;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        self.entries.insert(key.to_string(), Slot { seq, value });
        false
    }

    pub fn remove(&mut self, key: &str) -> Option<Bytes> {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.seq);
        Some(slot.value)
    }

    pub fn keys(&self) -> Vec<String> {
        self.order.values().cloned().collect()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> + '_ {
        self.order.values().filter_map(move |key| {
            self.entries
                .get(key)
                .map(|slot| (key.as_str(), &slot.value))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
