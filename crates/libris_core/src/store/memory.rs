//! In-memory record store.
//!
//! Records are kept as encoded JSON values so the store exercises the same
//! serde paths as the file store. Clones share state, which lets a caller
//! keep a handle for inspection after handing the store to a registry.

use super::{Collection, RecordStore, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<Collection, Value>,
    rejected: BTreeSet<Collection>,
    writes: BTreeMap<Collection, usize>,
}

/// Shared-handle in-memory store with write counting and write rejection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `records` without counting a write.
    pub fn seed<T: Serialize>(&self, collection: Collection, records: &[T]) -> StoreResult<()> {
        let value = serde_json::to_value(records)
            .map_err(|source| StoreError::Encode { collection, source })?;
        self.seed_raw(collection, value);
        Ok(())
    }

    /// Stores an arbitrary JSON value, e.g. to simulate a malformed file.
    pub fn seed_raw(&self, collection: Collection, value: Value) {
        self.state.borrow_mut().collections.insert(collection, value);
    }

    /// Makes every following `replace_all` on `collection` fail.
    pub fn reject_writes(&self, collection: Collection) {
        self.state.borrow_mut().rejected.insert(collection);
    }

    pub fn accept_writes(&self, collection: Collection) {
        self.state.borrow_mut().rejected.remove(&collection);
    }

    /// Number of successful `replace_all` calls on `collection`.
    pub fn write_count(&self, collection: Collection) -> usize {
        self.state
            .borrow()
            .writes
            .get(&collection)
            .copied()
            .unwrap_or(0)
    }
}

impl RecordStore for MemoryStore {
    fn load_all<T: DeserializeOwned>(&self, collection: Collection) -> StoreResult<Vec<T>> {
        let state = self.state.borrow();
        match state.collections.get(&collection) {
            Some(value) => Vec::<T>::deserialize(value)
                .map_err(|source| StoreError::Decode { collection, source }),
            None => Ok(Vec::new()),
        }
    }

    fn replace_all<T: Serialize>(&self, collection: Collection, records: &[T]) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if state.rejected.contains(&collection) {
            return Err(StoreError::WriteRejected(collection));
        }
        let value = serde_json::to_value(records)
            .map_err(|source| StoreError::Encode { collection, source })?;
        state.collections.insert(collection, value);
        *state.writes.entry(collection).or_insert(0) += 1;
        Ok(())
    }
}
