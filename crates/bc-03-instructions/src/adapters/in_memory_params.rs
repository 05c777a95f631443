//! In-memory params store.

use crate::domain::StoreError;
use crate::ports::outbound::{ParamsBatch, ParamsStore};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Params store backed by process memory.
#[derive(Default)]
pub struct InMemoryParamsStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryParamsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a JSON value.
    pub fn with_json<T: Serialize>(self, key: &str, value: &T) -> Result<Self, StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.values.write().insert(key.to_string(), bytes);
        Ok(self)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl ParamsStore for InMemoryParamsStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn write_batch(&self, batch: ParamsBatch) -> Result<(), StoreError> {
        let mut values = self.values.write();
        debug!(writes = batch.len(), "Params batch applied");
        values.extend(batch);
        Ok(())
    }
}
