//! # Outbound Ports
//!
//! String-keyed params storage for sales, sold bonds, loans and dividends.

use crate::domain::StoreError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Writes applied together. Keys are ordered so batches are deterministic.
pub type ParamsBatch = BTreeMap<String, Vec<u8>>;

/// Params storage - outbound port.
pub trait ParamsStore: Send + Sync {
    /// Value at `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Apply every write or none.
    fn write_batch(&self, batch: ParamsBatch) -> Result<(), StoreError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Store with preset values that records batches and can reject them.
#[derive(Clone, Default)]
pub struct MockParamsStore {
    /// Values returned by `get`.
    pub values: BTreeMap<String, Vec<u8>>,
    /// Reject every batch.
    pub fail_writes: bool,
    /// Batches accepted so far.
    pub batches: Arc<Mutex<Vec<ParamsBatch>>>,
}

impl MockParamsStore {
    /// Batches accepted so far.
    pub fn batches(&self) -> Vec<ParamsBatch> {
        self.batches.lock().clone()
    }
}

impl ParamsStore for MockParamsStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn write_batch(&self, batch: ParamsBatch) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Backend("write rejected".to_string()));
        }
        self.batches.lock().push(batch);
        Ok(())
    }
}
