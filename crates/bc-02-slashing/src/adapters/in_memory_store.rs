//! In-memory blacklist store.
//!
//! Keeps one snapshot per height plus the live per-validator records that
//! deletions act on.

use crate::domain::{BlacklistBatch, SlashingError};
use crate::ports::outbound::BlacklistStore;
use parking_lot::RwLock;
use shared_types::{BeaconHeight, Blacklist, ValidatorKey};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct Inner {
    by_height: BTreeMap<BeaconHeight, Blacklist>,
    records: Blacklist,
}

/// Blacklist store backed by process memory.
#[derive(Default)]
pub struct InMemoryBlacklistStore {
    inner: RwLock<Inner>,
}

impl InMemoryBlacklistStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a snapshot at `height`.
    pub fn with_snapshot(self, height: BeaconHeight, blacklist: Blacklist) -> Self {
        {
            let mut inner = self.inner.write();
            inner.records.extend(blacklist.clone());
            inner.by_height.insert(height, blacklist);
        }
        self
    }

    /// Live record of one validator.
    pub fn record(&self, validator: &ValidatorKey) -> Option<u8> {
        self.inner.read().records.get(validator).copied()
    }

    /// Highest stored height.
    pub fn latest_height(&self) -> Option<BeaconHeight> {
        self.inner.read().by_height.keys().next_back().copied()
    }
}

impl BlacklistStore for InMemoryBlacklistStore {
    fn load(&self, height: BeaconHeight) -> Result<Option<Blacklist>, SlashingError> {
        Ok(self.inner.read().by_height.get(&height).cloned())
    }

    fn apply(&self, batch: BlacklistBatch) -> Result<(), SlashingError> {
        let mut inner = self.inner.write();
        for validator in &batch.delete {
            inner.records.remove(validator);
        }
        inner.records.extend(batch.blacklist.clone());
        debug!(
            height = batch.height,
            deleted = batch.delete.len(),
            size = batch.blacklist.len(),
            "Blacklist batch applied"
        );
        inner.by_height.insert(batch.height, batch.blacklist);
        Ok(())
    }
}
