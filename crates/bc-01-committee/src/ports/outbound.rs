//! # Outbound Ports
//!
//! Storage the committee engine depends on.

use crate::domain::{CommitteeError, CommitteeSnapshot};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ChainId, ValidatorKey};
use std::sync::Arc;

/// Committee storage - outbound port.
#[async_trait]
pub trait CommitteeStore: Send + Sync {
    /// Load the snapshot of `chain`. Unknown chains load empty.
    async fn load(&self, chain: ChainId) -> Result<CommitteeSnapshot, CommitteeError>;

    /// Replace the snapshot of `chain`.
    async fn save(&self, chain: ChainId, snapshot: CommitteeSnapshot)
        -> Result<(), CommitteeError>;

    /// Append validators to the pending queue of `chain`.
    async fn append_pending(
        &self,
        chain: ChainId,
        validators: Vec<ValidatorKey>,
    ) -> Result<(), CommitteeError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Store that fails every write after `fail_after_writes` successful ones.
#[derive(Clone, Default)]
pub struct MockCommitteeStore {
    /// Snapshot returned for every chain.
    pub snapshot: CommitteeSnapshot,
    /// Successful writes before failing. `None` never fails.
    pub fail_after_writes: Option<usize>,
    /// Writes accepted so far.
    pub writes: Arc<Mutex<usize>>,
}

impl MockCommitteeStore {
    /// Mock returning `snapshot` for every chain.
    pub fn with_snapshot(snapshot: CommitteeSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Writes accepted so far.
    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }

    fn record_write(&self) -> Result<(), CommitteeError> {
        let mut writes = self.writes.lock();
        if let Some(limit) = self.fail_after_writes {
            if *writes >= limit {
                return Err(CommitteeError::Store("write rejected".to_string()));
            }
        }
        *writes += 1;
        Ok(())
    }
}

#[async_trait]
impl CommitteeStore for MockCommitteeStore {
    async fn load(&self, _chain: ChainId) -> Result<CommitteeSnapshot, CommitteeError> {
        Ok(self.snapshot.clone())
    }

    async fn save(
        &self,
        _chain: ChainId,
        _snapshot: CommitteeSnapshot,
    ) -> Result<(), CommitteeError> {
        self.record_write()
    }

    async fn append_pending(
        &self,
        _chain: ChainId,
        _validators: Vec<ValidatorKey>,
    ) -> Result<(), CommitteeError> {
        self.record_write()
    }
}
