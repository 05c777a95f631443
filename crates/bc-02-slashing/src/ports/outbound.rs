//! # Outbound Ports

use crate::domain::{BlacklistBatch, SlashingError};
use parking_lot::Mutex;
use shared_types::{BeaconHeight, Blacklist};
use std::sync::Arc;

/// Blacklist storage - outbound port.
pub trait BlacklistStore: Send + Sync {
    /// Blacklist stored at `height`, if any.
    fn load(&self, height: BeaconHeight) -> Result<Option<Blacklist>, SlashingError>;

    /// Apply a batch atomically: either every part lands or none does.
    fn apply(&self, batch: BlacklistBatch) -> Result<(), SlashingError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Store recording batches, optionally rejecting them.
#[derive(Clone, Default)]
pub struct MockBlacklistStore {
    /// Returned by every `load`.
    pub snapshot: Option<Blacklist>,
    /// Reject every `apply`.
    pub fail_writes: bool,
    /// Batches accepted so far.
    pub applied: Arc<Mutex<Vec<BlacklistBatch>>>,
}

impl MockBlacklistStore {
    /// Batches accepted so far.
    pub fn applied(&self) -> Vec<BlacklistBatch> {
        self.applied.lock().clone()
    }
}

impl BlacklistStore for MockBlacklistStore {
    fn load(&self, _height: BeaconHeight) -> Result<Option<Blacklist>, SlashingError> {
        Ok(self.snapshot.clone())
    }

    fn apply(&self, batch: BlacklistBatch) -> Result<(), SlashingError> {
        if self.fail_writes {
            return Err(SlashingError::Store("write rejected".to_string()));
        }
        self.applied.lock().push(batch);
        Ok(())
    }
}
