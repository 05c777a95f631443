//! In-memory committee store.

use crate::domain::{CommitteeError, CommitteeSnapshot};
use crate::ports::outbound::CommitteeStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ChainId, ValidatorKey};
use std::collections::HashMap;
use tracing::debug;

/// Committee store backed by process memory.
pub struct InMemoryCommitteeStore {
    snapshots: RwLock<HashMap<ChainId, CommitteeSnapshot>>,
}

impl InMemoryCommitteeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the committee and pending queue of one chain.
    pub fn with_committee(
        self,
        chain: ChainId,
        committee: Vec<ValidatorKey>,
        pending: Vec<ValidatorKey>,
    ) -> Self {
        self.snapshots
            .write()
            .insert(chain, CommitteeSnapshot { committee, pending });
        self
    }

    /// Number of chains with a stored snapshot.
    pub fn chain_count(&self) -> usize {
        self.snapshots.read().len()
    }
}

impl Default for InMemoryCommitteeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommitteeStore for InMemoryCommitteeStore {
    async fn load(&self, chain: ChainId) -> Result<CommitteeSnapshot, CommitteeError> {
        Ok(self.snapshots.read().get(&chain).cloned().unwrap_or_default())
    }

    async fn save(
        &self,
        chain: ChainId,
        snapshot: CommitteeSnapshot,
    ) -> Result<(), CommitteeError> {
        debug!(
            %chain,
            committee = snapshot.committee.len(),
            pending = snapshot.pending.len(),
            "Committee snapshot saved"
        );
        self.snapshots.write().insert(chain, snapshot);
        Ok(())
    }

    async fn append_pending(
        &self,
        chain: ChainId,
        validators: Vec<ValidatorKey>,
    ) -> Result<(), CommitteeError> {
        self.snapshots
            .write()
            .entry(chain)
            .or_default()
            .pending
            .extend(validators);
        Ok(())
    }
}
