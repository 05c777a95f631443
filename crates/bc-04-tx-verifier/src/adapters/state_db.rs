//! In-memory transaction state and a shard view serving private copies.

use crate::ports::{ShardView, TransactionStateDb};
use parking_lot::RwLock;
use shared_types::{BeaconHeight, Hash, ShardId};
use std::collections::HashSet;
use std::sync::Arc;

/// Transaction state held in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryStateDb {
    commitments: HashSet<Hash>,
    serial_numbers: HashSet<Hash>,
    output_coins: HashSet<Hash>,
}

impl InMemoryStateDb {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a commitment.
    pub fn add_commitment(&mut self, commitment: Hash) {
        self.commitments.insert(commitment);
    }

    /// Mark a serial number spent.
    pub fn add_serial_number(&mut self, serial: Hash) {
        self.serial_numbers.insert(serial);
    }

    /// Store an output coin.
    pub fn add_output_coin(&mut self, coin_id: Hash) {
        self.output_coins.insert(coin_id);
    }
}

impl TransactionStateDb for InMemoryStateDb {
    fn has_commitment(&self, commitment: &Hash) -> bool {
        self.commitments.contains(commitment)
    }

    fn has_serial_number(&self, serial: &Hash) -> bool {
        self.serial_numbers.contains(serial)
    }

    fn has_output_coin(&self, coin_id: &Hash) -> bool {
        self.output_coins.contains(coin_id)
    }
}

/// Shard view over a live state DB. Readers get a snapshot copy, so later
/// writes never reach a verification already in flight.
pub struct SnapshotShardView {
    shard_id: ShardId,
    beacon_height: BeaconHeight,
    state: RwLock<InMemoryStateDb>,
}

impl SnapshotShardView {
    /// View of `state` for `shard_id`.
    pub fn new(shard_id: ShardId, beacon_height: BeaconHeight, state: InMemoryStateDb) -> Self {
        Self {
            shard_id,
            beacon_height,
            state: RwLock::new(state),
        }
    }

    /// Mutate the live state.
    pub fn update(&self, f: impl FnOnce(&mut InMemoryStateDb)) {
        f(&mut self.state.write());
    }
}

impl ShardView for SnapshotShardView {
    fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    fn beacon_height(&self) -> BeaconHeight {
        self.beacon_height
    }

    fn copied_state_db(&self) -> Arc<dyn TransactionStateDb> {
        Arc::new(self.state.read().clone())
    }
}
