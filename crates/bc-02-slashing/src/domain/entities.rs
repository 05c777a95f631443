//! # Ledger Entities

use serde::{Deserialize, Serialize};
use shared_types::{BeaconHeight, Blacklist, ValidatorKey};

/// Atomic write produced by one beacon block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistBatch {
    /// Height the blacklist is stored at.
    pub height: BeaconHeight,
    /// Validators whose punishment ended and were not punished again.
    pub delete: Vec<ValidatorKey>,
    /// Full blacklist after the block.
    pub blacklist: Blacklist,
}

/// What one beacon block did to the blacklist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistUpdate {
    /// Block height.
    pub height: BeaconHeight,
    /// True when the block closed an epoch and punishments decayed.
    pub epoch_closed: bool,
    /// Entries that reached zero at this block.
    pub finished: Vec<ValidatorKey>,
    /// Finished entries removed from storage.
    pub deleted: Vec<ValidatorKey>,
    /// Punishments carried by this block's swap instructions.
    pub punished: Blacklist,
    /// Blacklist after the block.
    pub blacklist: Blacklist,
}

impl BlacklistUpdate {
    /// True when the block neither punished nor released anybody.
    pub fn is_quiet(&self) -> bool {
        self.punished.is_empty() && self.deleted.is_empty()
    }
}

/// Ledger statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistStats {
    /// Blocks applied.
    pub blocks_processed: u64,
    /// Blocks that closed an epoch.
    pub epochs_closed: u64,
    /// Punishment entries read from swap instructions.
    pub punishments_recorded: u64,
    /// Validators released from storage.
    pub releases: u64,
    /// Entries in the current blacklist.
    pub current_size: usize,
}
