//! # Core Domain Entities
//!
//! Identity and chain-position types used across the committee engine,
//! the slashing ledger, the instruction pipeline and the verifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A 32-byte hash (transaction hash, coin id, serial number).
pub type Hash = [u8; 32];

/// Validator identity: the encoded committee public key.
pub type ValidatorKey = String;

/// Shard index. The protocol never runs more than 256 shards.
pub type ShardId = u8;

/// Height on the beacon chain.
pub type BeaconHeight = u64;

/// Epoch number (epoch 1 starts at beacon height 1).
pub type Epoch = u64;

/// Maximum number of shards addressable by a [`ShardId`].
pub const MAX_SHARD_NUMBER: usize = 256;

/// Producer blacklist: validator -> remaining punished epochs.
///
/// Ordered so that serialised snapshots are byte-identical across nodes.
pub type Blacklist = BTreeMap<ValidatorKey, u8>;

/// The chain a committee produces blocks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainId {
    /// The coordinating beacon chain.
    Beacon,
    /// One of the shard chains.
    Shard(ShardId),
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Beacon => write!(f, "beacon"),
            ChainId::Shard(id) => write!(f, "shard-{}", id),
        }
    }
}

/// Hex rendering of a hash for logs and error messages.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}
