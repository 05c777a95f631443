//! # Verification Entities

use serde::{Deserialize, Serialize};
use shared_types::Hash;
use std::fmt;

/// Transaction hash.
pub type TxHash = Hash;

/// Lowercase hex form used in logs and errors.
pub fn hash_hex(hash: &TxHash) -> String {
    hex::encode(hash)
}

/// An output coin as seen by the in-batch double-spend scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCoin {
    /// One-time derivation value identifying the coin.
    pub coin_id: Hash,
    /// Receiver public key.
    pub public_key: Vec<u8>,
}

/// Coins a proof spends and creates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Serial numbers of spent coins.
    pub input_serials: Vec<Hash>,
    /// Created coins.
    pub output_coins: Vec<OutputCoin>,
}

/// Verification step a transaction passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStage {
    /// Commitment preload from the shard state DB.
    Commitment,
    /// Signature check.
    Signature,
    /// Chain-state independent sanity and correctness.
    Sanity,
    /// Sanity against the chain plus double spend against stored state.
    ChainState,
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commitment => "commitment",
            Self::Signature => "signature",
            Self::Sanity => "sanity",
            Self::ChainState => "chain-state",
        };
        f.write_str(name)
    }
}

/// How a batch moved through the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Transactions handed in.
    pub received: usize,
    /// Dropped by the whitelist before any check.
    pub whitelisted: usize,
    /// Already validated by the pool.
    pub pool_validated: usize,
    /// Not yet seen by the pool.
    pub new: usize,
    /// Worker jobs executed.
    pub jobs: usize,
    /// Chain-state checks skipped by the bypass list.
    pub bypassed: usize,
}

impl BatchSummary {
    /// Transactions that went through verification.
    pub fn checked(&self) -> usize {
        self.received - self.whitelisted
    }
}
