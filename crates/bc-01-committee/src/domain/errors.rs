//! # Domain Errors
//!
//! Error types for the committee engine.

use shared_types::{ChainId, InstructionError, ValidatorKey};
use thiserror::Error;

/// Committee engine error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitteeError {
    /// Assignment requested with zero active shards.
    #[error("No active shards to assign candidates to")]
    NoActiveShards,

    /// More active shards than a shard id can address.
    #[error("Too many active shards: {0}")]
    TooManyShards(usize),

    /// Swap offset larger than the current committee.
    #[error("Swap offset {offset} out of range for committee of {committee_size}")]
    OffsetOutOfRange {
        /// Requested offset
        offset: usize,
        /// Current good plus bad producers
        committee_size: usize,
    },

    /// A validator to remove is not in the list.
    #[error("Validator not present: {0}")]
    ValidatorNotPresent(ValidatorKey),

    /// Epoch parameters are inconsistent.
    #[error("Invalid epoch parameters: {0}")]
    InvalidEpochParams(String),

    /// Committee limits are inconsistent.
    #[error("Invalid committee configuration: {0}")]
    InvalidConfig(String),

    /// No committee stored for the chain.
    #[error("Unknown committee: {0}")]
    UnknownCommittee(ChainId),

    /// Swap instruction encoding failed.
    #[error("Instruction error: {0}")]
    Instruction(#[from] InstructionError),

    /// Committee store failure.
    #[error("Store error: {0}")]
    Store(String),
}
