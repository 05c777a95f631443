//! # Slashing Errors

use shared_types::{BeaconHeight, InstructionError};
use thiserror::Error;

/// Blacklist ledger errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlashingError {
    /// A swap instruction in the block could not be decoded.
    #[error("malformed swap instruction at index {index}: {source}")]
    MalformedSwap {
        /// Position of the instruction in the block.
        index: usize,
        /// Decode failure.
        source: InstructionError,
    },

    /// Height 0 is genesis and carries no instructions.
    #[error("cannot process blacklist for genesis height")]
    GenesisHeight,

    /// Blocks must be applied in height order.
    #[error("out of order block: expected height {expected}, got {got}")]
    OutOfOrder {
        /// Next height the ledger accepts.
        expected: BeaconHeight,
        /// Height supplied.
        got: BeaconHeight,
    },

    /// Storage failure.
    #[error("blacklist store error: {0}")]
    Store(String),
}
