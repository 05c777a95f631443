//! # Pipeline Errors

use super::metadata::MetadataType;
use shared_types::{InstructionError, ShardId};
use thiserror::Error;

/// Params store failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Stored value could not be decoded.
    #[error("corrupt value at {key}: {reason}")]
    Corrupt {
        /// Params key.
        key: String,
        /// Decode failure.
        reason: String,
    },
}

/// Instruction pipeline errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Structural instruction failure.
    #[error(transparent)]
    Instruction(#[from] InstructionError),

    /// Instruction shorter than its layout requires.
    #[error("{meta} instruction missing field {index}")]
    MissingField {
        /// Instruction type.
        meta: MetadataType,
        /// Missing position.
        index: usize,
    },

    /// Position 2 is neither "accepted" nor "refund".
    #[error("unknown instruction status: {0}")]
    UnknownStatus(String),

    /// Payload could not be decoded.
    #[error("invalid {meta} payload: {reason}")]
    Payload {
        /// Instruction type.
        meta: MetadataType,
        /// Decode failure.
        reason: String,
    },

    /// Crowdsale payment for a sale that does not exist.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// Crowdsale payment larger than what is left.
    #[error("sale {sale_id} exhausted: remaining {remaining}, requested {requested}")]
    SaleExhausted {
        /// Sale.
        sale_id: String,
        /// Remaining amount.
        remaining: u64,
        /// Requested amount.
        requested: u64,
    },

    /// Selling pool cannot cover an accepted purchase.
    #[error("insufficient {pool}: available {available}, requested {requested}")]
    InsufficientSupply {
        /// Pool name.
        pool: &'static str,
        /// Units left.
        available: u64,
        /// Units requested.
        requested: u64,
    },

    /// GOV fund cannot cover an accepted buy-back.
    #[error("insufficient fund: available {available}, requested {requested}")]
    InsufficientFund {
        /// Fund balance.
        available: u64,
        /// Amount requested.
        requested: u64,
    },

    /// Loan id already used.
    #[error("duplicate loan request: {0}")]
    DuplicateLoan(String),

    /// Response to a loan that was never requested.
    #[error("unknown loan: {0}")]
    UnknownLoan(String),

    /// Same board member answered twice.
    #[error("duplicate response from {responder} for loan {loan_id}")]
    DuplicateLoanResponse {
        /// Loan.
        loan_id: String,
        /// Responder.
        responder: String,
    },

    /// Same shard submitted twice for one dividend round.
    #[error("duplicate dividend submission from shard {shard_id} for dividend {dividend_id}")]
    DuplicateDividendSubmission {
        /// Dividend round.
        dividend_id: u64,
        /// Submitting shard.
        shard_id: ShardId,
    },

    /// Arithmetic overflow.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Params store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub(crate) fn payload(meta: MetadataType, err: impl std::fmt::Display) -> Self {
        PipelineError::Payload {
            meta,
            reason: err.to_string(),
        }
    }
}
