//! # Verifier Errors

use super::entities::VerificationStage;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a transaction's own checks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TxCheckError {
    /// Signature does not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// Transaction is malformed or inconsistent.
    #[error("sanity check failed: {0}")]
    Sanity(String),

    /// Transaction conflicts with the chain.
    #[error("chain-state check failed: {0}")]
    ChainState(String),

    /// An input was already spent on chain.
    #[error("input already spent on chain")]
    SpentOnChain,

    /// A referenced commitment is not in the state DB.
    #[error("commitment not found: {0}")]
    MissingCommitment(String),
}

/// Batch verification errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifierError {
    /// Not every check finished before the deadline. The batch is undecided,
    /// not invalid.
    #[error("verification of {tx_count} transactions timed out after {deadline:?}")]
    Timeout {
        /// Transactions in the batch after filtering.
        tx_count: usize,
        /// Deadline that expired.
        deadline: Duration,
    },

    /// A transaction failed one of its checks.
    #[error("invalid transaction {tx_hash} at {stage} stage: {source}")]
    InvalidTransaction {
        /// Hex transaction hash.
        tx_hash: String,
        /// Stage that failed.
        stage: VerificationStage,
        /// Failure reported by the transaction.
        source: TxCheckError,
    },

    /// Two transactions of the batch spend or create the same coin.
    #[error("batch contains double spend in transaction {tx_hash}")]
    DoubleSpendInBatch {
        /// Hex hash of the transaction that repeated a coin.
        tx_hash: String,
    },

    /// Two staking-type transactions target the same committee key.
    #[error("batch contains repeated stake/unstake/stop-auto-stake for key {committee_key}")]
    DuplicateStaking {
        /// Committee public key.
        committee_key: String,
    },

    /// Commitments could not be preloaded.
    #[error("cannot load commitment of transaction {tx_hash}: {source}")]
    CommitmentLoad {
        /// Hex transaction hash.
        tx_hash: String,
        /// Failure reported by the transaction.
        source: TxCheckError,
    },

    /// A worker died before reporting.
    #[error("verification worker failed: {0}")]
    WorkerFailed(String),

    /// Configuration rejected.
    #[error("invalid verifier config: {0}")]
    InvalidConfig(String),
}

impl VerifierError {
    /// True when the batch ran out of time rather than failing a check.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout() {
        let timeout = VerifierError::Timeout {
            tx_count: 3,
            deadline: Duration::from_secs(10),
        };
        assert!(timeout.is_timeout());
        assert!(!VerifierError::DoubleSpendInBatch {
            tx_hash: "ab".into()
        }
        .is_timeout());
    }

    #[test]
    fn test_error_messages() {
        let err = VerifierError::InvalidTransaction {
            tx_hash: "beef".into(),
            stage: VerificationStage::Signature,
            source: TxCheckError::InvalidSignature,
        };
        let msg = err.to_string();
        assert!(msg.contains("beef"));
        assert!(msg.contains("signature stage"));

        let err = VerifierError::DuplicateStaking {
            committee_key: "k1".into(),
        };
        assert!(err.to_string().contains("k1"));
    }
}
