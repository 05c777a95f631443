//! # BC-04 Transaction Verifier
//!
//! Decides whether a candidate block's transactions are admissible as one
//! batch.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! Transactions are opaque behind [`Transaction`]: the verifier schedules
//! their signature, sanity and chain-state checks on a fixed-size worker
//! pool with a global deadline, then scans the batch for coins spent or
//! created twice. Any failure rejects the whole batch. A timeout is reported
//! separately because it says nothing about validity.
//!
//! ## Module Structure
//!
//! ```text
//! bc-04-tx-verifier/
//! ├── domain/          # Proofs, stages, config, errors
//! ├── algorithms/      # Whitelist, stake spam, partition, double-spend scan
//! ├── ports/           # TxVerifierApi + Transaction and chain views
//! ├── adapters/        # In-memory pool, state DB, snapshot shard view
//! └── service.rs       # TxVerifierService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryStateDb, InMemoryTransactionPool, SnapshotShardView};
pub use algorithms::{
    check_double_spend_in_batch, check_stake_spam, filter_whitelisted, partition_validated,
};
pub use domain::{
    hash_hex, BatchSummary, OutputCoin, Proof, TxCheckError, TxHash, VerificationStage,
    VerifierConfig, VerifierError,
};
pub use ports::{
    BeaconView, ChainContext, ChainRetriever, MockBeaconView, MockChainRetriever,
    MockTransaction, ShardView, Transaction, TransactionPool, TransactionStateDb, TxVerifierApi,
};
pub use service::TxVerifierService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
