//! In-memory transaction pool index.

use crate::domain::{hash_hex, TxHash};
use crate::ports::TransactionPool;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::debug;

/// Hashes of transactions the pool has fully validated.
#[derive(Default)]
pub struct InMemoryTransactionPool {
    validated: RwLock<HashSet<TxHash>>,
}

impl InMemoryTransactionPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool that already validated `hashes`.
    pub fn with_validated(hashes: impl IntoIterator<Item = TxHash>) -> Self {
        Self {
            validated: RwLock::new(hashes.into_iter().collect()),
        }
    }

    /// Record a validated transaction.
    pub fn mark_validated(&self, tx_hash: TxHash) {
        debug!(tx_hash = %hash_hex(&tx_hash), "Transaction marked validated");
        self.validated.write().insert(tx_hash);
    }

    /// Forget a transaction, e.g. once it is included in a block.
    pub fn evict(&self, tx_hash: &TxHash) -> bool {
        self.validated.write().remove(tx_hash)
    }

    /// Validated transaction count.
    pub fn len(&self) -> usize {
        self.validated.read().len()
    }

    /// True when nothing is validated.
    pub fn is_empty(&self) -> bool {
        self.validated.read().is_empty()
    }
}

impl TransactionPool for InMemoryTransactionPool {
    fn is_validated(&self, tx_hash: &TxHash) -> bool {
        self.validated.read().contains(tx_hash)
    }
}
