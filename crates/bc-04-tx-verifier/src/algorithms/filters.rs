//! Batch filters applied before any check is scheduled.

use crate::domain::{TxHash, VerifierError};
use crate::ports::{Transaction, TransactionPool};
use std::collections::HashSet;
use std::sync::Arc;

/// Drop whitelisted transactions, keeping order.
pub fn filter_whitelisted(
    txs: &[Arc<dyn Transaction>],
    whitelist: &HashSet<TxHash>,
) -> Vec<Arc<dyn Transaction>> {
    txs.iter()
        .filter(|tx| !whitelist.contains(&tx.hash()))
        .cloned()
        .collect()
}

/// Reject a batch with two staking-type transactions for one committee key.
pub fn check_stake_spam(txs: &[Arc<dyn Transaction>]) -> Result<(), VerifierError> {
    let mut seen = HashSet::new();
    for key in txs.iter().filter_map(|tx| tx.staking_key()) {
        if !seen.insert(key) {
            return Err(VerifierError::DuplicateStaking {
                committee_key: key.to_string(),
            });
        }
    }
    Ok(())
}

/// Split into `(validated, new)` by pool status, keeping order.
pub fn partition_validated<P: TransactionPool + ?Sized>(
    txs: &[Arc<dyn Transaction>],
    pool: &P,
) -> (Vec<Arc<dyn Transaction>>, Vec<Arc<dyn Transaction>>) {
    txs.iter()
        .cloned()
        .partition(|tx| pool.is_validated(&tx.hash()))
}
