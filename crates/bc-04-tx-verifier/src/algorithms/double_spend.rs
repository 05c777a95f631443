//! In-batch double-spend scan.
//!
//! Serial numbers and output coin ids share one seen-set across the whole
//! batch, main and token proofs alike. A repeated output paying a burning
//! address is allowed; any other repeat fails the batch.

use crate::domain::{hash_hex, Proof, VerifierError};
use crate::ports::Transaction;
use shared_types::Hash;
use std::collections::HashSet;
use std::sync::Arc;

/// Fail on the first transaction that repeats a coin seen earlier in the batch.
pub fn check_double_spend_in_batch(
    txs: &[Arc<dyn Transaction>],
    is_burning_address: impl Fn(&[u8]) -> bool,
) -> Result<(), VerifierError> {
    let mut seen: HashSet<Hash> = HashSet::new();
    for tx in txs {
        for proof in tx.proof().into_iter().chain(tx.token_proof()) {
            if !record_proof(proof, &mut seen, &is_burning_address) {
                return Err(VerifierError::DoubleSpendInBatch {
                    tx_hash: hash_hex(&tx.hash()),
                });
            }
        }
    }
    Ok(())
}

/// False when `proof` repeats a coin.
fn record_proof(
    proof: &Proof,
    seen: &mut HashSet<Hash>,
    is_burning_address: &impl Fn(&[u8]) -> bool,
) -> bool {
    for serial in &proof.input_serials {
        if !seen.insert(*serial) {
            return false;
        }
    }
    for coin in &proof.output_coins {
        if !seen.insert(coin.coin_id) && !is_burning_address(&coin.public_key) {
            return false;
        }
    }
    true
}
