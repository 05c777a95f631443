//! # Verification Gate
//!
//! Front of the transaction verifier: times each batch, counts outcomes and
//! announces the verdict.

use bc_04_tx_verifier::{
    BatchSummary, BeaconView, ChainRetriever, ShardView, Transaction, TxVerifierApi,
    VerifierError,
};
use bc_telemetry::{
    metric_inc, time_histogram, VERIFIER_BATCHES, VERIFIER_DURATION, VERIFIER_TRANSACTIONS,
};
use shared_bus::{ChainEvent, EventPublisher};
use std::sync::Arc;
use tracing::{info, warn};

/// Metrics label for a verification result.
pub fn outcome_label(result: &Result<BatchSummary, VerifierError>) -> &'static str {
    match result {
        Ok(_) => "accepted",
        Err(VerifierError::Timeout { .. }) => "timeout",
        Err(VerifierError::DoubleSpendInBatch { .. }) => "double_spend",
        Err(_) => "invalid",
    }
}

/// Verifier wrapper that records every batch.
pub struct VerificationGate<V: TxVerifierApi> {
    verifier: Arc<V>,
    bus: Arc<dyn EventPublisher>,
}

impl<V: TxVerifierApi> VerificationGate<V> {
    /// Gate over `verifier`, announcing verdicts on `bus`.
    pub fn new(verifier: Arc<V>, bus: Arc<dyn EventPublisher>) -> Self {
        Self { verifier, bus }
    }

    /// Wrapped verifier.
    pub fn verifier(&self) -> &Arc<V> {
        &self.verifier
    }

    /// Verify a candidate block's transactions.
    ///
    /// A timeout is not announced: the batch was neither accepted nor
    /// rejected.
    pub async fn verify(
        &self,
        chain: Arc<dyn ChainRetriever>,
        shard: Arc<dyn ShardView>,
        beacon: Arc<dyn BeaconView>,
        txs: &[Arc<dyn Transaction>],
    ) -> Result<BatchSummary, VerifierError> {
        let shard_id = shard.shard_id();
        let result = {
            let _timer = time_histogram!(VERIFIER_DURATION);
            self.verifier.verify_batch(chain, shard, beacon, txs).await
        };

        metric_inc!(VERIFIER_BATCHES, &[outcome_label(&result)]);
        VERIFIER_TRANSACTIONS.inc_by(txs.len() as f64);

        match &result {
            Ok(summary) => {
                info!(shard_id, checked = summary.checked(), "Transaction batch accepted");
                self.announce(shard_id, summary.checked(), true).await;
            }
            Err(err) if err.is_timeout() => {
                warn!(shard_id, txs = txs.len(), error = %err, "Transaction batch undecided");
            }
            Err(err) => {
                warn!(shard_id, txs = txs.len(), error = %err, "Transaction batch rejected");
                self.announce(shard_id, txs.len(), false).await;
            }
        }
        result
    }

    async fn announce(&self, shard_id: shared_types::ShardId, tx_count: usize, accepted: bool) {
        self.bus
            .publish(ChainEvent::TransactionBatchVerified {
                shard_id,
                tx_count,
                accepted,
            })
            .await;
    }
}
