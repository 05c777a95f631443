//! # Inbound Ports

use crate::domain::{BatchSummary, VerifierError};
use crate::ports::outbound::{BeaconView, ChainRetriever, ShardView, Transaction};
use async_trait::async_trait;
use std::sync::Arc;

/// Transaction batch verification API.
#[async_trait]
pub trait TxVerifierApi: Send + Sync {
    /// Verify a candidate block's transactions as one unit.
    ///
    /// `Ok(true)` when every transaction passes. Any failure rejects the
    /// whole batch; [`VerifierError::Timeout`] means undecided.
    async fn full_validate_transactions(
        &self,
        chain: Arc<dyn ChainRetriever>,
        shard: Arc<dyn ShardView>,
        beacon: Arc<dyn BeaconView>,
        txs: &[Arc<dyn Transaction>],
    ) -> Result<bool, VerifierError>;

    /// Same checks, reporting how the batch was handled.
    async fn verify_batch(
        &self,
        chain: Arc<dyn ChainRetriever>,
        shard: Arc<dyn ShardView>,
        beacon: Arc<dyn BeaconView>,
        txs: &[Arc<dyn Transaction>],
    ) -> Result<BatchSummary, VerifierError>;
}
