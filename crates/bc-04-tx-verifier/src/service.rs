//! # Transaction Verifier Service
//!
//! Verifies a batch in fixed phases:
//!
//! 1. whitelist filter, stake-spam filter, pool partition (synchronous)
//! 2. commitment preload against a copied state DB (synchronous)
//! 3. signature and sanity jobs for new transactions, chain-state jobs for
//!    every transaction, all on a bounded worker pool under one deadline
//! 4. in-batch double-spend scan once every job has finished
//!
//! The first failing job cancels the rest of the queue.

use crate::algorithms::{
    check_double_spend_in_batch, check_stake_spam, filter_whitelisted, partition_validated,
};
use crate::domain::{
    hash_hex, BatchSummary, TxCheckError, VerificationStage, VerifierConfig, VerifierError,
};
use crate::ports::{
    BeaconView, ChainContext, ChainRetriever, ShardView, Transaction, TransactionPool,
    TxVerifierApi,
};
use async_trait::async_trait;
use bc_compute::{Job, PoolError, WorkerPool};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bounded-concurrency batch verifier.
pub struct TxVerifierService<P: TransactionPool> {
    pool: Arc<P>,
    config: VerifierConfig,
    workers: WorkerPool,
}

impl<P: TransactionPool> TxVerifierService<P> {
    /// Create a verifier over `pool`.
    pub fn new(pool: Arc<P>, config: VerifierConfig) -> Result<Self, VerifierError> {
        config.validate()?;
        let workers = WorkerPool::new(config.effective_workers(), config.timeout);
        Ok(Self {
            pool,
            config,
            workers,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.workers()
    }

    fn build_jobs(
        &self,
        all: &[Arc<dyn Transaction>],
        new: &[Arc<dyn Transaction>],
        chain: &Arc<dyn ChainRetriever>,
        shard: &Arc<dyn ShardView>,
        beacon: &Arc<dyn BeaconView>,
        summary: &mut BatchSummary,
    ) -> Vec<Job<VerifierError>> {
        let mut jobs: Vec<Job<VerifierError>> = Vec::with_capacity(all.len() + 2 * new.len());

        for tx in new {
            let tx = Arc::clone(tx);
            jobs.push(Box::new(move || {
                tx.verify_signature()
                    .map_err(|e| invalid(tx.as_ref(), VerificationStage::Signature, e))
            }));
        }
        for tx in new {
            let tx = Arc::clone(tx);
            let shard = Arc::clone(shard);
            jobs.push(Box::new(move || {
                tx.validate_sanity()
                    .and_then(|_| tx.validate_correctness(shard.copied_state_db().as_ref()))
                    .map_err(|e| invalid(tx.as_ref(), VerificationStage::Sanity, e))
            }));
        }
        for tx in all {
            if self.config.chain_state_bypass.contains(&tx.hash()) {
                debug!(tx_hash = %hash_hex(&tx.hash()), "Chain-state check bypassed");
                summary.bypassed += 1;
                continue;
            }
            let tx = Arc::clone(tx);
            let chain = Arc::clone(chain);
            let shard = Arc::clone(shard);
            let beacon = Arc::clone(beacon);
            jobs.push(Box::new(move || {
                let ctx = ChainContext {
                    chain: chain.as_ref(),
                    shard: shard.as_ref(),
                    beacon: beacon.as_ref(),
                    beacon_height: shard.beacon_height(),
                };
                tx.validate_with_chain(&ctx)
                    .and_then(|_| {
                        tx.validate_double_spend_with_chain(shard.copied_state_db().as_ref())
                    })
                    .map_err(|e| invalid(tx.as_ref(), VerificationStage::ChainState, e))
            }));
        }
        jobs
    }
}

fn invalid(tx: &dyn Transaction, stage: VerificationStage, source: TxCheckError) -> VerifierError {
    VerifierError::InvalidTransaction {
        tx_hash: hash_hex(&tx.hash()),
        stage,
        source,
    }
}

#[async_trait]
impl<P: TransactionPool + 'static> TxVerifierApi for TxVerifierService<P> {
    async fn full_validate_transactions(
        &self,
        chain: Arc<dyn ChainRetriever>,
        shard: Arc<dyn ShardView>,
        beacon: Arc<dyn BeaconView>,
        txs: &[Arc<dyn Transaction>],
    ) -> Result<bool, VerifierError> {
        self.verify_batch(chain, shard, beacon, txs)
            .await
            .map(|_| true)
    }

    async fn verify_batch(
        &self,
        chain: Arc<dyn ChainRetriever>,
        shard: Arc<dyn ShardView>,
        beacon: Arc<dyn BeaconView>,
        txs: &[Arc<dyn Transaction>],
    ) -> Result<BatchSummary, VerifierError> {
        let mut summary = BatchSummary {
            received: txs.len(),
            ..BatchSummary::default()
        };

        let txs = filter_whitelisted(txs, &self.config.whitelist);
        summary.whitelisted = summary.received - txs.len();
        if txs.is_empty() {
            debug!(received = summary.received, "Nothing to verify after whitelist");
            return Ok(summary);
        }

        check_stake_spam(&txs)?;

        let (validated, new) = partition_validated(&txs, self.pool.as_ref());
        summary.pool_validated = validated.len();
        summary.new = new.len();

        let db = shard.copied_state_db();
        for tx in &txs {
            tx.load_commitment(db.as_ref())
                .map_err(|source| VerifierError::CommitmentLoad {
                    tx_hash: hash_hex(&tx.hash()),
                    source,
                })?;
        }

        let jobs = self.build_jobs(&txs, &new, &chain, &shard, &beacon, &mut summary);
        summary.jobs = jobs.len();
        debug!(
            shard_id = shard.shard_id(),
            txs = txs.len(),
            validated = summary.pool_validated,
            new = summary.new,
            jobs = summary.jobs,
            "Verification jobs scheduled"
        );

        self.workers.run_all(jobs).await.map_err(|e| match e {
            PoolError::Job(err) => err,
            PoolError::Timeout(deadline) => VerifierError::Timeout {
                tx_count: txs.len(),
                deadline,
            },
            PoolError::WorkerPanicked(msg) => VerifierError::WorkerFailed(msg),
        })?;

        if let Err(e) = check_double_spend_in_batch(&txs, |key| chain.is_burning_address(key)) {
            warn!(shard_id = shard.shard_id(), error = %e, "Batch rejected");
            return Err(e);
        }

        info!(
            shard_id = shard.shard_id(),
            beacon_height = beacon.height(),
            txs = txs.len(),
            whitelisted = summary.whitelisted,
            "Transaction batch verified"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryStateDb, InMemoryTransactionPool, SnapshotShardView};
    use crate::ports::{MockBeaconView, MockChainRetriever, MockTransaction};
    use std::time::Duration;

    struct Harness {
        chain: Arc<dyn ChainRetriever>,
        shard: Arc<SnapshotShardView>,
        beacon: Arc<dyn BeaconView>,
    }

    impl Harness {
        fn new() -> Self {
            let mut db = InMemoryStateDb::new();
            db.add_commitment([200; 32]);
            db.add_serial_number([201; 32]);
            Self {
                chain: Arc::new(MockChainRetriever {
                    burning_keys: vec![b"burn".to_vec()],
                }),
                shard: Arc::new(SnapshotShardView::new(1, 10, db)),
                beacon: Arc::new(MockBeaconView { height: 12 }),
            }
        }

        async fn verify<P: TransactionPool + 'static>(
            &self,
            service: &TxVerifierService<P>,
            txs: &[MockTransaction],
        ) -> Result<BatchSummary, VerifierError> {
            let txs: Vec<Arc<dyn Transaction>> = txs
                .iter()
                .map(|tx| Arc::new(tx.clone()) as Arc<dyn Transaction>)
                .collect();
            service
                .verify_batch(
                    Arc::clone(&self.chain),
                    self.shard.clone(),
                    Arc::clone(&self.beacon),
                    &txs,
                )
                .await
        }
    }

    fn service(config: VerifierConfig) -> TxVerifierService<InMemoryTransactionPool> {
        TxVerifierService::new(Arc::new(InMemoryTransactionPool::new()), config).unwrap()
    }

    fn with_pool(
        pool: InMemoryTransactionPool,
        config: VerifierConfig,
    ) -> TxVerifierService<InMemoryTransactionPool> {
        TxVerifierService::new(Arc::new(pool), config).unwrap()
    }

    use VerificationStage::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_valid_batch() {
        let h = Harness::new();
        let txs = vec![
            MockTransaction::new(1).spending(&[10]).creating(&[20], b"a"),
            MockTransaction::new(2).spending(&[11]).requiring(&[200]),
        ];
        let summary = h
            .verify(&service(VerifierConfig::for_testing()), &txs)
            .await
            .unwrap();

        assert_eq!(summary.checked(), 2);
        assert_eq!(summary.new, 2);
        assert_eq!(summary.jobs, 6);
        for tx in &txs {
            let mut calls = tx.calls();
            calls.sort_by_key(|s| *s as u8);
            assert_eq!(calls, vec![Commitment, Signature, Sanity, ChainState]);
        }
    }

    #[tokio::test]
    async fn test_full_validate_returns_true() {
        let h = Harness::new();
        let txs: Vec<Arc<dyn Transaction>> = vec![Arc::new(MockTransaction::new(1))];
        let ok = service(VerifierConfig::for_testing())
            .full_validate_transactions(
                Arc::clone(&h.chain),
                h.shard.clone(),
                Arc::clone(&h.beacon),
                &txs,
            )
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_whitelisted_never_checked() {
        let h = Harness::new();
        let bad = MockTransaction::new(1).failing_at(Signature).spending(&[201]);
        let mut config = VerifierConfig::for_testing();
        config.whitelist.insert(bad.hash);

        let summary = h.verify(&service(config), &[bad.clone()]).await.unwrap();
        assert_eq!(summary.whitelisted, 1);
        assert_eq!(summary.jobs, 0);
        assert!(bad.calls().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_staking_rejected_before_checks() {
        let h = Harness::new();
        let a = MockTransaction::new(1).staking("key");
        let b = MockTransaction::new(2).staking("key");

        let err = h
            .verify(&service(VerifierConfig::for_testing()), &[a.clone(), b])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            VerifierError::DuplicateStaking {
                committee_key: "key".into()
            }
        );
        assert!(a.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pool_validated_skip_signature_and_sanity() {
        let h = Harness::new();
        let known = MockTransaction::new(1).failing_at(Signature);
        let pool = InMemoryTransactionPool::with_validated([known.hash]);

        let summary = h
            .verify(&with_pool(pool, VerifierConfig::for_testing()), &[known.clone()])
            .await
            .unwrap();
        assert_eq!(summary.pool_validated, 1);
        assert_eq!(summary.jobs, 1);
        assert_eq!(known.calls(), vec![Commitment, ChainState]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_invalid_signature() {
        let h = Harness::new();
        let bad = MockTransaction::new(3).failing_at(Signature);
        let err = h
            .verify(&service(VerifierConfig::for_testing()), &[MockTransaction::new(1), bad])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            VerifierError::InvalidTransaction {
                tx_hash: hash_hex(&[3; 32]),
                stage: Signature,
                source: TxCheckError::InvalidSignature,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spent_on_chain() {
        let h = Harness::new();
        let known = MockTransaction::new(1).spending(&[201]);
        let pool = InMemoryTransactionPool::with_validated([known.hash]);

        let err = h
            .verify(&with_pool(pool, VerifierConfig::for_testing()), &[known])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifierError::InvalidTransaction {
                stage: ChainState,
                source: TxCheckError::SpentOnChain,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_commitment() {
        let h = Harness::new();
        let tx = MockTransaction::new(1).requiring(&[200, 202]);
        let err = h
            .verify(&service(VerifierConfig::for_testing()), &[tx])
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::CommitmentLoad { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_chain_state_bypass() {
        let h = Harness::new();
        let special = MockTransaction::new(7).failing_at(ChainState);
        let mut config = VerifierConfig::for_testing();
        config.chain_state_bypass.insert(special.hash);

        let summary = h.verify(&service(config), &[special.clone()]).await.unwrap();
        assert_eq!(summary.bypassed, 1);
        assert!(!special.calls().contains(&ChainState));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_double_spend_in_batch() {
        let h = Harness::new();
        let txs = vec![
            MockTransaction::new(1).spending(&[10]),
            MockTransaction::new(2).spending(&[10]),
        ];
        let err = h
            .verify(&service(VerifierConfig::for_testing()), &txs)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            VerifierError::DoubleSpendInBatch {
                tx_hash: hash_hex(&[2; 32])
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_burning_outputs_may_repeat() {
        let h = Harness::new();
        let txs = vec![
            MockTransaction::new(1).creating(&[50], b"burn"),
            MockTransaction::new(2).creating(&[50], b"burn"),
        ];
        assert!(h
            .verify(&service(VerifierConfig::for_testing()), &txs)
            .await
            .is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_first_error_cancels_remaining_jobs() {
        let h = Harness::new();
        let config = VerifierConfig {
            workers: 1,
            ..VerifierConfig::for_testing()
        };
        let bad = MockTransaction::new(1).failing_at(Signature);
        let rest: Vec<MockTransaction> = (2..10).map(MockTransaction::new).collect();
        let mut txs = vec![bad];
        txs.extend(rest.iter().cloned());

        let err = h.verify(&service(config), &txs).await.unwrap_err();
        assert!(matches!(err, VerifierError::InvalidTransaction { .. }));
        for tx in &rest {
            assert_eq!(tx.calls(), vec![Commitment]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout() {
        let h = Harness::new();
        let config = VerifierConfig {
            timeout: Duration::from_millis(50),
            workers: 1,
            ..VerifierConfig::for_testing()
        };
        let slow = MockTransaction::new(1).slow(Duration::from_millis(100));
        let pool = InMemoryTransactionPool::with_validated([slow.hash]);

        let err = h.verify(&with_pool(pool, config), &[slow]).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let h = Harness::new();
        let summary = h
            .verify(&service(VerifierConfig::for_testing()), &[])
            .await
            .unwrap();
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn test_invalid_config() {
        let config = VerifierConfig {
            timeout: Duration::ZERO,
            ..VerifierConfig::for_testing()
        };
        assert!(
            TxVerifierService::new(Arc::new(InMemoryTransactionPool::new()), config).is_err()
        );
    }
}
