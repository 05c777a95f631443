//! # Beacon Node
//!
//! Owns one instance of every component and drives a block through them:
//! build the body from shard blocks, then apply it.

use crate::builder::{BeaconBlockBuilder, ShardBlock};
use crate::config::NodeConfig;
use crate::processor::{BeaconBlockProcessor, BlockOutcome};
use crate::verification::VerificationGate;
use anyhow::Context;
use bc_01_committee::{CommitteeService, CommitteeStore, EpochCalculator, InMemoryCommitteeStore};
use bc_02_slashing::{BlacklistStore, InMemoryBlacklistStore};
use bc_03_instructions::{BeaconState, InMemoryParamsStore, ParamsStore};
use bc_04_tx_verifier::{InMemoryTransactionPool, TransactionPool, TxVerifierService};
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use std::sync::Arc;
use tracing::info;

/// Node running entirely in memory.
pub type InMemoryNode = BeaconNode<
    InMemoryCommitteeStore,
    InMemoryBlacklistStore,
    InMemoryParamsStore,
    InMemoryTransactionPool,
>;

/// Stores a node is assembled from.
pub struct NodeStores<C, B, P, T> {
    /// Committee snapshots and pending queues.
    pub committees: Arc<C>,
    /// Producer blacklist by height.
    pub blacklist: Arc<B>,
    /// Stability params.
    pub params: Arc<P>,
    /// Transaction pool consulted by the verifier.
    pub pool: Arc<T>,
}

impl
    NodeStores<
        InMemoryCommitteeStore,
        InMemoryBlacklistStore,
        InMemoryParamsStore,
        InMemoryTransactionPool,
    >
{
    /// Empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            committees: Arc::new(InMemoryCommitteeStore::new()),
            blacklist: Arc::new(InMemoryBlacklistStore::new()),
            params: Arc::new(InMemoryParamsStore::new()),
            pool: Arc::new(InMemoryTransactionPool::new()),
        }
    }
}

/// Every component of the beacon core, wired to one event bus.
pub struct BeaconNode<C, B, P, T>
where
    C: CommitteeStore,
    B: BlacklistStore,
    P: ParamsStore,
    T: TransactionPool + 'static,
{
    config: NodeConfig,
    bus: Arc<InMemoryEventBus>,
    committees: Arc<CommitteeService<C>>,
    builder: BeaconBlockBuilder<C>,
    processor: BeaconBlockProcessor<B, P>,
    gate: VerificationGate<TxVerifierService<T>>,
}

impl<C, B, P, T> BeaconNode<C, B, P, T>
where
    C: CommitteeStore,
    B: BlacklistStore,
    P: ParamsStore,
    T: TransactionPool + 'static,
{
    /// Validate `config` and assemble the node.
    pub fn new(config: NodeConfig, stores: NodeStores<C, B, P, T>) -> anyhow::Result<Self> {
        config.validate().context("invalid node configuration")?;

        let epochs = EpochCalculator::new(config.epochs)?;
        let bus = Arc::new(InMemoryEventBus::new());
        let committees = Arc::new(CommitteeService::new(
            stores.committees,
            config.committee.clone(),
        )?);
        let verifier = TxVerifierService::new(stores.pool, config.verifier.clone())?;

        info!(
            epoch = config.epochs.epoch,
            active_shards = config.committee.active_shards,
            verifier_workers = verifier.worker_count(),
            "Beacon node assembled"
        );

        Ok(Self {
            builder: BeaconBlockBuilder::new(Arc::clone(&committees), epochs, bus.clone()),
            processor: BeaconBlockProcessor::new(
                stores.blacklist,
                stores.params,
                epochs,
                bus.clone(),
            ),
            gate: VerificationGate::new(Arc::new(verifier), bus.clone()),
            committees,
            bus,
            config,
        })
    }

    /// Configuration the node was built with.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Committee service.
    pub fn committees(&self) -> &Arc<CommitteeService<C>> {
        &self.committees
    }

    /// Block processor.
    pub fn processor(&self) -> &BeaconBlockProcessor<B, P> {
        &self.processor
    }

    /// Transaction verification gate.
    pub fn verification(&self) -> &VerificationGate<TxVerifierService<T>> {
        &self.gate
    }

    /// Listen to chain events.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    /// Current beacon state.
    pub fn state(&self) -> BeaconState {
        self.processor.state()
    }

    /// Build the next beacon block from `shard_blocks` and apply it.
    pub async fn advance(&self, shard_blocks: &[ShardBlock]) -> anyhow::Result<BlockOutcome> {
        let state = self.processor.state();
        let height = state.height + 1;
        let blacklist = self.processor.blacklist();

        let body = self
            .builder
            .build_block(
                shard_blocks,
                &state,
                self.processor.params().as_ref(),
                &blacklist,
            )
            .await?;
        self.processor.process_block(height, &body).await
    }
}
