//! # Beacon Block Processor
//!
//! Applies a committed beacon block. Both the params effects and the
//! blacklist update are computed before anything is written. The blacklist
//! snapshot is written first because rewriting it for the same height is
//! harmless; the params batch follows. In-memory state only moves once both
//! writes landed, so a failed block can be replayed as is.

use anyhow::{bail, Context};
use bc_01_committee::EpochCalculator;
use bc_02_slashing::{BlacklistLedgerApi, BlacklistStore, BlacklistUpdate, ProducerBlacklistLedger};
use bc_03_instructions::{BeaconState, InstructionProcessor, ParamsStore, ProcessSummary};
use bc_telemetry::{metric_inc, BEACON_BLOCKS_PROCESSED, BLACKLIST_RELEASED, BLACKLIST_SIZE};
use parking_lot::Mutex;
use shared_bus::{ChainEvent, EventPublisher};
use shared_types::{BeaconHeight, Blacklist, Epoch, RawInstruction};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Result of one applied beacon block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockOutcome {
    /// Beacon height.
    pub height: BeaconHeight,
    /// Epoch containing the height.
    pub epoch: Epoch,
    /// Params effects.
    pub summary: ProcessSummary,
    /// Blacklist change.
    pub blacklist: BlacklistUpdate,
}

/// Applies beacon blocks in height order.
pub struct BeaconBlockProcessor<B: BlacklistStore, P: ParamsStore> {
    ledger: ProducerBlacklistLedger<B>,
    instructions: InstructionProcessor,
    params: Arc<P>,
    state: Mutex<BeaconState>,
    epochs: EpochCalculator,
    bus: Arc<dyn EventPublisher>,
}

impl<B: BlacklistStore, P: ParamsStore> BeaconBlockProcessor<B, P> {
    /// Processor starting from an empty beacon state.
    pub fn new(
        blacklist_store: Arc<B>,
        params: Arc<P>,
        epochs: EpochCalculator,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            ledger: ProducerBlacklistLedger::new(blacklist_store, epochs),
            instructions: InstructionProcessor::new(),
            params,
            state: Mutex::new(BeaconState::default()),
            epochs,
            bus,
        }
    }

    /// Resume from a known beacon state.
    pub fn with_state(self, state: BeaconState) -> Self {
        *self.state.lock() = state;
        self
    }

    /// Copy of the current beacon state.
    pub fn state(&self) -> BeaconState {
        self.state.lock().clone()
    }

    /// Current producer blacklist.
    pub fn blacklist(&self) -> Blacklist {
        self.ledger.current()
    }

    /// Blacklist ledger.
    pub fn ledger(&self) -> &ProducerBlacklistLedger<B> {
        &self.ledger
    }

    /// Params store.
    pub fn params(&self) -> &Arc<P> {
        &self.params
    }

    /// Apply the block at `height`.
    #[instrument(skip(self, instructions), fields(instructions = instructions.len()))]
    pub async fn process_block(
        &self,
        height: BeaconHeight,
        instructions: &[RawInstruction],
    ) -> anyhow::Result<BlockOutcome> {
        let outcome = match self.apply(height, instructions) {
            Ok(outcome) => outcome,
            Err(err) => {
                metric_inc!(BEACON_BLOCKS_PROCESSED, &["rejected"]);
                warn!(height, error = %err, "Beacon block rejected");
                return Err(err);
            }
        };

        metric_inc!(BEACON_BLOCKS_PROCESSED, &["committed"]);
        BLACKLIST_SIZE.set(outcome.blacklist.blacklist.len() as f64);
        BLACKLIST_RELEASED.inc_by(outcome.blacklist.deleted.len() as f64);

        self.bus
            .publish(ChainEvent::BeaconBlockProcessed {
                height,
                epoch: outcome.epoch,
                instructions: instructions.len(),
            })
            .await;
        if !outcome.blacklist.is_quiet() {
            self.bus
                .publish(ChainEvent::ProducersPunished {
                    height,
                    blacklist: outcome.blacklist.blacklist.clone(),
                    released: outcome.blacklist.deleted.clone(),
                })
                .await;
        }

        info!(
            height,
            epoch = outcome.epoch,
            applied = outcome.summary.applied,
            skipped = outcome.summary.skipped,
            blacklisted = outcome.blacklist.blacklist.len(),
            "Beacon block applied"
        );
        Ok(outcome)
    }

    fn apply(
        &self,
        height: BeaconHeight,
        instructions: &[RawInstruction],
    ) -> anyhow::Result<BlockOutcome> {
        if height == 0 {
            bail!("genesis block carries no instructions to apply");
        }
        if let Some(last) = self.ledger.last_height() {
            if height != last + 1 {
                bail!("out of order beacon block: expected {}, got {}", last + 1, height);
            }
        }
        let update = self
            .ledger
            .prepare(height, instructions)
            .with_context(|| format!("swap instructions of block {}", height))?;
        let mut state = self.state.lock();
        let staged = self
            .instructions
            .stage(instructions, &state, self.params.as_ref())
            .with_context(|| format!("instructions of block {}", height))?;

        self.ledger
            .persist(&update)
            .with_context(|| format!("blacklist update of block {}", height))?;
        let summary = self
            .instructions
            .commit(staged, &mut state, self.params.as_ref())
            .map_err(|err| {
                error!(height, error = %err, "Params commit failed after blacklist write");
                err
            })
            .with_context(|| format!("params commit of block {}", height))?;
        state.height = height;
        self.ledger
            .record(&update)
            .with_context(|| format!("blacklist update of block {}", height))?;

        Ok(BlockOutcome {
            height,
            epoch: self.epochs.epoch_of(height),
            summary,
            blacklist: update,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_01_committee::EpochParams;
    use bc_02_slashing::{InMemoryBlacklistStore, MockBlacklistStore};
    use bc_03_instructions::{keys, InMemoryParamsStore, MetadataType, MockParamsStore};
    use shared_bus::{EventFilter, InMemoryEventBus};
    use shared_types::{ChainId, SwapInstruction};

    fn epochs() -> EpochCalculator {
        EpochCalculator::new(EpochParams::for_testing()).unwrap()
    }

    fn swap(punished: &[(&str, u8)]) -> RawInstruction {
        SwapInstruction {
            swapped_in: vec![],
            swapped_out: punished.iter().map(|(k, _)| k.to_string()).collect(),
            chain: ChainId::Shard(0),
            punished: punished.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
        .to_raw()
        .unwrap()
    }

    fn loan(id: &str) -> RawInstruction {
        vec![
            MetadataType::LoanRequest.tag(),
            "0".to_string(),
            "accepted".to_string(),
            format!(r#"{{"loan_id":"{}","receiver":"r","amount":1}}"#, id),
        ]
    }

    fn processor(
        bus: Arc<InMemoryEventBus>,
    ) -> BeaconBlockProcessor<InMemoryBlacklistStore, InMemoryParamsStore> {
        BeaconBlockProcessor::new(
            Arc::new(InMemoryBlacklistStore::new()),
            Arc::new(InMemoryParamsStore::new()),
            epochs(),
            bus,
        )
    }

    #[tokio::test]
    async fn test_applies_params_and_blacklist() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe(EventFilter::all());
        let processor = processor(bus.clone());

        let outcome = processor
            .process_block(1, &[loan("L1"), swap(&[("bad", 2)])])
            .await
            .unwrap();

        assert_eq!(outcome.summary.applied, 1);
        assert_eq!(outcome.blacklist.blacklist.get("bad"), Some(&2));
        assert_eq!(processor.state().height, 1);
        assert!(processor
            .params()
            .get(&keys::loan_request("L1"))
            .unwrap()
            .is_some());

        assert!(matches!(
            sub.try_recv().unwrap(),
            Some(ChainEvent::BeaconBlockProcessed { height: 1, instructions: 2, .. })
        ));
        assert!(matches!(
            sub.try_recv().unwrap(),
            Some(ChainEvent::ProducersPunished { height: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_quiet_block_publishes_only_processed() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe(EventFilter::all());
        let processor = processor(bus.clone());

        processor.process_block(1, &[]).await.unwrap();
        assert!(matches!(
            sub.try_recv().unwrap(),
            Some(ChainEvent::BeaconBlockProcessed { .. })
        ));
        assert_eq!(sub.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_swap_rejects_before_params() {
        let processor = processor(Arc::new(InMemoryEventBus::new()));
        let broken = vec!["swap".to_string(), "only-one-field".to_string()];

        let err = processor
            .process_block(1, &[loan("L1"), broken])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("swap instructions of block 1"));
        assert_eq!(processor.state().height, 0);
        assert!(processor.params().is_empty());
        assert_eq!(processor.ledger().last_height(), None);
    }

    #[tokio::test]
    async fn test_out_of_order_rejected() {
        let processor = processor(Arc::new(InMemoryEventBus::new()));
        processor.process_block(1, &[]).await.unwrap();

        assert!(processor.process_block(3, &[]).await.is_err());
        assert!(processor.process_block(0, &[]).await.is_err());
        processor.process_block(2, &[]).await.unwrap();
        assert_eq!(processor.state().height, 2);
    }

    #[tokio::test]
    async fn test_punishment_released_after_epoch() {
        let processor = processor(Arc::new(InMemoryEventBus::new()));
        let epoch_end = epochs().last_height(1);

        processor.process_block(1, &[swap(&[("bad", 1)])]).await.unwrap();
        for height in 2..epoch_end {
            processor.process_block(height, &[]).await.unwrap();
        }
        assert_eq!(processor.blacklist().get("bad"), Some(&1));

        let outcome = processor.process_block(epoch_end, &[]).await.unwrap();
        assert_eq!(outcome.blacklist.deleted, vec!["bad".to_string()]);
        assert!(processor.blacklist().is_empty());
    }

    #[tokio::test]
    async fn test_blacklist_store_failure_surfaces() {
        let store = MockBlacklistStore::default();
        let failing = MockBlacklistStore {
            fail_writes: true,
            ..store.clone()
        };
        let params = Arc::new(InMemoryParamsStore::new());
        let processor = BeaconBlockProcessor::new(
            Arc::new(failing),
            params.clone(),
            epochs(),
            Arc::new(InMemoryEventBus::new()),
        );

        let err = processor.process_block(1, &[loan("L1")]).await.unwrap_err();
        assert!(format!("{:#}", err).contains("blacklist update of block 1"));
        assert_eq!(processor.ledger().last_height(), None);
        assert_eq!(processor.state().height, 0);
        assert!(params.is_empty());
        assert!(store.applied().is_empty());
    }

    #[tokio::test]
    async fn test_failed_params_commit_can_be_replayed() {
        let blacklist_store = Arc::new(InMemoryBlacklistStore::new());
        let failing = BeaconBlockProcessor::new(
            blacklist_store.clone(),
            Arc::new(MockParamsStore {
                fail_writes: true,
                ..MockParamsStore::default()
            }),
            epochs(),
            Arc::new(InMemoryEventBus::new()),
        );
        let block = vec![loan("L1"), swap(&[("bad", 2)])];

        let err = failing.process_block(1, &block).await.unwrap_err();
        assert!(format!("{:#}", err).contains("params commit of block 1"));
        assert_eq!(failing.state().height, 0);
        assert_eq!(failing.ledger().last_height(), None);
        assert!(failing.blacklist().is_empty());

        // Same blacklist store, healthy params store: the block goes through.
        let params = Arc::new(InMemoryParamsStore::new());
        let replay = BeaconBlockProcessor::new(
            blacklist_store.clone(),
            params.clone(),
            epochs(),
            Arc::new(InMemoryEventBus::new()),
        );
        let outcome = replay.process_block(1, &block).await.unwrap();
        assert_eq!(outcome.summary.applied, 1);
        assert_eq!(replay.blacklist().get("bad"), Some(&2));
        assert_eq!(blacklist_store.record(&"bad".to_string()), Some(2));
        assert!(params.get(&keys::loan_request("L1")).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_replay_after_blacklist_failure() {
        let params = Arc::new(InMemoryParamsStore::new());
        let processor = BeaconBlockProcessor::new(
            Arc::new(MockBlacklistStore {
                fail_writes: true,
                ..MockBlacklistStore::default()
            }),
            params.clone(),
            epochs(),
            Arc::new(InMemoryEventBus::new()),
        );
        assert!(processor.process_block(1, &[loan("L1")]).await.is_err());

        let retry = BeaconBlockProcessor::new(
            Arc::new(InMemoryBlacklistStore::new()),
            params.clone(),
            epochs(),
            Arc::new(InMemoryEventBus::new()),
        )
        .with_state(processor.state());
        let outcome = retry.process_block(1, &[loan("L1")]).await.unwrap();
        assert_eq!(outcome.summary.applied, 1);
        assert_eq!(retry.state().height, 1);
    }
}
