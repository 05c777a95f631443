//! # Beacon Block Builder
//!
//! Collects the instructions of the next beacon block: converted shard
//! instructions and newly staked candidates, the candidate assignment at the
//! epoch's random time, then committee swaps when the block opens an epoch.

use anyhow::Context;
use bc_01_committee::{CommitteeApi, CommitteeService, CommitteeStore, EpochCalculator, Rotation};
use bc_03_instructions::{
    AccumulativeValues, BeaconState, BeaconStateView, InstructionProducer, ParamsStore,
    ProducerStats,
};
use bc_telemetry::{
    metric_inc, CANDIDATES_ASSIGNED, COMMITTEE_ROTATIONS, INSTRUCTIONS_PRODUCED,
    INSTRUCTIONS_SKIPPED, VALIDATORS_DROPPED,
};
use parking_lot::Mutex;
use shared_bus::{ChainEvent, EventPublisher};
use shared_types::{
    AssignInstruction, BeaconHeight, Blacklist, ChainId, RawInstruction, ShardId,
    StakeInstruction, StakeRole, ValidatorKey, STAKE_ACTION,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Instructions carried by one shard block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShardBlock {
    /// Shard that produced the block.
    pub shard_id: ShardId,
    /// Instructions in block order.
    pub instructions: Vec<RawInstruction>,
}

/// Builds beacon block bodies.
pub struct BeaconBlockBuilder<S: CommitteeStore> {
    producer: InstructionProducer,
    committees: Arc<CommitteeService<S>>,
    epochs: EpochCalculator,
    bus: Arc<dyn EventPublisher>,
    /// Shard candidates staked but not yet assigned, in stake order.
    waiting: Mutex<Vec<ValidatorKey>>,
}

impl<S: CommitteeStore> BeaconBlockBuilder<S> {
    /// Builder rotating through `committees`.
    pub fn new(
        committees: Arc<CommitteeService<S>>,
        epochs: EpochCalculator,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            producer: InstructionProducer::new(),
            committees,
            epochs,
            bus,
            waiting: Mutex::new(Vec::new()),
        }
    }

    /// Shard candidates waiting for the next random time.
    pub fn waiting_candidates(&self) -> Vec<ValidatorKey> {
        self.waiting.lock().clone()
    }

    /// Producer counters since start.
    pub fn producer_stats(&self) -> ProducerStats {
        self.producer.stats()
    }

    /// Instructions for the block following `state`.
    ///
    /// Shard blocks are converted in the given order against one shared
    /// accumulator. Waiting shard candidates are assigned at the epoch's
    /// random time, and committees rotate when the new block is the first of
    /// its epoch.
    #[instrument(skip_all, fields(height = state.height + 1, shard_blocks = shard_blocks.len()))]
    pub async fn build_block(
        &self,
        shard_blocks: &[ShardBlock],
        state: &BeaconState,
        params: &dyn ParamsStore,
        blacklist: &Blacklist,
    ) -> anyhow::Result<Vec<RawInstruction>> {
        let next = state.height + 1;
        let (stakes, shard_blocks) = split_stakes(shard_blocks);

        let mut body = self.convert_shard_blocks(&shard_blocks, state, params);
        let staked = self
            .accept_stakes(stakes)
            .await
            .with_context(|| format!("stake instructions of block {}", next))?;
        body.extend(staked);

        if self.epochs.is_equal_to_random_time(next) {
            let assigned = self
                .assign_waiting(next)
                .await
                .with_context(|| format!("candidate assignment for block {}", next))?;
            body.extend(assigned);
        }

        if self.epochs.is_first_height_in_epoch(next) && next > 1 {
            let swaps = self
                .rotate_committees(blacklist)
                .await
                .with_context(|| format!("committee rotation for block {}", next))?;
            body.extend(swaps);
        }
        Ok(body)
    }

    /// Keep candidates not already staked, waiting or serving.
    ///
    /// Shard candidates join the waiting queue; beacon candidates are only
    /// recorded in the block.
    pub async fn accept_stakes(
        &self,
        stakes: Vec<StakeInstruction>,
    ) -> anyhow::Result<Vec<RawInstruction>> {
        if stakes.is_empty() {
            return Ok(Vec::new());
        }
        let mut known = self.known_validators().await?;

        let mut waiting = self.waiting.lock();
        known.extend(waiting.iter().cloned());

        let mut out = Vec::new();
        for stake in stakes {
            let fresh: Vec<ValidatorKey> = stake
                .candidates
                .into_iter()
                .filter(|candidate| !candidate.is_empty() && known.insert(candidate.clone()))
                .collect();
            if fresh.is_empty() {
                continue;
            }
            if stake.role == StakeRole::Shard {
                waiting.extend(fresh.iter().cloned());
            }
            out.push(
                StakeInstruction {
                    candidates: fresh,
                    role: stake.role,
                }
                .to_raw(),
            );
        }
        debug!(accepted = out.len(), waiting = waiting.len(), "Stakes accepted");
        Ok(out)
    }

    /// Route waiting shard candidates to shard pending queues.
    ///
    /// The block height seeds the shuffle. Candidates beyond the assignment
    /// offset keep waiting.
    pub async fn assign_waiting(
        &self,
        height: BeaconHeight,
    ) -> anyhow::Result<Vec<RawInstruction>> {
        let candidates = self.waiting_candidates();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let assignment = self
            .committees
            .assign_candidates(&candidates, height as i64)
            .await?;
        *self.waiting.lock() = assignment.remaining.clone();
        CANDIDATES_ASSIGNED.inc_by(assignment.assigned_count() as f64);

        let out = assignment
            .assignments
            .iter()
            .map(|(shard_id, assigned)| {
                AssignInstruction {
                    candidates: assigned.clone(),
                    shard_id: *shard_id,
                }
                .to_raw()
            })
            .collect();

        info!(
            height,
            assigned = assignment.assigned_count(),
            remaining = assignment.remaining.len(),
            "Shard candidates assigned"
        );
        self.bus
            .publish(ChainEvent::CandidatesAssigned {
                height,
                assignments: assignment.assignments,
                remaining: assignment.remaining.len(),
            })
            .await;
        Ok(out)
    }

    async fn known_validators(&self) -> anyhow::Result<HashSet<ValidatorKey>> {
        let mut chains: Vec<ChainId> = (0..self.committees.config().active_shards)
            .map(|shard| ChainId::Shard(shard as ShardId))
            .collect();
        chains.push(ChainId::Beacon);

        let mut known = HashSet::new();
        for chain in chains {
            let snapshot = self
                .committees
                .committee(chain)
                .await
                .with_context(|| format!("loading {} committee", chain))?;
            known.extend(snapshot.committee);
            known.extend(snapshot.pending);
        }
        Ok(known)
    }

    /// Convert shard-block instructions into beacon instructions.
    pub fn convert_shard_blocks(
        &self,
        shard_blocks: &[ShardBlock],
        state: &BeaconState,
        params: &dyn ParamsStore,
    ) -> Vec<RawInstruction> {
        let before = self.producer.stats();
        let view = BeaconStateView::new(state, params);
        let mut acc = AccumulativeValues::default();

        let mut out = Vec::new();
        for block in shard_blocks {
            out.extend(self.producer.build_instructions(
                block.shard_id,
                &block.instructions,
                &view,
                &mut acc,
            ));
        }

        let after = self.producer.stats();
        INSTRUCTIONS_PRODUCED
            .with_label_values(&["accepted"])
            .inc_by((after.accepted - before.accepted) as f64);
        INSTRUCTIONS_PRODUCED
            .with_label_values(&["refund"])
            .inc_by((after.refunded - before.refunded) as f64);
        INSTRUCTIONS_SKIPPED
            .with_label_values(&["malformed"])
            .inc_by((after.malformed - before.malformed) as f64);
        INSTRUCTIONS_SKIPPED
            .with_label_values(&["unrecognized"])
            .inc_by((after.unrecognized - before.unrecognized) as f64);

        debug!(produced = out.len(), "Shard blocks converted");
        out
    }

    /// Rotate every active shard committee, then the beacon committee.
    ///
    /// Rotations that change nothing emit no instruction.
    pub async fn rotate_committees(
        &self,
        blacklist: &Blacklist,
    ) -> anyhow::Result<Vec<RawInstruction>> {
        let mut out = Vec::new();
        for shard_id in 0..self.committees.config().active_shards {
            let shard_id = shard_id as ShardId;
            let rotation = self
                .committees
                .rotate_shard(shard_id, blacklist)
                .await
                .with_context(|| format!("rotating shard {}", shard_id))?;
            self.record(ChainId::Shard(shard_id), &rotation, &mut out)
                .await?;
        }

        let rotation = self
            .committees
            .rotate_beacon(blacklist)
            .await
            .context("rotating beacon committee")?;
        self.record(ChainId::Beacon, &rotation, &mut out).await?;
        Ok(out)
    }

    async fn record(
        &self,
        chain: ChainId,
        rotation: &Rotation,
        out: &mut Vec<RawInstruction>,
    ) -> anyhow::Result<()> {
        if rotation.outcome.is_noop() {
            return Ok(());
        }

        let label = match chain {
            ChainId::Beacon => "beacon",
            ChainId::Shard(_) => "shard",
        };
        metric_inc!(COMMITTEE_ROTATIONS, &[label]);
        VALIDATORS_DROPPED.inc_by(rotation.outcome.dropped.len() as f64);

        out.push(
            rotation
                .instruction
                .to_raw()
                .with_context(|| format!("encoding {} swap", chain))?,
        );
        debug!(%chain, "Swap instruction appended");

        self.bus
            .publish(ChainEvent::CommitteeRotated {
                chain,
                added: rotation.outcome.added.clone(),
                dropped: rotation.outcome.dropped.clone(),
            })
            .await;
        Ok(())
    }
}

/// Pull stake instructions out of shard blocks.
///
/// Malformed stakes are logged and dropped, like any other shard instruction
/// the producer cannot read.
fn split_stakes(shard_blocks: &[ShardBlock]) -> (Vec<StakeInstruction>, Vec<ShardBlock>) {
    let mut stakes = Vec::new();
    let mut rest = Vec::with_capacity(shard_blocks.len());
    for block in shard_blocks {
        let mut instructions = Vec::with_capacity(block.instructions.len());
        for raw in &block.instructions {
            if raw.first().map(String::as_str) != Some(STAKE_ACTION) {
                instructions.push(raw.clone());
                continue;
            }
            match StakeInstruction::parse(raw) {
                Ok(stake) => stakes.push(stake),
                Err(err) => {
                    warn!(shard_id = block.shard_id, error = %err, "Stake instruction skipped");
                    metric_inc!(INSTRUCTIONS_SKIPPED, &["malformed"]);
                }
            }
        }
        rest.push(ShardBlock {
            shard_id: block.shard_id,
            instructions,
        });
    }
    (stakes, rest)
}
