//! # Domain Entities
//!
//! Values produced and consumed by the committee algorithms.

use serde::{Deserialize, Serialize};
use shared_types::{ShardId, SwapInstruction, ValidatorKey};
use std::collections::BTreeMap;

/// Pending validator count per shard.
pub type PendingCounts = BTreeMap<ShardId, usize>;

/// Result of one candidate assignment pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Candidates not assigned this pass, in shuffle order.
    pub remaining: Vec<ValidatorKey>,
    /// New assignments per shard. Shards that received nobody are absent.
    pub assignments: BTreeMap<ShardId, Vec<ValidatorKey>>,
}

impl Assignment {
    /// Number of candidates assigned to any shard.
    pub fn assigned_count(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }
}

/// Immutable snapshot of per-shard pending counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentState {
    pub(crate) pending: PendingCounts,
}

impl AssignmentState {
    /// Snapshot from existing counts.
    pub fn new(pending: PendingCounts) -> Self {
        Self { pending }
    }

    /// All counts.
    pub fn pending_counts(&self) -> &PendingCounts {
        &self.pending
    }

    /// Count for one shard (missing shards count as zero).
    pub fn pending_for(&self, shard_id: ShardId) -> usize {
        self.pending.get(&shard_id).copied().unwrap_or(0)
    }
}

/// Result of a committee swap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    /// Validators still waiting.
    pub remaining_pending: Vec<ValidatorKey>,
    /// The committee after the swap.
    pub committee: Vec<ValidatorKey>,
    /// Validators removed from the committee.
    pub dropped: Vec<ValidatorKey>,
    /// Validators promoted into the committee.
    pub added: Vec<ValidatorKey>,
}

impl SwapOutcome {
    /// True when membership did not change.
    pub fn is_noop(&self) -> bool {
        self.dropped.is_empty() && self.added.is_empty()
    }
}

/// Stored committee of one chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeSnapshot {
    /// Active committee, rotation order.
    pub committee: Vec<ValidatorKey>,
    /// Validators waiting to join, queue order.
    pub pending: Vec<ValidatorKey>,
}

/// A completed rotation: new membership plus the instruction recording it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rotation {
    /// Swap result.
    pub outcome: SwapOutcome,
    /// Instruction to include in the beacon block.
    pub instruction: SwapInstruction,
}
