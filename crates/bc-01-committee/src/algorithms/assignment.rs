//! # Shard Candidate Assignment
//!
//! Shuffled candidates are dealt round-robin across active shards, starting
//! at the shard with the fewest pending validators. At most `offset`
//! candidates move per call; the rest stay in `remaining`.

use super::shuffle::shuffle;
use crate::domain::{Assignment, AssignmentState, CommitteeError, PendingCounts};
use shared_types::{ShardId, ValidatorKey, MAX_SHARD_NUMBER};
use std::collections::BTreeMap;

/// Assign candidates to shards, incrementing `pending` once per assignment.
pub fn assign_candidates(
    candidates: &[ValidatorKey],
    pending: &mut PendingCounts,
    seed: i64,
    offset: usize,
    active_shards: usize,
) -> Result<Assignment, CommitteeError> {
    if active_shards == 0 {
        return Err(CommitteeError::NoActiveShards);
    }
    if active_shards > MAX_SHARD_NUMBER {
        return Err(CommitteeError::TooManyShards(active_shards));
    }

    let shuffled = shuffle(candidates, seed);
    let mut pointer = least_loaded_shard(pending, active_shards);
    let mut assignments: BTreeMap<ShardId, Vec<ValidatorKey>> = BTreeMap::new();

    let mut queue = shuffled.into_iter();
    for candidate in queue.by_ref().take(offset) {
        let shard_id = pointer as ShardId;
        assignments.entry(shard_id).or_default().push(candidate);
        *pending.entry(shard_id).or_insert(0) += 1;
        pointer = (pointer + 1) % active_shards;
    }

    Ok(Assignment {
        remaining: queue.collect(),
        assignments,
    })
}

/// Lowest-index shard among those with the fewest pending validators.
fn least_loaded_shard(pending: &PendingCounts, active_shards: usize) -> usize {
    (0..active_shards)
        .min_by_key(|shard| {
            let count = pending.get(&(*shard as ShardId)).copied().unwrap_or(0);
            (count, *shard)
        })
        .unwrap_or(0)
}

impl AssignmentState {
    /// Run one assignment pass, returning the next snapshot.
    ///
    /// `self` is left untouched.
    pub fn assign(
        &self,
        candidates: &[ValidatorKey],
        seed: i64,
        offset: usize,
        active_shards: usize,
    ) -> Result<(AssignmentState, Assignment), CommitteeError> {
        let mut next = self.pending.clone();
        let assignment = assign_candidates(candidates, &mut next, seed, offset, active_shards)?;
        Ok((AssignmentState::new(next), assignment))
    }
}
