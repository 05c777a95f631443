//! Committee Service - rotation and assignment over a [`CommitteeStore`].
//!
//! The service loads a snapshot, runs the pure algorithms, and writes the
//! result back only when the algorithm succeeded.

use crate::algorithms::{remove_validator, swap_validator};
use crate::domain::{
    Assignment, AssignmentState, CommitteeConfig, CommitteeError, CommitteeSnapshot,
    PendingCounts, Rotation, SwapLimits,
};
use crate::ports::{CommitteeApi, CommitteeStore};
use async_trait::async_trait;
use shared_types::{Blacklist, ChainId, ShardId, SwapInstruction, ValidatorKey};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Committee Service
pub struct CommitteeService<S: CommitteeStore> {
    store: Arc<S>,
    config: CommitteeConfig,
}

impl<S: CommitteeStore> CommitteeService<S> {
    /// Create a service, rejecting incoherent limits.
    pub fn new(store: Arc<S>, config: CommitteeConfig) -> Result<Self, CommitteeError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Active configuration.
    pub fn config(&self) -> &CommitteeConfig {
        &self.config
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn limits_for(&self, chain: ChainId) -> Result<&SwapLimits, CommitteeError> {
        match chain {
            ChainId::Beacon => Ok(&self.config.beacon),
            ChainId::Shard(id) if (id as usize) < self.config.active_shards => {
                Ok(&self.config.shard)
            }
            ChainId::Shard(_) => Err(CommitteeError::UnknownCommittee(chain)),
        }
    }

    /// Rotate one shard committee.
    pub async fn rotate_shard(
        &self,
        shard_id: ShardId,
        blacklist: &Blacklist,
    ) -> Result<Rotation, CommitteeError> {
        self.rotate(ChainId::Shard(shard_id), blacklist).await
    }

    /// Current pending queue length of every active shard.
    pub async fn pending_counts(&self) -> Result<PendingCounts, CommitteeError> {
        let mut counts = PendingCounts::new();
        for shard in 0..self.config.active_shards {
            let shard_id = shard as ShardId;
            let snapshot = self.store.load(ChainId::Shard(shard_id)).await?;
            counts.insert(shard_id, snapshot.pending.len());
        }
        Ok(counts)
    }

    /// Rotate the beacon committee.
    pub async fn rotate_beacon(&self, blacklist: &Blacklist) -> Result<Rotation, CommitteeError> {
        self.rotate(ChainId::Beacon, blacklist).await
    }
}

#[async_trait]
impl<S: CommitteeStore> CommitteeApi for CommitteeService<S> {
    #[instrument(skip(self, blacklist), fields(blacklisted = blacklist.len()))]
    async fn rotate(
        &self,
        chain: ChainId,
        blacklist: &Blacklist,
    ) -> Result<Rotation, CommitteeError> {
        let limits = *self.limits_for(chain)?;
        let snapshot = self.store.load(chain).await?;

        let outcome = swap_validator(&snapshot.pending, &snapshot.committee, &limits, blacklist)?;

        let punished: Blacklist = outcome
            .dropped
            .iter()
            .filter_map(|v| blacklist.get(v).map(|epochs| (v.clone(), *epochs)))
            .collect();
        let instruction = SwapInstruction {
            swapped_in: outcome.added.clone(),
            swapped_out: outcome.dropped.clone(),
            chain,
            punished,
        };

        self.store
            .save(
                chain,
                CommitteeSnapshot {
                    committee: outcome.committee.clone(),
                    pending: outcome.remaining_pending.clone(),
                },
            )
            .await?;

        if outcome.is_noop() {
            debug!(%chain, "Committee unchanged");
        } else {
            info!(
                %chain,
                added = outcome.added.len(),
                dropped = outcome.dropped.len(),
                punished = instruction.punished.len(),
                committee = outcome.committee.len(),
                "Committee rotated"
            );
        }

        Ok(Rotation {
            outcome,
            instruction,
        })
    }

    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    async fn assign_candidates(
        &self,
        candidates: &[ValidatorKey],
        seed: i64,
    ) -> Result<Assignment, CommitteeError> {
        let state = AssignmentState::new(self.pending_counts().await?);
        let (_, assignment) = state.assign(
            candidates,
            seed,
            self.config.assign_offset,
            self.config.active_shards,
        )?;

        for (shard_id, validators) in &assignment.assignments {
            self.store
                .append_pending(ChainId::Shard(*shard_id), validators.clone())
                .await?;
        }

        info!(
            assigned = assignment.assigned_count(),
            remaining = assignment.remaining.len(),
            "Candidates assigned"
        );
        Ok(assignment)
    }

    async fn remove_validators(
        &self,
        chain: ChainId,
        to_remove: &[ValidatorKey],
    ) -> Result<Vec<ValidatorKey>, CommitteeError> {
        self.limits_for(chain)?;
        let mut snapshot = self.store.load(chain).await?;
        snapshot.committee = remove_validator(&snapshot.committee, to_remove)?;
        let committee = snapshot.committee.clone();
        self.store.save(chain, snapshot).await?;

        info!(%chain, removed = to_remove.len(), "Validators removed");
        Ok(committee)
    }

    async fn committee(&self, chain: ChainId) -> Result<CommitteeSnapshot, CommitteeError> {
        self.limits_for(chain)?;
        self.store.load(chain).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCommitteeStore;
    use crate::ports::MockCommitteeStore;

    fn keys(names: &[&str]) -> Vec<ValidatorKey> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn service(store: InMemoryCommitteeStore) -> CommitteeService<InMemoryCommitteeStore> {
        CommitteeService::new(Arc::new(store), CommitteeConfig::for_testing()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = CommitteeConfig::for_testing();
        config.active_shards = 0;
        let result = CommitteeService::new(Arc::new(InMemoryCommitteeStore::new()), config);
        assert!(matches!(result, Err(CommitteeError::NoActiveShards)));
    }

    #[tokio::test]
    async fn test_rotate_full_committee() {
        let store = InMemoryCommitteeStore::new().with_committee(
            ChainId::Shard(0),
            keys(&["a", "b", "c", "d"]),
            keys(&["p1", "p2"]),
        );
        let service = service(store);

        let rotation = service.rotate_shard(0, &Blacklist::new()).await.unwrap();
        assert_eq!(rotation.outcome.added, keys(&["p1"]));
        assert_eq!(rotation.outcome.dropped, keys(&["a"]));
        assert_eq!(rotation.instruction.chain, ChainId::Shard(0));
        assert!(rotation.instruction.punished.is_empty());

        let stored = service.committee(ChainId::Shard(0)).await.unwrap();
        assert_eq!(stored.committee, keys(&["b", "c", "d", "p1"]));
        assert_eq!(stored.pending, keys(&["p2"]));
    }

    #[tokio::test]
    async fn test_rotate_punishes_blacklisted_members() {
        let store = InMemoryCommitteeStore::new().with_committee(
            ChainId::Beacon,
            keys(&["a", "bad", "c", "d"]),
            keys(&["p1"]),
        );
        let service = service(store);
        let blacklist = Blacklist::from([("bad".to_string(), 3), ("other".to_string(), 1)]);

        let rotation = service.rotate_beacon(&blacklist).await.unwrap();
        assert!(rotation.outcome.dropped.contains(&"bad".to_string()));
        assert_eq!(
            rotation.instruction.punished,
            Blacklist::from([("bad".to_string(), 3)])
        );
        assert!(!rotation.outcome.committee.contains(&"bad".to_string()));

        let raw = rotation.instruction.to_raw().unwrap();
        assert_eq!(SwapInstruction::parse(&raw).unwrap(), rotation.instruction);
    }

    #[tokio::test]
    async fn test_rotate_unknown_shard() {
        let service = service(InMemoryCommitteeStore::new());
        let result = service.rotate_shard(9, &Blacklist::new()).await;
        assert_eq!(
            result,
            Err(CommitteeError::UnknownCommittee(ChainId::Shard(9)))
        );
    }

    #[tokio::test]
    async fn test_assign_candidates_persists_pending() {
        let service = service(InMemoryCommitteeStore::new());
        let candidates = keys(&["c1", "c2", "c3", "c4", "c5"]);

        let assignment = service.assign_candidates(&candidates, 42).await.unwrap();
        assert_eq!(assignment.assigned_count(), 4);
        assert_eq!(assignment.remaining.len(), 1);

        let counts = service.pending_counts().await.unwrap();
        assert_eq!(counts.values().sum::<usize>(), 4);
        for (shard_id, assigned) in &assignment.assignments {
            let snapshot = service.committee(ChainId::Shard(*shard_id)).await.unwrap();
            assert_eq!(&snapshot.pending, assigned);
            assert_eq!(counts[shard_id], assigned.len());
        }
    }

    #[tokio::test]
    async fn test_pending_counts_follow_rotation() {
        let service = service(InMemoryCommitteeStore::new());

        let first = service
            .assign_candidates(&keys(&["n1", "n2"]), 1)
            .await
            .unwrap();
        assert_eq!(first.assigned_count(), 2);
        for shard_id in 0..2 {
            service.rotate_shard(shard_id, &Blacklist::new()).await.unwrap();
        }
        let drained = service.pending_counts().await.unwrap();
        assert!(drained.values().all(|count| *count == 0), "{:?}", drained);

        // Shard 0 has one queued validator again, shard 1 has none.
        service
            .store()
            .append_pending(ChainId::Shard(0), keys(&["late"]))
            .await
            .unwrap();
        let second = service.assign_candidates(&keys(&["n3"]), 2).await.unwrap();
        assert_eq!(second.assignments.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(
            service.pending_counts().await.unwrap(),
            PendingCounts::from([(0, 1), (1, 1)])
        );
    }

    #[tokio::test]
    async fn test_remove_validators() {
        let store = InMemoryCommitteeStore::new().with_committee(
            ChainId::Shard(1),
            keys(&["a", "b", "c"]),
            Vec::new(),
        );
        let service = service(store);

        let missing = service
            .remove_validators(ChainId::Shard(1), &keys(&["b", "zz"]))
            .await;
        assert_eq!(
            missing,
            Err(CommitteeError::ValidatorNotPresent("zz".to_string()))
        );
        let unchanged = service.committee(ChainId::Shard(1)).await.unwrap();
        assert_eq!(unchanged.committee, keys(&["a", "b", "c"]));

        let committee = service
            .remove_validators(ChainId::Shard(1), &keys(&["b"]))
            .await
            .unwrap();
        assert_eq!(committee, keys(&["a", "c"]));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut mock = MockCommitteeStore::with_snapshot(CommitteeSnapshot {
            committee: keys(&["a", "b"]),
            pending: keys(&["p"]),
        });
        mock.fail_after_writes = Some(0);
        let service =
            CommitteeService::new(Arc::new(mock.clone()), CommitteeConfig::for_testing()).unwrap();

        let result = service.rotate_beacon(&Blacklist::new()).await;
        assert!(matches!(result, Err(CommitteeError::Store(_))));
        assert_eq!(mock.writes(), 0);
    }
}
