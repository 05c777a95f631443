//! # Integration Flows
//!
//! Committee, slashing, instruction and verifier crates working together
//! through node-runtime and the shared bus.
//!
//! 1. **Rotation → ledger**: a rotation punishes a blacklisted member, the
//!    swap instruction carries the punishment into the ledger, and the
//!    epoch boundary releases it.
//! 2. **Assignment → rotation**: dealt candidates wait in pending queues
//!    until an epoch start promotes them. Staked candidates are dealt at the
//!    epoch's random time.
//! 3. **Verifier → bus**: batch verdicts reach subscribers of the
//!    verification topic only.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bc_01_committee::{
        CommitteeApi, CommitteeConfig, CommitteeService, EpochCalculator, EpochParams,
        InMemoryCommitteeStore,
    };
    use bc_02_slashing::{BlacklistLedgerApi, InMemoryBlacklistStore};
    use bc_03_instructions::{InMemoryParamsStore, MetadataType};
    use bc_04_tx_verifier::{
        InMemoryStateDb, MockBeaconView, MockChainRetriever, MockTransaction, SnapshotShardView,
        Transaction, VerifierError,
    };
    use node_runtime::{
        BeaconBlockProcessor, BeaconNode, InMemoryNode, NodeConfig, NodeStores, ShardBlock,
    };
    use shared_bus::{ChainEvent, EventFilter, EventTopic, InMemoryEventBus};
    use shared_types::{Blacklist, ChainId, SwapInstruction};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn epochs() -> EpochCalculator {
        EpochCalculator::new(EpochParams::for_testing()).unwrap()
    }

    fn node_with(store: InMemoryCommitteeStore) -> InMemoryNode {
        let mut stores = NodeStores::in_memory();
        stores.committees = Arc::new(store);
        BeaconNode::new(NodeConfig::for_testing(), stores).unwrap()
    }

    // =========================================================================
    // ROTATION → LEDGER → RELEASE
    // =========================================================================

    #[tokio::test]
    async fn test_punishment_lifecycle() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut slashing = bus.subscribe(EventFilter::topics(vec![EventTopic::Slashing]));

        let committees = CommitteeService::new(
            Arc::new(InMemoryCommitteeStore::new().with_committee(
                ChainId::Shard(0),
                keys(&["a", "b", "c"]),
                keys(&["n1"]),
            )),
            CommitteeConfig::for_testing(),
        )
        .unwrap();
        let processor = BeaconBlockProcessor::new(
            Arc::new(InMemoryBlacklistStore::new()),
            Arc::new(InMemoryParamsStore::new()),
            epochs(),
            bus.clone(),
        );

        // Evidence from elsewhere marks "a" for one epoch.
        let evidence = Blacklist::from([("a".to_string(), 1u8)]);
        let rotation = committees.rotate_shard(0, &evidence).await.unwrap();
        assert_eq!(rotation.outcome.dropped, keys(&["a"]));
        assert_eq!(rotation.outcome.added, keys(&["n1"]));

        let swap = rotation.instruction.to_raw().unwrap();
        assert_eq!(SwapInstruction::parse(&swap).unwrap(), rotation.instruction);

        processor.process_block(1, &[swap]).await.unwrap();
        assert_eq!(processor.blacklist(), evidence);
        match slashing.try_recv().unwrap() {
            Some(ChainEvent::ProducersPunished { height, blacklist, released }) => {
                assert_eq!(height, 1);
                assert_eq!(blacklist, evidence);
                assert!(released.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }

        let boundary = epochs().last_height(1);
        for height in 2..=boundary {
            processor.process_block(height, &[]).await.unwrap();
        }
        assert!(processor.blacklist().is_empty());
        match slashing.try_recv().unwrap() {
            Some(ChainEvent::ProducersPunished { height, released, .. }) => {
                assert_eq!(height, boundary);
                assert_eq!(released, keys(&["a"]));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(processor.ledger().stats().epochs_closed, 1);
    }

    #[tokio::test]
    async fn test_blacklisted_candidate_stays_pending() {
        let committees = CommitteeService::new(
            Arc::new(InMemoryCommitteeStore::new().with_committee(
                ChainId::Shard(1),
                keys(&["a", "b"]),
                keys(&["bad", "good"]),
            )),
            CommitteeConfig::for_testing(),
        )
        .unwrap();

        let blacklist = Blacklist::from([("bad".to_string(), 3u8)]);
        let rotation = committees.rotate_shard(1, &blacklist).await.unwrap();

        assert_eq!(rotation.outcome.added, keys(&["good"]));
        assert!(rotation.instruction.punished.is_empty());
        let snapshot = committees.committee(ChainId::Shard(1)).await.unwrap();
        assert_eq!(snapshot.pending, keys(&["bad"]));
        assert!(!snapshot.committee.contains(&"bad".to_string()));
    }

    // =========================================================================
    // ASSIGNMENT → EPOCH START ROTATION
    // =========================================================================

    #[tokio::test]
    async fn test_assigned_candidates_join_at_epoch_start() {
        let node = node_with(
            InMemoryCommitteeStore::new()
                .with_committee(ChainId::Shard(0), keys(&["a", "b"]), vec![])
                .with_committee(ChainId::Shard(1), keys(&["c", "d"]), vec![])
                .with_committee(ChainId::Beacon, keys(&["x", "y"]), vec![]),
        );
        let mut rotations = node.subscribe(EventFilter::topics(vec![EventTopic::Committee]));

        let assignment = node
            .committees()
            .assign_candidates(&keys(&["n1", "n2"]), 42)
            .await
            .unwrap();
        assert_eq!(assignment.assigned_count(), 2);
        assert_eq!(assignment.assignments.len(), 2);

        let boundary = epochs().last_height(1);
        for _ in 0..boundary {
            node.advance(&[]).await.unwrap();
        }
        assert!(rotations.try_recv().unwrap().is_none());

        let opening = node.advance(&[]).await.unwrap();
        assert_eq!(opening.height, boundary + 1);
        assert_eq!(opening.epoch, 2);

        let mut promoted = Vec::new();
        while let Some(event) = rotations.try_recv().unwrap() {
            if let ChainEvent::CommitteeRotated { added, dropped, .. } = event {
                assert!(dropped.is_empty());
                promoted.extend(added);
            }
        }
        promoted.sort();
        assert_eq!(promoted, keys(&["n1", "n2"]));
    }

    #[tokio::test]
    async fn test_staked_candidates_assigned_then_promoted() {
        let node = node_with(
            InMemoryCommitteeStore::new()
                .with_committee(ChainId::Shard(0), keys(&["a", "b"]), vec![])
                .with_committee(ChainId::Shard(1), keys(&["c", "d"]), vec![])
                .with_committee(ChainId::Beacon, keys(&["x", "y"]), vec![]),
        );
        let mut committee = node.subscribe(EventFilter::topics(vec![EventTopic::Committee]));

        node.advance(&[ShardBlock {
            shard_id: 0,
            instructions: vec![vec![
                "stake".to_string(),
                "n1,n2,a".to_string(),
                "shard".to_string(),
            ]],
        }])
        .await
        .unwrap();

        let random_time = epochs().random_time(1);
        while node.state().height < random_time {
            node.advance(&[]).await.unwrap();
        }
        match committee.try_recv().unwrap() {
            Some(ChainEvent::CandidatesAssigned {
                height,
                assignments,
                remaining,
            }) => {
                assert_eq!(height, random_time);
                assert_eq!(remaining, 0);
                let mut dealt: Vec<String> = assignments.into_values().flatten().collect();
                dealt.sort();
                assert_eq!(dealt, keys(&["n1", "n2"]));
            }
            other => panic!("unexpected event {:?}", other),
        }

        while node.state().height <= epochs().last_height(1) {
            node.advance(&[]).await.unwrap();
        }
        let mut promoted = Vec::new();
        while let Some(event) = committee.try_recv().unwrap() {
            if let ChainEvent::CommitteeRotated { added, .. } = event {
                promoted.extend(added);
            }
        }
        promoted.sort();
        assert_eq!(promoted, keys(&["n1", "n2"]));
    }

    #[tokio::test]
    async fn test_removed_validator_not_rotated_back() {
        let node = node_with(InMemoryCommitteeStore::new().with_committee(
            ChainId::Shard(0),
            keys(&["a", "b", "c"]),
            keys(&["n1"]),
        ));

        let remaining = node
            .committees()
            .remove_validators(ChainId::Shard(0), &keys(&["b"]))
            .await
            .unwrap();
        assert_eq!(remaining, keys(&["a", "c"]));

        let rotation = node
            .committees()
            .rotate_shard(0, &Blacklist::new())
            .await
            .unwrap();
        assert_eq!(rotation.outcome.committee, keys(&["a", "c", "n1"]));

        let missing = node
            .committees()
            .remove_validators(ChainId::Shard(0), &keys(&["b"]))
            .await;
        assert!(missing.is_err());
    }

    // =========================================================================
    // INSTRUCTIONS THROUGH THE NODE
    // =========================================================================

    #[tokio::test]
    async fn test_malformed_shard_instruction_does_not_block_chain() {
        let node = node_with(InMemoryCommitteeStore::new());
        let loan = vec![
            MetadataType::LoanRequest.tag(),
            r#"{"loan_id":"L7","receiver":"r","amount":9}"#.to_string(),
        ];
        let garbage = vec![MetadataType::LoanRequest.tag()];

        let outcome = node
            .advance(&[ShardBlock {
                shard_id: 1,
                instructions: vec![garbage, loan.clone()],
            }])
            .await
            .unwrap();
        assert_eq!(outcome.summary.applied, 1);

        // The same loan again is rejected by the processor and the block
        // with it never lands.
        let err = node
            .advance(&[ShardBlock {
                shard_id: 1,
                instructions: vec![loan],
            }])
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("block 2"));
        assert_eq!(node.state().height, 1);
    }

    // =========================================================================
    // VERIFIER → BUS
    // =========================================================================

    #[tokio::test]
    async fn test_verification_verdicts_on_bus() {
        let node = node_with(InMemoryCommitteeStore::new());
        let mut verdicts = node.subscribe(EventFilter::topics(vec![EventTopic::Verification]));
        let mut beacon_only = node.subscribe(EventFilter::topics(vec![EventTopic::BeaconChain]));

        let shard = Arc::new(SnapshotShardView::new(1, 3, InMemoryStateDb::new()));
        let txs: Vec<Arc<dyn Transaction>> = vec![
            Arc::new(MockTransaction::new(1).spending(&[10])),
            Arc::new(MockTransaction::new(2).spending(&[11])),
        ];
        node.verification()
            .verify(
                Arc::new(MockChainRetriever::default()),
                shard.clone(),
                Arc::new(MockBeaconView { height: 4 }),
                &txs,
            )
            .await
            .unwrap();

        let conflicting: Vec<Arc<dyn Transaction>> = vec![
            Arc::new(MockTransaction::new(3).spending(&[12])),
            Arc::new(MockTransaction::new(4).spending(&[12])),
        ];
        let err = node
            .verification()
            .verify(
                Arc::new(MockChainRetriever::default()),
                shard,
                Arc::new(MockBeaconView { height: 4 }),
                &conflicting,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::DoubleSpendInBatch { .. }));

        assert_eq!(
            verdicts.try_recv().unwrap(),
            Some(ChainEvent::TransactionBatchVerified {
                shard_id: 1,
                tx_count: 2,
                accepted: true,
            })
        );
        assert_eq!(
            verdicts.try_recv().unwrap(),
            Some(ChainEvent::TransactionBatchVerified {
                shard_id: 1,
                tx_count: 2,
                accepted: false,
            })
        );
        assert_eq!(beacon_only.try_recv().unwrap(), None);
    }
}
