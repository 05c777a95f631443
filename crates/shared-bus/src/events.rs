//! # Chain Events
//!
//! Notifications emitted by the block-processing path. Subscribers are
//! observers only; no consensus decision depends on delivery.

use serde::{Deserialize, Serialize};
use shared_types::entities::{BeaconHeight, Blacklist, ChainId, Epoch, Hash, ShardId, ValidatorKey};
use std::collections::BTreeMap;

/// All events that can be published to the notification registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    /// A shard block was accepted into the local view.
    ShardBlockAccepted {
        /// Shard the block belongs to.
        shard_id: ShardId,
        /// Shard height.
        height: u64,
        /// Block hash.
        block_hash: Hash,
    },

    /// A beacon block's instructions were applied.
    BeaconBlockProcessed {
        /// Beacon height.
        height: BeaconHeight,
        /// Epoch containing the height.
        epoch: Epoch,
        /// Number of instructions applied.
        instructions: usize,
    },

    /// A committee changed membership.
    CommitteeRotated {
        /// Committee that rotated.
        chain: ChainId,
        /// Validators promoted into the committee.
        added: Vec<ValidatorKey>,
        /// Validators removed from the committee.
        dropped: Vec<ValidatorKey>,
    },

    /// Staked candidates were routed to shard pending queues.
    CandidatesAssigned {
        /// Height of the block carrying the assignment.
        height: BeaconHeight,
        /// Candidates per receiving shard.
        assignments: BTreeMap<ShardId, Vec<ValidatorKey>>,
        /// Candidates still waiting.
        remaining: usize,
    },

    /// The producer blacklist changed.
    ProducersPunished {
        /// Beacon height the blacklist was stored at.
        height: BeaconHeight,
        /// Full blacklist after the update.
        blacklist: Blacklist,
        /// Validators whose punishment ended and were deleted.
        released: Vec<ValidatorKey>,
    },

    /// A transaction batch finished verification.
    TransactionBatchVerified {
        /// Shard the batch was built for.
        shard_id: ShardId,
        /// Number of transactions checked (after whitelist filtering).
        tx_count: usize,
        /// Whether the batch was accepted.
        accepted: bool,
    },
}

impl ChainEvent {
    /// Get the topic this event belongs to.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ShardBlockAccepted { .. } => EventTopic::ShardChain,
            Self::BeaconBlockProcessed { .. } => EventTopic::BeaconChain,
            Self::CommitteeRotated { .. } | Self::CandidatesAssigned { .. } => {
                EventTopic::Committee
            }
            Self::ProducersPunished { .. } => EventTopic::Slashing,
            Self::TransactionBatchVerified { .. } => EventTopic::Verification,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Shard block events.
    ShardChain,
    /// Beacon block events.
    BeaconChain,
    /// Committee membership events.
    Committee,
    /// Blacklist events.
    Slashing,
    /// Transaction verifier events.
    Verification,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &ChainEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
