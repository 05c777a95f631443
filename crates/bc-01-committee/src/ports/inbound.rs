//! # Inbound Ports
//!
//! API trait defining what the committee engine can do.

use crate::domain::{Assignment, CommitteeError, CommitteeSnapshot, Rotation};
use async_trait::async_trait;
use shared_types::{Blacklist, ChainId, ValidatorKey};

/// Committee engine API - inbound port.
#[async_trait]
pub trait CommitteeApi: Send + Sync {
    /// Rotate the committee of `chain`, punishing blacklisted members.
    async fn rotate(&self, chain: ChainId, blacklist: &Blacklist)
        -> Result<Rotation, CommitteeError>;

    /// Deal candidates to shard pending queues.
    async fn assign_candidates(
        &self,
        candidates: &[ValidatorKey],
        seed: i64,
    ) -> Result<Assignment, CommitteeError>;

    /// Remove validators from the committee of `chain`.
    ///
    /// Fails without changes if any of them is not a member.
    async fn remove_validators(
        &self,
        chain: ChainId,
        to_remove: &[ValidatorKey],
    ) -> Result<Vec<ValidatorKey>, CommitteeError>;

    /// Current committee and pending queue of `chain`.
    async fn committee(&self, chain: ChainId) -> Result<CommitteeSnapshot, CommitteeError>;
}
