//! # Inbound Ports

use crate::domain::{BlacklistStats, BlacklistUpdate, SlashingError};
use shared_types::{BeaconHeight, Blacklist, RawInstruction};

/// Blacklist ledger API - inbound port.
pub trait BlacklistLedgerApi: Send + Sync {
    /// Apply one beacon block and persist the resulting blacklist.
    fn process_block(
        &self,
        height: BeaconHeight,
        instructions: &[RawInstruction],
    ) -> Result<BlacklistUpdate, SlashingError>;

    /// Blacklist after the last applied block.
    fn current(&self) -> Blacklist;

    /// Counters since start.
    fn stats(&self) -> BlacklistStats;
}
