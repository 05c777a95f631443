//! # BC-02 Slashing
//!
//! Producer blacklist ledger.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! A blacklisted producer cannot re-enter a committee until its punishment,
//! counted in epochs, runs out. Punishments decay by one at every epoch
//! boundary and are raised by swap instructions that evict misbehaving
//! producers.
//!
//! ## Module Structure
//!
//! ```text
//! bc-02-slashing/
//! ├── domain/          # Batches, updates, stats, errors
//! ├── algorithms/      # decay, merge, release filter
//! ├── ports/           # BlacklistLedgerApi + BlacklistStore
//! ├── adapters/        # In-memory store
//! └── service.rs       # ProducerBlacklistLedger
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryBlacklistStore;
pub use algorithms::{collect_punishments, decay_epoch, merge_max, releases};
pub use domain::{BlacklistBatch, BlacklistStats, BlacklistUpdate, SlashingError};
pub use ports::{BlacklistLedgerApi, BlacklistStore, MockBlacklistStore};
pub use service::ProducerBlacklistLedger;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
