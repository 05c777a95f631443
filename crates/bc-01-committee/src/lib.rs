//! # BC-01 Committee
//!
//! Committee membership for the beacon chain and every shard.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Deterministic seeded shuffle of validator candidates
//! - Round-robin assignment of candidates to shard pending queues
//! - Committee rotation that evicts blacklisted producers without dropping
//!   below the minimum committee size
//! - Height to epoch arithmetic across the epoch length breakpoint
//!
//! ## Module Structure
//!
//! ```text
//! bc-01-committee/
//! ├── domain/          # Config, snapshots, swap outcomes, errors
//! ├── algorithms/      # shuffle, assignment, swap, epoch
//! ├── ports/           # CommitteeApi + CommitteeStore
//! ├── adapters/        # In-memory store
//! └── service.rs       # CommitteeService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::InMemoryCommitteeStore;
pub use algorithms::{
    assign_candidates, remove_validator, shuffle, swap, swap_validator, EpochCalculator,
};
pub use domain::{
    Assignment, AssignmentState, CommitteeConfig, CommitteeError, CommitteeSnapshot, EpochParams,
    PendingCounts, Rotation, SwapLimits, SwapOutcome,
};
pub use ports::{CommitteeApi, CommitteeStore, MockCommitteeStore};
pub use service::CommitteeService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
