//! # Node Runtime
//!
//! Wires the beacon core together.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! The domain crates know nothing about metrics, events or disks. This crate
//! adds them around the domain services: every applied block, rotation and
//! verified batch is counted in Prometheus and announced on the event bus.
//!
//! ## Module Structure
//!
//! ```text
//! node-runtime/
//! ├── config.rs        # NodeConfig from BC_* environment variables
//! ├── builder.rs       # Beacon block bodies: shard instructions + swaps
//! ├── processor.rs     # Applies beacon blocks: params, then blacklist
//! ├── verification.rs  # Metrics and events around the tx verifier
//! ├── node.rs          # BeaconNode: all components on one bus
//! └── storage/         # RocksDB params/blacklist store (feature "rocksdb")
//! ```
//!
//! ## Block Flow
//!
//! ```text
//! shard blocks ──► BeaconBlockBuilder ──► body ──► BeaconBlockProcessor
//!                    │ InstructionProducer            │ InstructionProcessor
//!                    └ CommitteeService (epoch start) └ ProducerBlacklistLedger
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod node;
pub mod processor;
pub mod storage;
pub mod verification;

// Re-exports
pub use builder::{BeaconBlockBuilder, ShardBlock};
pub use config::{ConfigError, NodeConfig};
pub use node::{BeaconNode, InMemoryNode, NodeStores};
pub use processor::{BeaconBlockProcessor, BlockOutcome};
pub use storage::StorageError;
#[cfg(feature = "rocksdb")]
pub use storage::{RocksDbConfig, RocksDbStore};
pub use verification::{outcome_label, VerificationGate};

use bc_telemetry::{init_telemetry, TelemetryError, TelemetryGuard};

/// Install logging and register metrics for `config`.
///
/// Keep the guard alive for as long as the node runs.
pub fn init_node_telemetry(config: &NodeConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_telemetry(&config.telemetry)
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
