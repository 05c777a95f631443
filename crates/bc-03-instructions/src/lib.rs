//! # BC-03 Instructions
//!
//! Beacon instruction pipeline.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! The producer turns shard-block instructions into beacon instructions,
//! accepting or refunding each request against the beacon state as of the
//! previous block. The processor then applies a beacon block's
//! instructions to that state and to the params store, all or nothing.
//!
//! ## Instruction Layout
//!
//! ```text
//! shard block:  [meta, payload..]
//! beacon block: [meta, shard_id, "accepted" | "refund", payload, ..]
//! reserved:     ["stake" | "swap" | "random" | "assign", ..]
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! bc-03-instructions/
//! ├── domain/          # Metadata types, payloads, state, parsed forms
//! ├── ports/           # ParamsStore
//! ├── adapters/        # In-memory params store
//! ├── producer.rs      # InstructionProducer
//! └── processor.rs     # InstructionProcessor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod processor;
pub mod producer;

// Re-exports
pub use adapters::InMemoryParamsStore;
pub use domain::{
    beacon_instruction, keys, AccumulativeValues, BeaconInstruction, BeaconState,
    BeaconStateView, DividendPayout, InstructionStatus, MetadataType, PipelineError,
    ShardInstruction, StoreError,
};
pub use ports::{MockParamsStore, ParamsBatch, ParamsStore};
pub use processor::{InstructionProcessor, ProcessSummary, StagedBlock};
pub use producer::{InstructionProducer, ProducerStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
