//! # Adapters Layer

mod in_memory_pool;
mod state_db;

pub use in_memory_pool::InMemoryTransactionPool;
pub use state_db::{InMemoryStateDb, SnapshotShardView};
