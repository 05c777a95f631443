//! # Adapters Layer
//!
//! Implements outbound port traits for the committee engine.

mod in_memory_store;

pub use in_memory_store::InMemoryCommitteeStore;
