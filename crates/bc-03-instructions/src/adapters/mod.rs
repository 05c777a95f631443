//! # Adapters Layer

mod in_memory_params;

pub use in_memory_params::InMemoryParamsStore;
