//! # Ports Layer

pub mod outbound;

pub use outbound::{MockParamsStore, ParamsBatch, ParamsStore};
