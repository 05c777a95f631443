//! # Domain Module
//!
//! Core domain types for the committee engine.

pub mod config;
pub mod entities;
pub mod errors;

pub use config::*;
pub use entities::*;
pub use errors::*;
