//! # Domain Module
//!
//! Metadata types, payloads, beacon state and the parsed instruction forms.

pub mod errors;
pub mod instructions;
pub mod keys;
pub mod metadata;
pub mod payloads;
pub mod state;

pub use errors::*;
pub use instructions::*;
pub use metadata::*;
pub use payloads::*;
pub use state::*;
