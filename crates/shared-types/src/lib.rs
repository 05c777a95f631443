//! # Shared Types Crate
//!
//! Types shared by every beacon-core crate: validator identities, shard and
//! height aliases, the producer blacklist, and the raw beacon instruction
//! shape together with its reserved action tags.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the swap instruction layout is encoded and
//!   decoded only here, so the committee builder and the slashing ledger can
//!   never disagree on field positions.
//! - **Plain data**: nothing in this crate performs I/O.

pub mod entities;
pub mod errors;
pub mod instruction;

pub use entities::*;
pub use errors::*;
pub use instruction::*;
