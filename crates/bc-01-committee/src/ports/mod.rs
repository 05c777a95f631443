//! # Ports Layer
//!
//! - `inbound`: what the committee engine offers
//! - `outbound`: what it needs from storage

pub mod inbound;
pub mod outbound;

pub use inbound::CommitteeApi;
pub use outbound::{CommitteeStore, MockCommitteeStore};
