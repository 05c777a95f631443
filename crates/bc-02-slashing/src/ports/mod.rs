//! # Ports Layer

pub mod inbound;
pub mod outbound;

pub use inbound::BlacklistLedgerApi;
pub use outbound::{BlacklistStore, MockBlacklistStore};
