//! # Ports Layer
//!
//! - **Inbound**: batch verification API
//! - **Outbound**: the transaction capability and the chain views it reads

pub mod inbound;
pub mod outbound;

pub use inbound::TxVerifierApi;
pub use outbound::{
    BeaconView, ChainContext, ChainRetriever, MockBeaconView, MockChainRetriever,
    MockTransaction, ShardView, Transaction, TransactionPool, TransactionStateDb,
};
