//! # Algorithms
//!
//! Synchronous passes that run before and after the parallel checks.

pub mod double_spend;
pub mod filters;

pub use double_spend::check_double_spend_in_batch;
pub use filters::{check_stake_spam, filter_whitelisted, partition_validated};
