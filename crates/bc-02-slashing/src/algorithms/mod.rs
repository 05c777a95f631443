//! # Algorithms Module
//!
//! Pure blacklist transitions.

pub mod decay;

pub use decay::{collect_punishments, decay_epoch, merge_max, releases};
