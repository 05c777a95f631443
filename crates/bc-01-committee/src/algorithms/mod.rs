//! # Algorithms Module
//!
//! Pure committee algorithms. Nothing here touches storage.

pub mod assignment;
pub mod epoch;
pub mod shuffle;
pub mod swap;

pub use assignment::assign_candidates;
pub use epoch::EpochCalculator;
pub use shuffle::shuffle;
pub use swap::{remove_validator, swap, swap_validator};
