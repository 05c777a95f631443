//! Cross-crate flows.

pub mod flows;
