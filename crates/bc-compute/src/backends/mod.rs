//! Compute backends
//!
//! Only the CPU backend exists; it runs on Rayon's global pool.

pub mod cpu;
