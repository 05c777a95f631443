//! # BC-Compute: CPU Compute Helpers
//!
//! Shared compute layer for the consensus core:
//!
//! - [`CpuEngine`] reports how much parallelism the node should use.
//! - [`batch_sha256`] hashes many inputs in parallel, returning digests in
//!   input order.
//! - [`WorkerPool`] runs a queue of blocking jobs on a fixed number of
//!   workers, with first-error cancellation and a global deadline.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bc_compute::{CpuEngine, WorkerPool};
//!
//! let engine = CpuEngine::new();
//! let pool = WorkerPool::new(engine.worker_count(), Duration::from_secs(10));
//! let summary = pool.run_all(jobs).await?;
//! ```

pub mod backends;
pub mod pool;

pub use backends::cpu::{batch_sha256, CpuEngine};
pub use pool::{Job, PoolError, PoolSummary, WorkerPool};

use thiserror::Error;

/// Compute engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("Invalid worker count: {0}")]
    InvalidWorkerCount(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend name.
    pub name: String,
    /// Parallel workers the backend can use.
    pub compute_units: usize,
}
