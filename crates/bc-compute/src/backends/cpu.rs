//! CPU compute backend using Rayon
//!
//! Hashing fans out over Rayon's global pool. Output order always matches
//! input order, so callers that sort on digests stay deterministic.

use crate::{ComputeError, DeviceInfo};
use rayon::prelude::*;
use sha2::{Digest, Sha256};

/// CPU-based compute engine
pub struct CpuEngine {
    device_info: DeviceInfo,
}

impl CpuEngine {
    /// Engine sized to the host's logical CPUs.
    pub fn new() -> Self {
        Self::with_compute_units(num_cpus::get())
    }

    /// Engine with an explicit core count (tests, constrained hosts).
    pub fn with_compute_units(compute_units: usize) -> Self {
        let compute_units = compute_units.max(1);
        Self {
            device_info: DeviceInfo {
                name: format!("CPU ({} cores)", compute_units),
                compute_units,
            },
        }
    }

    /// Backend description.
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Workers to dedicate to blocking verification jobs.
    ///
    /// One core stays free for the async runtime; never less than one.
    pub fn worker_count(&self) -> usize {
        self.device_info.compute_units.saturating_sub(1).max(1)
    }

    /// Check a configured worker count against this machine.
    pub fn validate_worker_count(&self, workers: usize) -> Result<usize, ComputeError> {
        if workers == 0 {
            return Err(ComputeError::InvalidWorkerCount(workers));
        }
        Ok(workers)
    }
}

impl Default for CpuEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 every input in parallel, preserving input order.
pub fn batch_sha256<T: AsRef<[u8]> + Sync>(inputs: &[T]) -> Vec<[u8; 32]> {
    inputs
        .par_iter()
        .map(|input| {
            let digest = Sha256::digest(input.as_ref());
            let mut output = [0u8; 32];
            output.copy_from_slice(&digest);
            output
        })
        .collect()
}
