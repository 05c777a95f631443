//! # Verifier Configuration

use super::entities::TxHash;
use super::errors::VerifierError;
use bc_compute::CpuEngine;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Verifier settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Deadline for one batch.
    pub timeout: Duration,
    /// Worker count. Zero means one per spare CPU core.
    pub workers: usize,
    /// Pre-approved transactions, never checked.
    pub whitelist: HashSet<TxHash>,
    /// Transactions whose chain-state check is skipped.
    pub chain_state_bypass: HashSet<TxHash>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            workers: 0,
            whitelist: HashSet::new(),
            chain_state_bypass: HashSet::new(),
        }
    }
}

impl VerifierConfig {
    /// Two workers and a short deadline.
    pub fn for_testing() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            workers: 2,
            ..Self::default()
        }
    }

    /// Workers to spawn, resolving zero against the CPU budget.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            CpuEngine::new().worker_count()
        } else {
            self.workers
        }
    }

    /// Reject configurations the verifier cannot run with.
    pub fn validate(&self) -> Result<(), VerifierError> {
        if self.timeout.is_zero() {
            return Err(VerifierError::InvalidConfig(
                "timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
