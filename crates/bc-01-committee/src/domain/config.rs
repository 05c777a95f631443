//! # Configuration
//!
//! Epoch regimes and committee size limits.

use super::errors::CommitteeError;
use serde::{Deserialize, Serialize};
use shared_types::MAX_SHARD_NUMBER;

/// Epoch parameters.
///
/// Epochs before `epoch_v2_breakpoint` last `epoch` blocks; the breakpoint
/// epoch and every later one last `epoch_v2` blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochParams {
    /// Epoch length before the breakpoint.
    pub epoch: u64,
    /// Epoch length from the breakpoint on.
    pub epoch_v2: u64,
    /// First epoch using `epoch_v2`.
    pub epoch_v2_breakpoint: u64,
    /// Offset of the random draw within a pre-breakpoint epoch.
    pub random_time: u64,
    /// Offset of the random draw within a post-breakpoint epoch.
    pub random_time_v2: u64,
}

impl Default for EpochParams {
    fn default() -> Self {
        Self {
            epoch: 100,
            epoch_v2: 350,
            epoch_v2_breakpoint: 4,
            random_time: 50,
            random_time_v2: 175,
        }
    }
}

impl EpochParams {
    /// Short epochs for tests.
    pub fn for_testing() -> Self {
        Self {
            epoch: 10,
            epoch_v2: 20,
            epoch_v2_breakpoint: 3,
            random_time: 5,
            random_time_v2: 10,
        }
    }

    /// Check the parameters describe a contiguous height axis.
    pub fn validate(&self) -> Result<(), CommitteeError> {
        if self.epoch == 0 || self.epoch_v2 == 0 {
            return Err(CommitteeError::InvalidEpochParams(
                "epoch lengths must be positive".to_string(),
            ));
        }
        if self.epoch_v2_breakpoint == 0 {
            return Err(CommitteeError::InvalidEpochParams(
                "breakpoint epoch must be at least 1".to_string(),
            ));
        }
        if self.random_time > self.epoch {
            return Err(CommitteeError::InvalidEpochParams(format!(
                "random time {} exceeds epoch length {}",
                self.random_time, self.epoch
            )));
        }
        if self.random_time_v2 > self.epoch_v2 {
            return Err(CommitteeError::InvalidEpochParams(format!(
                "random time v2 {} exceeds epoch length {}",
                self.random_time_v2, self.epoch_v2
            )));
        }
        if (self.epoch_v2_breakpoint - 1).checked_mul(self.epoch).is_none() {
            return Err(CommitteeError::InvalidEpochParams(
                "breakpoint height overflows".to_string(),
            ));
        }
        Ok(())
    }
}

/// Limits applied by the committee swapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapLimits {
    /// Maximum committee size.
    pub max_committee_size: usize,
    /// Minimum committee size.
    pub min_committee_size: usize,
    /// Validators promoted per rotation while the committee is not full.
    pub offset: usize,
    /// Validators swapped per rotation once the committee is full.
    pub swap_offset: usize,
}

/// Committee engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeConfig {
    /// Shard committee limits.
    pub shard: SwapLimits,
    /// Beacon committee limits.
    pub beacon: SwapLimits,
    /// Candidates assigned to shards per assignment round.
    pub assign_offset: usize,
    /// Number of active shards.
    pub active_shards: usize,
}

impl Default for CommitteeConfig {
    fn default() -> Self {
        let limits = SwapLimits {
            max_committee_size: 32,
            min_committee_size: 4,
            offset: 4,
            swap_offset: 1,
        };
        Self {
            shard: limits,
            beacon: limits,
            assign_offset: 8,
            active_shards: 8,
        }
    }
}

impl CommitteeConfig {
    /// Small committees for tests.
    pub fn for_testing() -> Self {
        let limits = SwapLimits {
            max_committee_size: 4,
            min_committee_size: 2,
            offset: 2,
            swap_offset: 1,
        };
        Self {
            shard: limits,
            beacon: limits,
            assign_offset: 4,
            active_shards: 2,
        }
    }

    /// Check limits are coherent.
    pub fn validate(&self) -> Result<(), CommitteeError> {
        for (name, limits) in [("shard", &self.shard), ("beacon", &self.beacon)] {
            if limits.max_committee_size == 0 {
                return Err(CommitteeError::InvalidConfig(format!(
                    "{} max committee size must be positive",
                    name
                )));
            }
            if limits.min_committee_size > limits.max_committee_size {
                return Err(CommitteeError::InvalidConfig(format!(
                    "{} min committee size {} exceeds max {}",
                    name, limits.min_committee_size, limits.max_committee_size
                )));
            }
        }
        if self.active_shards == 0 {
            return Err(CommitteeError::NoActiveShards);
        }
        if self.active_shards > MAX_SHARD_NUMBER {
            return Err(CommitteeError::TooManyShards(self.active_shards));
        }
        Ok(())
    }
}
