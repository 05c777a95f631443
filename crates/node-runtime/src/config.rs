//! # Node Configuration
//!
//! Defaults for every component, overridden from `BC_*` environment
//! variables and validated as a whole.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BC_EPOCH`, `BC_EPOCH_V2`, `BC_EPOCH_V2_BREAKPOINT` | epoch lengths |
//! | `BC_RANDOM_TIME`, `BC_RANDOM_TIME_V2` | random draw offsets |
//! | `BC_MAX_COMMITTEE`, `BC_MIN_COMMITTEE` | committee size bounds |
//! | `BC_PROMOTE_OFFSET`, `BC_SWAP_OFFSET` | rotation offsets |
//! | `BC_ASSIGN_OFFSET`, `BC_ACTIVE_SHARDS` | candidate assignment |
//! | `BC_VERIFY_TIMEOUT_MS`, `BC_VERIFY_WORKERS` | verifier pool |
//! | `BC_TX_WHITELIST`, `BC_CHAIN_STATE_BYPASS` | comma-separated hex hashes |
//! | `BC_DATA_DIR` | storage directory |

use bc_01_committee::{CommitteeConfig, CommitteeError, EpochParams};
use bc_04_tx_verifier::{TxHash, VerifierConfig, VerifierError};
use bc_telemetry::TelemetryConfig;
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// Epoch or committee settings are inconsistent.
    #[error(transparent)]
    Committee(#[from] CommitteeError),

    /// Verifier settings are unusable.
    #[error(transparent)]
    Verifier(#[from] VerifierError),
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Epoch regimes.
    pub epochs: EpochParams,
    /// Committee limits and assignment.
    pub committee: CommitteeConfig,
    /// Transaction verifier.
    pub verifier: VerifierConfig,
    /// Storage directory.
    pub data_dir: PathBuf,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            epochs: EpochParams::default(),
            committee: CommitteeConfig::default(),
            verifier: VerifierConfig::default(),
            data_dir: PathBuf::from("./data"),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Small epochs, committees and deadlines for tests.
    pub fn for_testing() -> Self {
        Self {
            epochs: EpochParams::for_testing(),
            committee: CommitteeConfig::for_testing(),
            verifier: VerifierConfig::for_testing(),
            data_dir: PathBuf::from("./data-test"),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Load overrides through `lookup`, starting from defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let env = Lookup(&lookup);

        env.set("BC_EPOCH", &mut config.epochs.epoch)?;
        env.set("BC_EPOCH_V2", &mut config.epochs.epoch_v2)?;
        env.set("BC_EPOCH_V2_BREAKPOINT", &mut config.epochs.epoch_v2_breakpoint)?;
        env.set("BC_RANDOM_TIME", &mut config.epochs.random_time)?;
        env.set("BC_RANDOM_TIME_V2", &mut config.epochs.random_time_v2)?;

        for limits in [&mut config.committee.shard, &mut config.committee.beacon] {
            env.set("BC_MAX_COMMITTEE", &mut limits.max_committee_size)?;
            env.set("BC_MIN_COMMITTEE", &mut limits.min_committee_size)?;
            env.set("BC_PROMOTE_OFFSET", &mut limits.offset)?;
            env.set("BC_SWAP_OFFSET", &mut limits.swap_offset)?;
        }
        env.set("BC_ASSIGN_OFFSET", &mut config.committee.assign_offset)?;
        env.set("BC_ACTIVE_SHARDS", &mut config.committee.active_shards)?;

        let mut timeout_ms = config.verifier.timeout.as_millis() as u64;
        env.set("BC_VERIFY_TIMEOUT_MS", &mut timeout_ms)?;
        config.verifier.timeout = Duration::from_millis(timeout_ms);
        env.set("BC_VERIFY_WORKERS", &mut config.verifier.workers)?;
        if let Some(hashes) = env.hashes("BC_TX_WHITELIST")? {
            config.verifier.whitelist = hashes;
        }
        if let Some(hashes) = env.hashes("BC_CHAIN_STATE_BYPASS")? {
            config.verifier.chain_state_bypass = hashes;
        }

        if let Some(dir) = lookup("BC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Check every component's settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.epochs.validate()?;
        self.committee.validate()?;
        self.verifier.validate()?;
        Ok(())
    }
}

struct Lookup<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    fn set<T>(&self, var: &'static str, target: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if let Some(value) = (self.0)(var) {
            *target = value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
                var,
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn hashes(&self, var: &'static str) -> Result<Option<HashSet<TxHash>>, ConfigError> {
        let Some(value) = (self.0)(var) else {
            return Ok(None);
        };
        let invalid = |reason: String| ConfigError::InvalidVar {
            var,
            value: value.clone(),
            reason,
        };
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let bytes = hex::decode(item).map_err(|e| invalid(e.to_string()))?;
                TxHash::try_from(bytes.as_slice())
                    .map_err(|_| invalid(format!("hash {} is not 32 bytes", item)))
            })
            .collect::<Result<HashSet<_>, _>>()
            .map(Some)
    }
}
