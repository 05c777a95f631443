//! Prometheus metrics for the beacon core.
//!
//! All metrics follow the naming convention: `bc_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // COMMITTEE METRICS
    // =========================================================================

    /// Committee rotations by chain kind
    pub static ref COMMITTEE_ROTATIONS: CounterVec = CounterVec::new(
        Opts::new("bc_committee_rotations_total", "Committee rotations applied"),
        &["chain"]  // chain: beacon/shard
    ).expect("metric creation failed");

    /// Validators swapped out of committees
    pub static ref VALIDATORS_DROPPED: Counter = Counter::new(
        "bc_committee_validators_dropped_total",
        "Validators dropped from committees"
    ).expect("metric creation failed");

    /// Staked candidates routed to shard pending queues
    pub static ref CANDIDATES_ASSIGNED: Counter = Counter::new(
        "bc_committee_candidates_assigned_total",
        "Candidates assigned to shard pending queues"
    ).expect("metric creation failed");

    // =========================================================================
    // SLASHING METRICS
    // =========================================================================

    /// Current producer blacklist size
    pub static ref BLACKLIST_SIZE: Gauge = Gauge::new(
        "bc_slashing_blacklist_size",
        "Validators currently on the producer blacklist"
    ).expect("metric creation failed");

    /// Validators released after serving their punishment
    pub static ref BLACKLIST_RELEASED: Counter = Counter::new(
        "bc_slashing_released_total",
        "Validators removed from the blacklist after their punishment ended"
    ).expect("metric creation failed");

    // =========================================================================
    // INSTRUCTION PIPELINE METRICS
    // =========================================================================

    /// Beacon instructions emitted by the producer
    pub static ref INSTRUCTIONS_PRODUCED: CounterVec = CounterVec::new(
        Opts::new("bc_instructions_produced_total", "Beacon instructions produced"),
        &["status"]  // status: accepted/refund/pass_through
    ).expect("metric creation failed");

    /// Shard instructions the producer skipped
    pub static ref INSTRUCTIONS_SKIPPED: CounterVec = CounterVec::new(
        Opts::new("bc_instructions_skipped_total", "Shard instructions skipped by the producer"),
        &["reason"]  // reason: reserved/unrecognized/malformed
    ).expect("metric creation failed");

    /// Beacon blocks run through the processor
    pub static ref BEACON_BLOCKS_PROCESSED: CounterVec = CounterVec::new(
        Opts::new("bc_instructions_blocks_processed_total", "Beacon blocks processed"),
        &["outcome"]  // outcome: committed/rejected
    ).expect("metric creation failed");

    // =========================================================================
    // VERIFIER METRICS
    // =========================================================================

    /// Verified batches by outcome
    pub static ref VERIFIER_BATCHES: CounterVec = CounterVec::new(
        Opts::new("bc_verifier_batches_total", "Transaction batches verified"),
        &["outcome"]  // outcome: accepted/invalid/double_spend/timeout
    ).expect("metric creation failed");

    /// Transactions checked after whitelist filtering
    pub static ref VERIFIER_TRANSACTIONS: Counter = Counter::new(
        "bc_verifier_transactions_total",
        "Transactions passed to the verifier stages"
    ).expect("metric creation failed");

    /// Batch verification duration
    pub static ref VERIFIER_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "bc_verifier_batch_duration_seconds",
            "Time spent verifying a transaction batch"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Handle proving metrics were registered.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors in the registry.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Calling it again is harmless: already-registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Committee
        Box::new(COMMITTEE_ROTATIONS.clone()),
        Box::new(VALIDATORS_DROPPED.clone()),
        Box::new(CANDIDATES_ASSIGNED.clone()),
        // Slashing
        Box::new(BLACKLIST_SIZE.clone()),
        Box::new(BLACKLIST_RELEASED.clone()),
        // Instructions
        Box::new(INSTRUCTIONS_PRODUCED.clone()),
        Box::new(INSTRUCTIONS_SKIPPED.clone()),
        Box::new(BEACON_BLOCKS_PROCESSED.clone()),
        // Verifier
        Box::new(VERIFIER_BATCHES.clone()),
        Box::new(VERIFIER_TRANSACTIONS.clone()),
        Box::new(VERIFIER_DURATION.clone()),
    ];
    let registered = metrics.len();

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}
