//! Prometheus metrics for the ordering service.
//!
//! All metrics follow the naming convention: `qc_orderer_<metric>_<unit>`
//! and are labelled by `channel`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SEQUENCING
    // =========================================================================

    /// Envelopes that passed re-validation in a sequencing loop
    pub static ref ENVELOPES_ORDERED: CounterVec = CounterVec::new(
        Opts::new("qc_orderer_envelopes_ordered_total", "Envelopes accepted for ordering"),
        &["channel"]
    ).expect("metric creation failed");

    /// Envelopes dropped during re-validation or processing
    pub static ref ENVELOPES_DISCARDED: CounterVec = CounterVec::new(
        Opts::new("qc_orderer_envelopes_discarded_total", "Envelopes discarded instead of ordered"),
        &["channel", "reason"]  // reason: malformed/validation/not_found/creation
    ).expect("metric creation failed");

    /// Batch timer expiries
    pub static ref BATCH_TIMEOUTS: CounterVec = CounterVec::new(
        Opts::new("qc_orderer_batch_timeouts_total", "Batch timer expiries"),
        &["channel"]
    ).expect("metric creation failed");

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// Normal blocks written
    pub static ref BLOCKS_WRITTEN: CounterVec = CounterVec::new(
        Opts::new("qc_orderer_blocks_written_total", "Normal blocks written"),
        &["channel"]
    ).expect("metric creation failed");

    /// Config blocks written
    pub static ref CONFIG_BLOCKS_WRITTEN: CounterVec = CounterVec::new(
        Opts::new("qc_orderer_config_blocks_written_total", "Config blocks written"),
        &["channel"]
    ).expect("metric creation failed");

    /// Envelopes per written block
    pub static ref BLOCK_ENVELOPES: HistogramVec = HistogramVec::new(
        HistogramOpts::new("qc_orderer_block_envelopes", "Envelopes per written block")
            .buckets(exponential_buckets(1.0, 2.0, 12).unwrap_or_default()),
        &["channel"]
    ).expect("metric creation failed");

    // =========================================================================
    // CHANNELS
    // =========================================================================

    /// Channels created through the system channel
    pub static ref CHANNELS_CREATED: CounterVec = CounterVec::new(
        Opts::new("qc_orderer_channels_created_total", "Channels created"),
        &["system_channel"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ENVELOPES_ORDERED.clone()),
        Box::new(ENVELOPES_DISCARDED.clone()),
        Box::new(BATCH_TIMEOUTS.clone()),
        Box::new(BLOCKS_WRITTEN.clone()),
        Box::new(CONFIG_BLOCKS_WRITTEN.clone()),
        Box::new(BLOCK_ENVELOPES.clone()),
        Box::new(CHANNELS_CREATED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
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
