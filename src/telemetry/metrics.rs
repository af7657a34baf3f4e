//! Prometheus metrics
//!
//! Metric names live here; call sites pick a variant. Without an installed
//! recorder every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Duration;

/// Monotonic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// Trades accepted into the CVD windows
    TradesAccepted,
    /// Trades dropped as replays
    TradesDuplicate,
    /// Trades dropped as too old
    TradesLate,
    /// Trades dropped as malformed
    TradesInvalid,
    /// Depth updates applied
    DepthUpdates,
    /// Snapshots published
    SnapshotsPublished,
    /// Stream reconnect attempts
    StreamReconnects,
    /// Decisions that produced no signal
    DecisionsNoSignal,
    /// Signals vetoed by the risk gate
    DecisionsVetoed,
    /// Signals that passed the risk gate
    DecisionsAccepted,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeMetric {
    /// Short-window cumulative volume delta
    CvdShort,
    /// Long-window cumulative volume delta
    CvdLong,
    /// Age of the snapshot used by the last decision
    SnapshotAgeSecs,
}

/// Latency metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyMetric {
    /// Full vote + prior + gate evaluation
    Decision,
}

impl CounterMetric {
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::TradesAccepted => "oracle_trades_accepted_total",
            CounterMetric::TradesDuplicate => "oracle_trades_duplicate_total",
            CounterMetric::TradesLate => "oracle_trades_late_total",
            CounterMetric::TradesInvalid => "oracle_trades_invalid_total",
            CounterMetric::DepthUpdates => "oracle_depth_updates_total",
            CounterMetric::SnapshotsPublished => "oracle_snapshots_published_total",
            CounterMetric::StreamReconnects => "oracle_stream_reconnects_total",
            CounterMetric::DecisionsNoSignal => "decision_no_signal_total",
            CounterMetric::DecisionsVetoed => "decision_vetoed_total",
            CounterMetric::DecisionsAccepted => "decision_accepted_total",
        }
    }
}

impl GaugeMetric {
    pub fn name(self) -> &'static str {
        match self {
            GaugeMetric::CvdShort => "oracle_cvd_short",
            GaugeMetric::CvdLong => "oracle_cvd_long",
            GaugeMetric::SnapshotAgeSecs => "oracle_snapshot_age_seconds",
        }
    }
}

impl LatencyMetric {
    pub fn name(self) -> &'static str {
        match self {
            LatencyMetric::Decision => "decision_latency_ms",
        }
    }
}

/// Bump a counter by one
pub fn increment(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Record a latency measurement in milliseconds
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
}

/// Install the global recorder and serve `/metrics` on `port`
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;
    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        for metric in [
            CounterMetric::TradesAccepted,
            CounterMetric::TradesDuplicate,
            CounterMetric::TradesLate,
            CounterMetric::StreamReconnects,
        ] {
            assert!(metric.name().starts_with("oracle_"));
            assert!(metric.name().ends_with("_total"));
        }
        assert!(CounterMetric::DecisionsVetoed.name().starts_with("decision_"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        increment(CounterMetric::DepthUpdates);
        set_gauge(GaugeMetric::CvdLong, 1.0);
        record_latency(LatencyMetric::Decision, Duration::from_millis(3));
    }
}
