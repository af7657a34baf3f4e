//! Oracle snapshot types

use crate::indicators::TrendLabel;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Immutable bundle of rolling statistics, published at a fixed cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleSnapshot {
    /// Publish time; non-decreasing across snapshots
    pub timestamp: DateTime<Utc>,
    /// Publish counter, starts at 1
    pub sequence: u64,
    /// Signed volume over the short window
    pub cvd_short: f64,
    /// Signed volume over the long window
    pub cvd_long: f64,
    /// Percent price change over 30/60/120 seconds; 0 without enough history
    pub momentum_30s: f64,
    pub momentum_60s: f64,
    pub momentum_120s: f64,
    /// Largest resting bid level size in the latest depth update
    pub buy_wall: f64,
    /// Largest resting ask level size in the latest depth update
    pub sell_wall: f64,
    /// Smoothed `(bid - ask) / (bid + ask)` of total displayed size
    pub wall_imbalance: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub delta_zscore: Option<f64>,
    /// UT Bot + Hull label on 15-minute candles
    pub trend_label: TrendLabel,
    /// EMA label on 1-hour candles
    pub trend_1h: TrendLabel,
    pub last_price: Option<f64>,
    /// Accepted trades since start
    pub trade_count: u64,
    /// Composite flow score in [-10, 10], informational
    pub signal_score: f64,
}

impl OracleSnapshot {
    /// Zeroed snapshot at `timestamp`
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            sequence: 0,
            cvd_short: 0.0,
            cvd_long: 0.0,
            momentum_30s: 0.0,
            momentum_60s: 0.0,
            momentum_120s: 0.0,
            buy_wall: 0.0,
            sell_wall: 0.0,
            wall_imbalance: None,
            macd_histogram: None,
            delta_zscore: None,
            trend_label: TrendLabel::Neutral,
            trend_1h: TrendLabel::Neutral,
            last_price: None,
            trade_count: 0,
            signal_score: 0.0,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    /// A snapshot older than `max_age` must be treated as absent
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) <= max_age
    }

    /// Momentum for one of the published durations
    pub fn momentum(&self, secs: u32) -> Option<f64> {
        match secs {
            30 => Some(self.momentum_30s),
            60 => Some(self.momentum_60s),
            120 => Some(self.momentum_120s),
            _ => None,
        }
    }
}

/// Keep `snapshot` only if it is fresh at `now`
pub fn fresh_snapshot(
    snapshot: Option<Arc<OracleSnapshot>>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Option<Arc<OracleSnapshot>> {
    snapshot.filter(|s| s.is_fresh(now, max_age))
}

/// Outcome of offering one trade to the accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Accepted,
    /// Sequence id already seen
    Duplicate,
    /// Older than the newest accepted trade by more than the tolerance
    TooLate,
    /// Non-finite or negative size/price
    Invalid,
}

/// Snapshot file errors
#[derive(Debug, Error)]
pub enum SnapshotFileError {
    #[error("snapshot file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
