//! Sliding-window signed volume (CVD) accumulators

use super::types::TickOutcome;
use crate::config::{DeltaUnit, OracleConfig};
use crate::feed::TradeTick;
use crate::indicators::{Macd, RollingZScore};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashSet, VecDeque};

/// Time-ordered deque of `(timestamp, signed volume)` with a running sum.
///
/// The sum is kept with Neumaier compensation so that long add/evict
/// sequences do not drift from a fresh re-summation of the deque.
#[derive(Debug, Clone)]
pub struct VolumeDeltaWindow {
    window: Duration,
    entries: VecDeque<(DateTime<Utc>, f64)>,
    sum: f64,
    compensation: f64,
}

impl VolumeDeltaWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: VecDeque::new(),
            sum: 0.0,
            compensation: 0.0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Insert a contribution, keeping the deque ordered by timestamp
    pub fn add(&mut self, timestamp: DateTime<Utc>, delta: f64) {
        match self.entries.back() {
            Some((last, _)) if timestamp < *last => {
                let idx = self.entries.partition_point(|(ts, _)| *ts <= timestamp);
                self.entries.insert(idx, (timestamp, delta));
            }
            _ => self.entries.push_back((timestamp, delta)),
        }
        self.accumulate(delta);
    }

    /// Drop contributions older than the window, measured back from `now`
    pub fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while let Some((ts, delta)) = self.entries.front().copied() {
            if ts < cutoff {
                self.entries.pop_front();
                self.accumulate(-delta);
            } else {
                break;
            }
        }
        if self.entries.is_empty() {
            self.sum = 0.0;
            self.compensation = 0.0;
        }
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn accumulate(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }
}

/// Derived oscillators over the sampled long-window CVD series
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedStats {
    pub macd_histogram: Option<f64>,
    pub delta_zscore: Option<f64>,
}

/// Trade-side state: both CVD windows, de-duplication and the CVD history
#[derive(Debug)]
pub struct FlowAccumulator {
    short: VolumeDeltaWindow,
    long: VolumeDeltaWindow,
    unit: DeltaUnit,
    late_tolerance: Duration,
    /// Accepted ids whose timestamps are still inside the late tolerance
    seen_ids: HashSet<u64>,
    /// Accepted `(timestamp, id)` in arrival order, pruned with `seen_ids`
    seen_order: VecDeque<(DateTime<Utc>, u64)>,
    newest: Option<DateTime<Utc>>,
    accepted: u64,
    last_price: Option<f64>,
    history_every: u64,
    history_len: usize,
    history: VecDeque<f64>,
    macd_periods: (usize, usize, usize),
    zscore_window: usize,
    derived: DerivedStats,
}

impl FlowAccumulator {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            short: VolumeDeltaWindow::new(Duration::seconds(config.cvd_short_secs as i64)),
            long: VolumeDeltaWindow::new(Duration::seconds(config.cvd_long_secs as i64)),
            unit: config.delta_unit,
            late_tolerance: Duration::milliseconds(config.late_tolerance_ms),
            seen_ids: HashSet::new(),
            seen_order: VecDeque::new(),
            newest: None,
            accepted: 0,
            last_price: None,
            history_every: config.cvd_history_every.max(1),
            history_len: config.cvd_history_len.max(1),
            history: VecDeque::new(),
            macd_periods: (config.macd_fast, config.macd_slow, config.macd_signal),
            zscore_window: config.zscore_window,
            derived: DerivedStats::default(),
        }
    }

    /// Signed contribution of one trade in the configured unit
    pub fn signed_volume(&self, tick: &TradeTick) -> f64 {
        let base = tick.size * tick.side.sign();
        match self.unit {
            DeltaUnit::Base => base,
            DeltaUnit::Quote => base * tick.price,
        }
    }

    /// Offer a trade to both windows.
    ///
    /// Ids already accepted are dropped as duplicates; ticks older than the
    /// newest accepted tick by more than the tolerance are dropped as too
    /// late. An unseen id inside the tolerance is accepted in timestamp
    /// order even when it arrives after higher ids.
    pub fn ingest(&mut self, tick: &TradeTick) -> TickOutcome {
        if !tick.price.is_finite() || !tick.size.is_finite() || tick.size < 0.0 {
            return TickOutcome::Invalid;
        }
        if self.seen_ids.contains(&tick.trade_id) {
            return TickOutcome::Duplicate;
        }
        if let Some(newest) = self.newest {
            if tick.timestamp < newest - self.late_tolerance {
                return TickOutcome::TooLate;
            }
        }

        let delta = self.signed_volume(tick);
        self.short.add(tick.timestamp, delta);
        self.long.add(tick.timestamp, delta);

        let newest = self.newest.map_or(tick.timestamp, |n| n.max(tick.timestamp));
        self.newest = Some(newest);
        self.remember(tick.trade_id, tick.timestamp, newest);
        self.last_price = Some(tick.price);
        self.accepted += 1;

        self.evict(newest);

        if self.accepted % self.history_every == 0 {
            if self.history.len() == self.history_len {
                self.history.pop_front();
            }
            self.history.push_back(self.long.value());
        }

        TickOutcome::Accepted
    }

    /// Record an accepted id and forget ids that can only come back too late
    fn remember(&mut self, id: u64, timestamp: DateTime<Utc>, newest: DateTime<Utc>) {
        self.seen_ids.insert(id);
        self.seen_order.push_back((timestamp, id));
        let cutoff = newest - self.late_tolerance;
        while let Some(&(ts, old)) = self.seen_order.front() {
            if ts >= cutoff {
                break;
            }
            self.seen_order.pop_front();
            self.seen_ids.remove(&old);
        }
    }

    pub fn evict(&mut self, now: DateTime<Utc>) {
        self.short.evict(now);
        self.long.evict(now);
    }

    /// Recompute MACD histogram and Z-score over the CVD history
    pub fn compute_derived(&mut self) -> DerivedStats {
        let (fast, slow, signal) = self.macd_periods;
        let mut macd = Macd::new(fast, slow, signal);
        let mut zscore = RollingZScore::new(self.zscore_window);
        let mut derived = DerivedStats::default();
        for &value in &self.history {
            derived.macd_histogram = macd.update(value).map(|m| m.histogram);
            derived.delta_zscore = zscore.update(value);
        }
        self.derived = derived;
        derived
    }

    pub fn derived(&self) -> DerivedStats {
        self.derived
    }

    pub fn cvd_short(&self) -> f64 {
        self.short.value()
    }

    pub fn cvd_long(&self) -> f64 {
        self.long.value()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn trade_count(&self) -> u64 {
        self.accepted
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
