//! Bounded price ring and duration momentum

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Percentage change from `from` to `to`; `None` when `from` is zero.
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 || !from.is_finite() || !to.is_finite() {
        return None;
    }
    Some((to - from) / from * 100.0)
}

/// Fixed-capacity ring of `(timestamp, price)` samples, oldest evicted first.
#[derive(Debug, Clone)]
pub struct PriceRing {
    capacity: usize,
    samples: VecDeque<(DateTime<Utc>, f64)>,
}

impl PriceRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample. Samples older than the newest one are rejected.
    pub fn push(&mut self, timestamp: DateTime<Utc>, price: f64) -> bool {
        if let Some((last_ts, _)) = self.samples.back() {
            if timestamp < *last_ts {
                return false;
            }
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((timestamp, price));
        true
    }

    pub fn latest(&self) -> Option<(DateTime<Utc>, f64)> {
        self.samples.back().copied()
    }

    /// Newest sample taken at or before `at`, scanning back from the newest
    pub fn price_at_or_before(&self, at: DateTime<Utc>) -> Option<f64> {
        self.samples
            .iter()
            .rev()
            .find(|(ts, _)| *ts <= at)
            .map(|(_, price)| *price)
    }

    /// Percent move of the latest price over `window`, measured at `now`.
    ///
    /// Zero when no sample is at least `window` old.
    pub fn momentum(&self, now: DateTime<Utc>, window: Duration) -> f64 {
        let Some((_, latest)) = self.latest() else {
            return 0.0;
        };
        self.price_at_or_before(now - window)
            .and_then(|base| pct_change(base, latest))
            .unwrap_or(0.0)
    }

    /// Prices oldest first
    pub fn prices(&self) -> Vec<f64> {
        self.samples.iter().map(|(_, p)| *p).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
