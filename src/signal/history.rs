//! Contract price history fed by the caller

use crate::indicators::{rsi, SessionVwap};
use chrono::{DateTime, Utc};

/// Bounded, time-ordered contract price series with a running session VWAP
#[derive(Debug, Clone)]
pub struct PriceHistory {
    capacity: usize,
    prices: Vec<f64>,
    last_timestamp: Option<DateTime<Utc>>,
    vwap: SessionVwap,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            prices: Vec::with_capacity(capacity),
            last_timestamp: None,
            vwap: SessionVwap::new(),
        }
    }

    /// Append one observation; older or non-finite samples are rejected.
    ///
    /// Samples without a traded volume count with unit weight in the VWAP.
    pub fn push(&mut self, timestamp: DateTime<Utc>, price: f64, volume: Option<f64>) -> bool {
        if !price.is_finite() || price < 0.0 {
            return false;
        }
        if matches!(self.last_timestamp, Some(last) if timestamp < last) {
            return false;
        }
        if self.prices.len() == self.capacity {
            self.prices.remove(0);
        }
        self.prices.push(price);
        self.last_timestamp = Some(timestamp);
        self.vwap.update(timestamp, price, volume.unwrap_or(1.0));
        true
    }

    /// Oldest first
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    pub fn rsi(&self, period: usize) -> Option<f64> {
        rsi(&self.prices, period)
    }

    pub fn vwap(&self) -> Option<f64> {
        self.vwap.value()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn clear(&mut self) {
        self.prices.clear();
        self.last_timestamp = None;
        self.vwap = SessionVwap::new();
    }
}
