//! Order book wall tracking

use crate::feed::{DepthLevel, DepthSnapshot};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Wall metrics derived from the latest depth update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WallReading {
    pub buy_wall: f64,
    pub sell_wall: f64,
    pub imbalance: Option<f64>,
}

/// Tracks the largest resting level per side and a smoothed total-size imbalance
#[derive(Debug)]
pub struct DepthTracker {
    smoothing: usize,
    bid_totals: VecDeque<f64>,
    ask_totals: VecDeque<f64>,
    buy_wall: f64,
    sell_wall: f64,
    updated_at: Option<DateTime<Utc>>,
}

fn largest(levels: &[DepthLevel]) -> f64 {
    levels
        .iter()
        .map(|l| l.size)
        .filter(|s| s.is_finite())
        .fold(0.0, f64::max)
}

fn total(levels: &[DepthLevel]) -> f64 {
    levels
        .iter()
        .map(|l| l.size)
        .filter(|s| s.is_finite() && *s > 0.0)
        .sum()
}

fn push_bounded(buf: &mut VecDeque<f64>, cap: usize, value: f64) {
    if buf.len() == cap {
        buf.pop_front();
    }
    buf.push_back(value);
}

impl DepthTracker {
    pub fn new(smoothing: usize) -> Self {
        let smoothing = smoothing.max(1);
        Self {
            smoothing,
            bid_totals: VecDeque::with_capacity(smoothing),
            ask_totals: VecDeque::with_capacity(smoothing),
            buy_wall: 0.0,
            sell_wall: 0.0,
            updated_at: None,
        }
    }

    /// Replace the book view with a new snapshot
    pub fn ingest(&mut self, snapshot: &DepthSnapshot) {
        self.buy_wall = largest(&snapshot.bids);
        self.sell_wall = largest(&snapshot.asks);
        push_bounded(&mut self.bid_totals, self.smoothing, total(&snapshot.bids));
        push_bounded(&mut self.ask_totals, self.smoothing, total(&snapshot.asks));
        self.updated_at = Some(snapshot.timestamp);
    }

    /// Walls at `now`; a book not updated within `max_age` reads as empty
    pub fn reading(&self, now: DateTime<Utc>, max_age: Duration) -> WallReading {
        match self.updated_at {
            Some(ts) if now - ts <= max_age => WallReading {
                buy_wall: self.buy_wall,
                sell_wall: self.sell_wall,
                imbalance: self.imbalance(),
            },
            _ => WallReading::default(),
        }
    }

    fn imbalance(&self) -> Option<f64> {
        if self.bid_totals.is_empty() {
            return None;
        }
        let n = self.bid_totals.len() as f64;
        let bid = self.bid_totals.iter().sum::<f64>() / n;
        let ask = self.ask_totals.iter().sum::<f64>() / n;
        let sum = bid + ask;
        (sum > 0.0).then(|| (bid - ask) / sum)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}
