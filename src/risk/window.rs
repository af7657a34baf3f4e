//! Per-window state owned by the caller

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum BaselineSide {
    Above,
    Below,
}

/// One contract window: its deadline and how often the price has crossed
/// the baseline so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowState {
    window_start: DateTime<Utc>,
    deadline: DateTime<Utc>,
    baseline: Decimal,
    crossings: u32,
    side: Option<BaselineSide>,
    last_price: Option<Decimal>,
}

impl WindowState {
    pub fn new(window_start: DateTime<Utc>, deadline: DateTime<Utc>, baseline: Decimal) -> Self {
        Self {
            window_start,
            deadline,
            baseline,
            crossings: 0,
            side: None,
            last_price: None,
        }
    }

    /// Record a price and count a crossing when it lands on the other side
    /// of the baseline. Returns `true` on a crossing.
    ///
    /// A price exactly at the baseline keeps the previous side.
    pub fn observe_price(&mut self, price: Decimal) -> bool {
        self.last_price = Some(price);
        let side = match price.cmp(&self.baseline) {
            std::cmp::Ordering::Greater => BaselineSide::Above,
            std::cmp::Ordering::Less => BaselineSide::Below,
            std::cmp::Ordering::Equal => return false,
        };
        let crossed = matches!(self.side, Some(prev) if prev != side);
        if crossed {
            self.crossings += 1;
            tracing::debug!(crossings = self.crossings, %price, "Baseline crossed");
        }
        self.side = Some(side);
        crossed
    }

    /// Start the next window: the old deadline becomes the new start and
    /// all per-window counters reset
    pub fn roll_over(&mut self, next_deadline: DateTime<Utc>) {
        self.window_start = self.deadline;
        self.deadline = next_deadline;
        self.crossings = 0;
        self.side = None;
        self.last_price = None;
    }

    /// Time left at `now`; negative once the deadline has passed
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.deadline - now
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn window_length(&self) -> Duration {
        self.deadline - self.window_start
    }

    pub fn baseline(&self) -> Decimal {
        self.baseline
    }

    pub fn crossings(&self) -> u32 {
        self.crossings
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }
}
