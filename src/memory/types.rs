//! Session memory types

use crate::signal::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discretized description of a session at decision time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionFeature {
    /// Contract price in fifths: 0 = [0, 0.2) .. 4 = [0.8, 1]
    pub price_bucket: u8,
    /// Thirds of the contract window elapsed: 0 = early .. 2 = late
    pub time_bucket: u8,
    /// RSI in fifths: 0 = [0, 20) .. 4 = [80, 100]
    pub rsi_bucket: u8,
    /// Long-window CVD scaled to [-2, 2]
    pub cvd_bucket: i8,
    /// Recent contract price trend: -1, 0, 1
    pub trend_bucket: i8,
}

impl SessionFeature {
    /// L1 distance between bucket tuples
    pub fn distance(&self, other: &SessionFeature) -> u32 {
        let unsigned = |a: u8, b: u8| u32::from(a.abs_diff(b));
        let signed = |a: i8, b: i8| u32::from(a.abs_diff(b));
        unsigned(self.price_bucket, other.price_bucket)
            + unsigned(self.time_bucket, other.time_bucket)
            + unsigned(self.rsi_bucket, other.rsi_bucket)
            + signed(self.cvd_bucket, other.cvd_bucket)
            + signed(self.trend_bucket, other.trend_bucket)
    }
}

/// One finished session as recorded by the outcome collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub recorded_at: DateTime<Utc>,
    /// Side that was bet
    pub direction: Direction,
    pub features: SessionFeature,
    /// Whether the bet settled in the money
    pub won: bool,
}

impl SessionRecord {
    /// +1 when the outcome favoured LONG, -1 when it favoured SHORT
    pub fn long_outcome(&self) -> i32 {
        match (self.direction, self.won) {
            (Direction::Long, true) | (Direction::Short, false) => 1,
            (Direction::Long, false) | (Direction::Short, true) => -1,
        }
    }
}

/// Directional prior from similar past sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PriorBias {
    /// Not enough similar sessions; contributes nothing
    Neutral,
    /// `(wins - losses) / total` from the LONG side, in [-1, 1]
    Bias { value: f64, samples: usize },
}

impl PriorBias {
    pub fn value(&self) -> f64 {
        match self {
            PriorBias::Neutral => 0.0,
            PriorBias::Bias { value, .. } => *value,
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, PriorBias::Neutral)
    }
}

/// Session store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("invalid session store schema: {0}")]
    Schema(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(price: u8, cvd: i8) -> SessionFeature {
        SessionFeature {
            price_bucket: price,
            time_bucket: 1,
            rsi_bucket: 2,
            cvd_bucket: cvd,
            trend_bucket: 0,
        }
    }

    #[test]
    fn test_distance_is_l1() {
        assert_eq!(feature(2, 0).distance(&feature(2, 0)), 0);
        assert_eq!(feature(2, -2).distance(&feature(3, 2)), 5);
    }

    #[test]
    fn test_long_outcome() {
        let mut record = SessionRecord {
            recorded_at: Utc::now(),
            direction: Direction::Long,
            features: feature(2, 0),
            won: true,
        };
        assert_eq!(record.long_outcome(), 1);
        record.direction = Direction::Short;
        assert_eq!(record.long_outcome(), -1);
        record.won = false;
        assert_eq!(record.long_outcome(), 1);
    }

    #[test]
    fn test_neutral_value() {
        assert_eq!(PriorBias::Neutral.value(), 0.0);
        assert!(!PriorBias::Bias { value: 0.2, samples: 30 }.is_neutral());
    }
}
