//! Signal types

use crate::indicators::TrendLabel;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of the bet on the binary contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Price finishes above the baseline (buy YES)
    Long,
    /// Price finishes below the baseline (buy NO)
    Short,
}

impl Direction {
    /// +1 for LONG, -1 for SHORT
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// Direction a signed magnitude points to; `None` at zero
    pub fn from_signed(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(Direction::Long)
        } else if value < 0.0 {
            Some(Direction::Short)
        } else {
            None
        }
    }

    /// Direction of a trend label; NEUTRAL has none
    pub fn from_trend(label: TrendLabel) -> Option<Self> {
        match label {
            TrendLabel::Long => Some(Direction::Long),
            TrendLabel::Short => Some(Direction::Short),
            TrendLabel::Neutral => None,
        }
    }

    /// `true` when `value` points the same way with at least `magnitude`
    pub fn confirmed_by(self, value: f64, magnitude: f64) -> bool {
        value * self.sign() >= magnitude
    }
}


impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// One rule's directional opinion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub rule_name: String,
    pub direction: Direction,
    /// In [0, 1]
    pub confidence: f64,
    /// Fixed per rule instance, > 0
    pub weight: f64,
    pub rationale: String,
}

impl Vote {
    pub fn new(
        rule_name: impl Into<String>,
        direction: Direction,
        confidence: f64,
        weight: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            direction,
            confidence: confidence.clamp(0.0, 1.0),
            weight,
            rationale: rationale.into(),
        }
    }
}

/// Outcome of combining a vote set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteResult {
    pub direction: Direction,
    /// Winning side's weighted confidence, after any prior adjustment
    pub confidence: f64,
    pub long_votes: usize,
    pub short_votes: usize,
    pub long_weighted_confidence: f64,
    pub short_weighted_confidence: f64,
    /// Set by the risk gate once the result survives every factor
    pub passed_gate: bool,
}

impl VoteResult {
    pub fn total_votes(&self) -> usize {
        self.long_votes + self.short_votes
    }
}

/// Final output of one decision tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal identifier
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub confidence: f64,
    /// Net weighted vote score plus the prior scaled by total vote weight;
    /// positive favours LONG
    pub score: f64,
    /// Position-size multiplier in [0, 1]; zero when vetoed
    pub multiplier: Decimal,
    pub vetoed: bool,
    pub rationale: Vec<String>,
    pub vote: VoteResult,
}

impl Signal {
    /// A signal an execution collaborator may act on
    pub fn is_actionable(&self) -> bool {
        !self.vetoed && self.multiplier > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::from_signed(-3.0), Some(Direction::Short));
        assert_eq!(Direction::from_signed(0.0), None);
        assert!(Direction::Short.confirmed_by(-150_000.0, 150_000.0));
        assert!(!Direction::Long.confirmed_by(-150_000.0, 150_000.0));
    }

    #[test]
    fn test_trend_label_conversion() {
        assert_eq!(Direction::from_trend(TrendLabel::Long), Some(Direction::Long));
        assert_eq!(Direction::from_trend(TrendLabel::Neutral), None);
    }

    #[test]
    fn test_vote_confidence_clamped() {
        let vote = Vote::new("x", Direction::Long, 1.7, 1.0, "");
        assert_eq!(vote.confidence, 1.0);
    }

    #[test]
    fn test_direction_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Direction::Short).unwrap(), "\"SHORT\"");
    }
}
