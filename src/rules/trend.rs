//! Coarse-timeframe trend confirmation

use super::{Observation, Rule};
use crate::config::TrendRuleParams;
use crate::signal::{Direction, Vote};

/// Votes the 15-minute trend label at a fixed confidence
pub struct TrendConfirmationRule {
    params: TrendRuleParams,
}

impl TrendConfirmationRule {
    pub fn new(params: TrendRuleParams) -> Self {
        Self { params }
    }
}

impl Rule for TrendConfirmationRule {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn weight(&self) -> f64 {
        self.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let label = observation.oracle?.trend_label;
        let direction = Direction::from_trend(label)?;
        Some(Vote::new(
            self.name(),
            direction,
            self.params.confidence,
            self.weight(),
            format!("15m trend {}", direction),
        ))
    }
}
