//! Rule set
//!
//! Independent evaluators that each turn one piece of evidence into a vote
//! or an abstention. Rules never see each other's output.

mod microstructure;
mod technical;
mod trend;

pub use microstructure::{CvdRule, DeltaZScoreRule, OracleMomentumRule, WallImbalanceRule};
pub use technical::{PriceMomentumRule, RsiRule, TrendStrengthRule, VwapRule};
pub use trend::TrendConfirmationRule;

use crate::config::{RuleParams, RulesConfig};
use crate::oracle::OracleSnapshot;
use crate::signal::{Direction, Vote};
use chrono::{DateTime, Utc};

/// Everything a rule may look at during one decision tick
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub now: DateTime<Utc>,
    /// Contract price history, oldest first
    pub prices: &'a [f64],
    /// Session VWAP of the contract price
    pub vwap: Option<f64>,
    /// Latest snapshot, already checked for freshness
    pub oracle: Option<&'a OracleSnapshot>,
}

impl<'a> Observation<'a> {
    pub fn latest_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }
}

/// A single evaluator with a fixed weight
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn weight(&self) -> f64;

    /// Vote, or `None` to abstain on missing, stale or weak evidence
    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote>;
}

/// Vote on a signed magnitude with the rule's fixed `weight`.
///
/// Abstains when the value is not finite or below the activation threshold;
/// confidence is `|value| / full_scale` capped at `max_confidence`.
pub(crate) fn magnitude_vote(
    name: &'static str,
    weight: f64,
    value: f64,
    params: &RuleParams,
    max_confidence: f64,
    rationale: impl FnOnce(f64) -> String,
) -> Option<Vote> {
    if !value.is_finite() || value.abs() < params.threshold {
        return None;
    }
    let direction = Direction::from_signed(value)?;
    let confidence = (value.abs() / params.full_scale).min(max_confidence);
    Some(Vote::new(
        name,
        direction,
        confidence,
        weight,
        rationale(value),
    ))
}

/// Registry of configured rules
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Build every enabled rule from configuration
    pub fn from_config(config: &RulesConfig) -> Self {
        let max = config.max_confidence;
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();

        for (secs, params) in [
            (30, config.momentum_30s),
            (60, config.momentum_60s),
            (120, config.momentum_120s),
        ] {
            if params.enabled {
                rules.push(Box::new(OracleMomentumRule::new(secs, params, max)));
            }
        }
        if config.price_momentum.params.enabled {
            rules.push(Box::new(PriceMomentumRule::new(config.price_momentum, max)));
        }
        if config.trend_strength.params.enabled {
            rules.push(Box::new(TrendStrengthRule::new(config.trend_strength, max)));
        }
        if config.rsi.enabled {
            rules.push(Box::new(RsiRule::new(config.rsi, max)));
        }
        if config.vwap.enabled {
            rules.push(Box::new(VwapRule::new(config.vwap, max)));
        }
        if config.cvd_long.enabled {
            rules.push(Box::new(CvdRule::long(config.cvd_long, max)));
        }
        if config.cvd_short.enabled {
            rules.push(Box::new(CvdRule::short(config.cvd_short, max)));
        }
        if config.delta_zscore.enabled {
            rules.push(Box::new(DeltaZScoreRule::new(config.delta_zscore, max)));
        }
        if config.wall_imbalance.enabled {
            rules.push(Box::new(WallImbalanceRule::new(config.wall_imbalance, max)));
        }
        if config.trend.enabled {
            rules.push(Box::new(TrendConfirmationRule::new(config.trend)));
        }

        Self { rules }
    }

    /// Evaluate every rule against the same observation
    pub fn evaluate_all(&self, observation: &Observation<'_>) -> Vec<Vote> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let vote = rule.evaluate(observation);
                tracing::trace!(rule = rule.name(), ?vote, "Rule evaluated");
                vote
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
