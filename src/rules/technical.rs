//! Rules over the contract price history

use super::{magnitude_vote, Observation, Rule};
use crate::config::{LookbackRuleParams, RsiRuleParams, RuleParams};
use crate::indicators::{pct_change, rsi};
use crate::signal::{Direction, Vote};

/// Percent change from `lookback` samples ago to the latest sample
fn lookback_change(prices: &[f64], lookback: usize) -> Option<f64> {
    if lookback < 2 || prices.len() < lookback {
        return None;
    }
    let recent = &prices[prices.len() - lookback..];
    pct_change(recent[0], recent[recent.len() - 1])
}

/// Momentum over the last `lookback` contract samples
pub struct PriceMomentumRule {
    params: LookbackRuleParams,
    max_confidence: f64,
}

impl PriceMomentumRule {
    pub fn new(params: LookbackRuleParams, max_confidence: f64) -> Self {
        Self {
            params,
            max_confidence,
        }
    }
}

impl Rule for PriceMomentumRule {
    fn name(&self) -> &'static str {
        "price_momentum"
    }

    fn weight(&self) -> f64 {
        self.params.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let change = lookback_change(observation.prices, self.params.lookback)?;
        let lookback = self.params.lookback;
        magnitude_vote(
            self.name(),
            self.weight(),
            change,
            &self.params.params,
            self.max_confidence,
            |v| format!("{:+.2}% over {} samples", v, lookback),
        )
    }
}

/// Short-horizon trend strength over the last few samples
pub struct TrendStrengthRule {
    params: LookbackRuleParams,
    max_confidence: f64,
}

impl TrendStrengthRule {
    pub fn new(params: LookbackRuleParams, max_confidence: f64) -> Self {
        Self {
            params,
            max_confidence,
        }
    }
}

impl Rule for TrendStrengthRule {
    fn name(&self) -> &'static str {
        "trend_strength"
    }

    fn weight(&self) -> f64 {
        self.params.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let change = lookback_change(observation.prices, self.params.lookback)?;
        magnitude_vote(
            self.name(),
            self.weight(),
            change,
            &self.params.params,
            self.max_confidence,
            |v| format!("short trend {:+.2}%", v),
        )
    }
}

/// Mean reversion on RSI extremes
pub struct RsiRule {
    params: RsiRuleParams,
    max_confidence: f64,
}

impl RsiRule {
    pub fn new(params: RsiRuleParams, max_confidence: f64) -> Self {
        Self {
            params,
            max_confidence,
        }
    }
}

impl Rule for RsiRule {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn weight(&self) -> f64 {
        self.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let value = rsi(observation.prices, self.params.period)?;
        let RsiRuleParams {
            overbought,
            oversold,
            ..
        } = self.params;

        let (direction, confidence, label) = if value > overbought {
            (
                Direction::Short,
                (value - overbought) / (100.0 - overbought),
                "overbought",
            )
        } else if value < oversold {
            (Direction::Long, (oversold - value) / oversold, "oversold")
        } else {
            return None;
        };

        Some(Vote::new(
            self.name(),
            direction,
            confidence.min(self.max_confidence),
            self.weight(),
            format!("RSI {:.1} {}", value, label),
        ))
    }
}

/// Mean reversion toward the session VWAP
pub struct VwapRule {
    params: RuleParams,
    max_confidence: f64,
}

impl VwapRule {
    pub fn new(params: RuleParams, max_confidence: f64) -> Self {
        Self {
            params,
            max_confidence,
        }
    }
}

impl Rule for VwapRule {
    fn name(&self) -> &'static str {
        "vwap"
    }

    fn weight(&self) -> f64 {
        self.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let vwap = observation.vwap.filter(|v| *v > 0.0)?;
        let price = observation.latest_price()?;
        let distance = pct_change(vwap, price)?;
        // Above VWAP leans SHORT, below leans LONG
        magnitude_vote(
            self.name(),
            self.weight(),
            -distance,
            &self.params,
            self.max_confidence,
            |_| format!("{:+.2}% from VWAP", distance),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use chrono::Utc;

    fn observation(prices: &[f64], vwap: Option<f64>) -> Observation<'_> {
        Observation {
            now: Utc::now(),
            prices,
            vwap,
            oracle: None,
        }
    }

    #[test]
    fn test_price_momentum_needs_full_lookback() {
        let rule = PriceMomentumRule::new(RulesConfig::default().price_momentum, 0.99);
        let short: Vec<f64> = (0..9).map(|i| 0.50 + i as f64 * 0.01).collect();
        assert!(rule.evaluate(&observation(&short, None)).is_none());

        let prices: Vec<f64> = (0..10).map(|i| 0.50 + i as f64 * 0.001).collect();
        // (0.509 - 0.50) / 0.50 = 1.8%
        let vote = rule.evaluate(&observation(&prices, None)).unwrap();
        assert_eq!(vote.direction, Direction::Long);
        assert!((vote.confidence - 1.8 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_momentum_flat_abstains() {
        let rule = PriceMomentumRule::new(RulesConfig::default().price_momentum, 0.99);
        let prices = vec![0.5; 12];
        assert!(rule.evaluate(&observation(&prices, None)).is_none());
    }

    #[test]
    fn test_trend_strength_last_three() {
        let rule = TrendStrengthRule::new(RulesConfig::default().trend_strength, 0.99);
        // Only the last three samples count: 0.60 -> 0.57 is -5%
        let prices = [0.40, 0.60, 0.58, 0.57];
        let vote = rule.evaluate(&observation(&prices, None)).unwrap();
        assert_eq!(vote.direction, Direction::Short);
        assert_eq!(vote.confidence, 0.99);
    }

    #[test]
    fn test_rsi_extremes() {
        let rule = RsiRule::new(RsiRuleParams::default(), 0.99);
        let rising: Vec<f64> = (0..20).map(|i| 0.30 + i as f64 * 0.01).collect();
        let vote = rule.evaluate(&observation(&rising, None)).unwrap();
        assert_eq!(vote.direction, Direction::Short);
        assert_eq!(vote.confidence, 0.99);

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let vote = rule.evaluate(&observation(&falling, None)).unwrap();
        assert_eq!(vote.direction, Direction::Long);

        let flat = vec![0.5; 20];
        assert!(rule.evaluate(&observation(&flat, None)).is_none());
    }

    #[test]
    fn test_rsi_insufficient_history() {
        let rule = RsiRule::new(RsiRuleParams::default(), 0.99);
        assert!(rule.evaluate(&observation(&[0.5, 0.6], None)).is_none());
    }

    #[test]
    fn test_vwap_deviation() {
        let rule = VwapRule::new(RulesConfig::default().vwap, 0.99);
        // 1% above VWAP
        let vote = rule.evaluate(&observation(&[0.505], Some(0.50))).unwrap();
        assert_eq!(vote.direction, Direction::Short);
        assert!((vote.confidence - 0.5).abs() < 1e-9);

        let vote = rule.evaluate(&observation(&[0.495], Some(0.50))).unwrap();
        assert_eq!(vote.direction, Direction::Long);

        assert!(rule.evaluate(&observation(&[0.501], Some(0.50))).is_none());
        assert!(rule.evaluate(&observation(&[0.6], None)).is_none());
        assert!(rule.evaluate(&observation(&[0.6], Some(0.0))).is_none());
    }
}
