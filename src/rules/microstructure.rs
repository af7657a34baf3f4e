//! Rules over the oracle snapshot

use super::{magnitude_vote, Observation, Rule};
use crate::config::RuleParams;
use crate::signal::Vote;

/// Below this the oracle momentum reads as unavailable
const MOMENTUM_FLOOR: f64 = 0.01;

/// Reference-instrument momentum over one of the published durations
pub struct OracleMomentumRule {
    secs: u32,
    params: RuleParams,
    max_confidence: f64,
}

impl OracleMomentumRule {
    pub fn new(secs: u32, params: RuleParams, max_confidence: f64) -> Self {
        Self {
            secs,
            params,
            max_confidence,
        }
    }
}

impl Rule for OracleMomentumRule {
    fn name(&self) -> &'static str {
        match self.secs {
            30 => "momentum_30s",
            60 => "momentum_60s",
            120 => "momentum_120s",
            _ => "momentum",
        }
    }

    fn weight(&self) -> f64 {
        self.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let momentum = observation.oracle?.momentum(self.secs)?;
        if momentum.abs() < MOMENTUM_FLOOR {
            return None;
        }
        let secs = self.secs;
        magnitude_vote(
            self.name(),
            self.weight(),
            momentum,
            &self.params,
            self.max_confidence,
            |v| format!("{}s momentum {:+.2}%", secs, v),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CvdWindow {
    Short,
    Long,
}

/// Net aggressive order flow over one CVD window
pub struct CvdRule {
    window: CvdWindow,
    params: RuleParams,
    max_confidence: f64,
}

impl CvdRule {
    pub fn long(params: RuleParams, max_confidence: f64) -> Self {
        Self {
            window: CvdWindow::Long,
            params,
            max_confidence,
        }
    }

    pub fn short(params: RuleParams, max_confidence: f64) -> Self {
        Self {
            window: CvdWindow::Short,
            params,
            max_confidence,
        }
    }
}

impl Rule for CvdRule {
    fn name(&self) -> &'static str {
        match self.window {
            CvdWindow::Short => "cvd_short",
            CvdWindow::Long => "cvd_long",
        }
    }

    fn weight(&self) -> f64 {
        self.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let snapshot = observation.oracle?;
        let cvd = match self.window {
            CvdWindow::Short => snapshot.cvd_short,
            CvdWindow::Long => snapshot.cvd_long,
        };
        let name = self.name();
        magnitude_vote(name, self.weight(), cvd, &self.params, self.max_confidence, |v| {
            format!("{} {:+.0}", name, v)
        })
    }
}

/// Unusual swings of the sampled CVD relative to its recent range
pub struct DeltaZScoreRule {
    params: RuleParams,
    max_confidence: f64,
}

impl DeltaZScoreRule {
    pub fn new(params: RuleParams, max_confidence: f64) -> Self {
        Self {
            params,
            max_confidence,
        }
    }
}

impl Rule for DeltaZScoreRule {
    fn name(&self) -> &'static str {
        "delta_zscore"
    }

    fn weight(&self) -> f64 {
        self.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let z = observation.oracle?.delta_zscore?;
        magnitude_vote(self.name(), self.weight(), z, &self.params, self.max_confidence, |v| {
            format!("delta z-score {:+.2}", v)
        })
    }
}

/// Resting size imbalance in the reference order book
pub struct WallImbalanceRule {
    params: RuleParams,
    max_confidence: f64,
}

impl WallImbalanceRule {
    pub fn new(params: RuleParams, max_confidence: f64) -> Self {
        Self {
            params,
            max_confidence,
        }
    }
}

impl Rule for WallImbalanceRule {
    fn name(&self) -> &'static str {
        "wall_imbalance"
    }

    fn weight(&self) -> f64 {
        self.params.weight
    }

    fn evaluate(&self, observation: &Observation<'_>) -> Option<Vote> {
        let imbalance = observation.oracle?.wall_imbalance?;
        magnitude_vote(
            self.name(),
            self.weight(),
            imbalance,
            &self.params,
            self.max_confidence,
            |v| format!("book imbalance {:+.2}", v),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::oracle::OracleSnapshot;
    use crate::signal::Direction;
    use chrono::Utc;

    fn observe(snapshot: &OracleSnapshot) -> Observation<'_> {
        Observation {
            now: Utc::now(),
            prices: &[],
            vwap: None,
            oracle: Some(snapshot),
        }
    }

    #[test]
    fn test_missing_snapshot_abstains() {
        let config = RulesConfig::default();
        let observation = Observation {
            now: Utc::now(),
            prices: &[],
            vwap: None,
            oracle: None,
        };
        assert!(CvdRule::long(config.cvd_long, 0.99).evaluate(&observation).is_none());
        assert!(OracleMomentumRule::new(60, config.momentum_60s, 0.99)
            .evaluate(&observation)
            .is_none());
    }

    #[test]
    fn test_cvd_long_threshold() {
        let rule = CvdRule::long(RulesConfig::default().cvd_long, 0.99);
        let mut snapshot = OracleSnapshot::empty(Utc::now());

        snapshot.cvd_long = 49_999.0;
        assert!(rule.evaluate(&observe(&snapshot)).is_none());

        snapshot.cvd_long = -120_000.0;
        let vote = rule.evaluate(&observe(&snapshot)).unwrap();
        assert_eq!(vote.direction, Direction::Short);
        assert!((vote.confidence - 0.8).abs() < 1e-12);
        assert_eq!(vote.weight, 3.0);
    }

    #[test]
    fn test_cvd_rules_outweigh_single_technical_rule() {
        let config = RulesConfig::default();
        assert!(config.cvd_long.weight > config.price_momentum.params.weight);
        assert!(config.cvd_short.weight > config.rsi.weight);
    }

    #[test]
    fn test_oracle_momentum_unavailable_abstains() {
        let rule = OracleMomentumRule::new(60, RulesConfig::default().momentum_60s, 0.99);
        let mut snapshot = OracleSnapshot::empty(Utc::now());
        snapshot.momentum_60s = 0.005;
        assert!(rule.evaluate(&observe(&snapshot)).is_none());

        snapshot.momentum_60s = 2.5;
        let vote = rule.evaluate(&observe(&snapshot)).unwrap();
        assert_eq!(vote.direction, Direction::Long);
        assert!((vote.confidence - 2.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zscore_and_imbalance_need_values() {
        let config = RulesConfig::default();
        let z = DeltaZScoreRule::new(config.delta_zscore, 0.99);
        let walls = WallImbalanceRule::new(config.wall_imbalance, 0.99);
        let mut snapshot = OracleSnapshot::empty(Utc::now());
        assert!(z.evaluate(&observe(&snapshot)).is_none());
        assert!(walls.evaluate(&observe(&snapshot)).is_none());

        snapshot.delta_zscore = Some(-3.0);
        snapshot.wall_imbalance = Some(0.5);
        assert_eq!(
            z.evaluate(&observe(&snapshot)).unwrap().direction,
            Direction::Short
        );
        assert_eq!(
            walls.evaluate(&observe(&snapshot)).unwrap().direction,
            Direction::Long
        );
    }
}
