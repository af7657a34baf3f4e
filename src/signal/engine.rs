//! Decision engine
//!
//! One call per decision tick: rules vote over a single snapshot, the
//! session prior nudges the confidence, and the risk gate sizes the result.

use super::history::PriceHistory;
use super::types::{Signal, Vote};
use super::voting::VotingAggregator;
use crate::config::Config;
use crate::memory::{extract_features, FeatureInput, PriorBias, SessionMemory, SessionStore};
use crate::oracle::OracleSnapshot;
use crate::risk::{RiskGate, WindowState};
use crate::rules::{Observation, RuleSet};
use crate::telemetry::{
    increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Net weighted vote score; positive favours LONG
pub fn vote_score(votes: &[Vote]) -> f64 {
    votes
        .iter()
        .map(|v| v.direction.sign() * v.confidence * v.weight)
        .sum()
}

/// Vote score with the prior folded in.
///
/// `adjustment` is in confidence units, so it is scaled by the total vote
/// weight, as if every vote had moved by that much confidence.
pub fn fused_score(votes: &[Vote], adjustment: f64) -> f64 {
    let total_weight: f64 = votes.iter().map(|v| v.weight).sum();
    vote_score(votes) + adjustment * total_weight
}

/// Rules, voting, prior and risk gate wired together
pub struct DecisionEngine {
    rules: RuleSet,
    voting: VotingAggregator,
    gate: RiskGate,
    memory: Option<SessionMemory>,
    history: PriceHistory,
    rsi_period: usize,
    freshness: Duration,
}

impl DecisionEngine {
    pub fn new(
        rules: RuleSet,
        voting: VotingAggregator,
        gate: RiskGate,
        history_capacity: usize,
        freshness: Duration,
    ) -> Self {
        Self {
            rules,
            voting,
            gate,
            memory: None,
            history: PriceHistory::new(history_capacity),
            rsi_period: crate::config::RsiRuleParams::default().period,
            freshness,
        }
    }

    /// Build from configuration; `store` enables the session prior
    pub fn from_config(config: &Config, store: Option<Arc<dyn SessionStore>>) -> Self {
        let mut engine = Self::new(
            RuleSet::from_config(&config.rules),
            VotingAggregator::from_config(&config.voting),
            RiskGate::new(config.risk.clone()),
            config.voting.history_capacity,
            Duration::seconds(config.oracle.freshness_secs),
        );
        engine.rsi_period = config.rules.rsi.period;
        if let Some(store) = store.filter(|_| config.memory.enabled) {
            engine.memory = Some(SessionMemory::new(store, config.memory.clone()));
        }
        engine
    }

    pub fn with_memory(mut self, memory: SessionMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Feed one contract price sample between decision ticks
    pub fn observe_price(
        &mut self,
        timestamp: DateTime<Utc>,
        price: Decimal,
        volume: Option<f64>,
    ) -> bool {
        match price.to_f64() {
            Some(price) => self.history.push(timestamp, price, volume),
            None => false,
        }
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    /// Run one decision tick.
    ///
    /// The tick's price is recorded in both the history and `window`. A
    /// snapshot older than the freshness threshold is treated as absent.
    /// Returns `None` when the votes do not clear the evidence gate; a vetoed
    /// signal is returned with a zero multiplier.
    pub fn decide(
        &mut self,
        now: DateTime<Utc>,
        contract_price: Decimal,
        window: &mut WindowState,
        snapshot: Option<Arc<OracleSnapshot>>,
    ) -> Option<Signal> {
        let started = Instant::now();
        let price = contract_price.to_f64()?;

        if let Some(s) = &snapshot {
            set_gauge(GaugeMetric::SnapshotAgeSecs, s.age(now).num_milliseconds() as f64 / 1000.0);
        }
        let snapshot = snapshot.filter(|s| s.is_fresh(now, self.freshness));
        let snapshot = snapshot.as_deref();

        self.history.push(now, price, None);
        window.observe_price(contract_price);

        let observation = Observation {
            now,
            prices: self.history.prices(),
            vwap: self.history.vwap(),
            oracle: snapshot,
        };
        let votes = self.rules.evaluate_all(&observation);

        let (prior, adjustment) = match &self.memory {
            Some(memory) => {
                let features = extract_features(&FeatureInput {
                    price,
                    rsi: self.history.rsi(self.rsi_period),
                    cvd_long: snapshot.map(|s| s.cvd_long),
                    prices: self.history.prices(),
                    remaining: window.remaining(now),
                    window: window.window_length(),
                });
                let prior = memory.prior_bias(&features);
                (prior, memory.adjustment(&prior))
            }
            None => (PriorBias::Neutral, 0.0),
        };

        let Some(mut vote) = self.voting.decide_with_adjustment(&votes, adjustment) else {
            increment(CounterMetric::DecisionsNoSignal);
            record_latency(LatencyMetric::Decision, started.elapsed());
            tracing::debug!(votes = votes.len(), "No actionable signal");
            return None;
        };

        let defense = self
            .gate
            .evaluate(&vote, snapshot, window, contract_price, now);
        vote.passed_gate = !defense.vetoed;

        let mut rationale: Vec<String> = votes
            .iter()
            .map(|v| format!("{} {}: {}", v.rule_name, v.direction, v.rationale))
            .collect();
        if let PriorBias::Bias { value, samples } = prior {
            rationale.push(format!("prior {:+.3} over {} sessions", value, samples));
        }
        rationale.extend(defense.reasons.iter().map(|r| r.to_string()));

        let signal = Signal {
            id: Uuid::new_v4(),
            timestamp: now,
            direction: vote.direction,
            confidence: vote.confidence,
            score: fused_score(&votes, adjustment),
            multiplier: defense.multiplier,
            vetoed: defense.vetoed,
            rationale,
            vote,
        };

        if signal.vetoed {
            increment(CounterMetric::DecisionsVetoed);
        } else {
            increment(CounterMetric::DecisionsAccepted);
        }
        record_latency(LatencyMetric::Decision, started.elapsed());
        tracing::info!(
            direction = %signal.direction,
            confidence = signal.confidence,
            score = signal.score,
            multiplier = %signal.multiplier,
            vetoed = signal.vetoed,
            "Decision"
        );

        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::TrendLabel;
    use crate::memory::{InMemorySessionStore, SessionRecord};
    use crate::signal::Direction;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::from_config(&Config::default(), None)
    }

    fn bullish_snapshot(at: DateTime<Utc>) -> Arc<OracleSnapshot> {
        let mut s = OracleSnapshot::empty(at);
        s.cvd_short = 45_000.0;
        s.cvd_long = 120_000.0;
        s.momentum_60s = 2.5;
        s.trend_label = TrendLabel::Long;
        Arc::new(s)
    }

    #[test]
    fn test_vote_score() {
        let votes = vec![
            Vote::new("a", Direction::Long, 0.5, 2.0, ""),
            Vote::new("b", Direction::Short, 0.5, 1.0, ""),
        ];
        assert!((vote_score(&votes) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fused_score_scales_adjustment_by_weight() {
        let votes = vec![
            Vote::new("a", Direction::Long, 0.5, 2.0, ""),
            Vote::new("b", Direction::Short, 0.5, 1.0, ""),
        ];
        assert_eq!(fused_score(&votes, 0.0), vote_score(&votes));
        // 0.5 net plus -0.1 confidence across 3.0 weight
        assert!((fused_score(&votes, -0.1) - 0.2).abs() < 1e-12);
        assert_eq!(fused_score(&[], 0.1), 0.0);
    }

    #[test]
    fn test_bullish_flow_accepted() {
        let mut engine = engine();
        let deadline = t0() + Duration::minutes(15);
        let now = deadline - Duration::seconds(240);
        let mut window = WindowState::new(t0(), deadline, dec!(0.5));

        let signal = engine
            .decide(now, dec!(0.62), &mut window, Some(bullish_snapshot(now)))
            .unwrap();
        assert_eq!(signal.direction, Direction::Long);
        assert!(signal.vote.passed_gate);
        assert_eq!(signal.multiplier, Decimal::ONE);
        assert!(signal.is_actionable());
        assert!(signal.score > 0.0);
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let mut engine = engine();
        let deadline = t0() + Duration::minutes(15);
        let now = deadline - Duration::seconds(240);
        let mut window = WindowState::new(t0(), deadline, dec!(0.5));

        // Only oracle rules could vote; a stale snapshot leaves too few votes
        let stale = bullish_snapshot(now - Duration::seconds(61));
        assert!(engine.decide(now, dec!(0.62), &mut window, Some(stale)).is_none());
    }

    #[test]
    fn test_late_signal_is_vetoed() {
        let mut engine = engine();
        let deadline = t0() + Duration::minutes(15);
        let now = deadline - Duration::seconds(60);
        let mut window = WindowState::new(t0(), deadline, dec!(0.5));

        let signal = engine
            .decide(now, dec!(0.62), &mut window, Some(bullish_snapshot(now)))
            .unwrap();
        assert!(signal.vetoed);
        assert!(!signal.vote.passed_gate);
        assert_eq!(signal.multiplier, Decimal::ZERO);
        assert!(!signal.is_actionable());
    }

    #[test]
    fn test_prior_adjusts_confidence_only() {
        let deadline = t0() + Duration::minutes(15);
        let now = deadline - Duration::seconds(240);

        // Every similar past session favoured SHORT
        let features = extract_features(&FeatureInput {
            price: 0.62,
            rsi: None,
            cvd_long: Some(120_000.0),
            prices: &[0.62],
            remaining: Duration::seconds(240),
            window: Duration::minutes(15),
        });
        let records: Vec<SessionRecord> = (0..40)
            .map(|i| SessionRecord {
                recorded_at: t0() - Duration::minutes(15 * i),
                direction: Direction::Short,
                features,
                won: true,
            })
            .collect();
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(records));

        let mut plain = engine();
        let mut with_prior = DecisionEngine::from_config(&Config::default(), Some(store));

        let mut w1 = WindowState::new(t0(), deadline, dec!(0.5));
        let mut w2 = WindowState::new(t0(), deadline, dec!(0.5));
        let a = plain
            .decide(now, dec!(0.62), &mut w1, Some(bullish_snapshot(now)))
            .unwrap();
        let b = with_prior
            .decide(now, dec!(0.62), &mut w2, Some(bullish_snapshot(now)))
            .unwrap();

        assert_eq!(a.direction, Direction::Long);
        assert_eq!(b.direction, Direction::Long);
        assert!((a.confidence - b.confidence - 0.1).abs() < 1e-9);
        // cvd_short 1.5 + cvd_long 3.0 + momentum_60s 0.9 + trend 1.0
        assert!((a.score - b.score - 0.1 * 6.4).abs() < 1e-9);
        assert!(b.rationale.iter().any(|r| r.starts_with("prior -1.000")));
    }
}
