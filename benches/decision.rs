//! Benchmarks for the per-tick decision path

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use poly_oracle::config::Config;
use poly_oracle::indicators::TrendLabel;
use poly_oracle::oracle::{OracleSnapshot, VolumeDeltaWindow};
use poly_oracle::risk::WindowState;
use poly_oracle::rules::{Observation, RuleSet};
use poly_oracle::signal::{DecisionEngine, Direction, Vote, VotingAggregator};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn snapshot(at: chrono::DateTime<Utc>) -> OracleSnapshot {
    let mut s = OracleSnapshot::empty(at);
    s.cvd_short = 45_000.0;
    s.cvd_long = 120_000.0;
    s.momentum_30s = 0.8;
    s.momentum_60s = 2.5;
    s.momentum_120s = 1.2;
    s.wall_imbalance = Some(0.4);
    s.delta_zscore = Some(2.3);
    s.trend_label = TrendLabel::Long;
    s
}

fn benchmark_rule_evaluation(c: &mut Criterion) {
    let rules = RuleSet::from_config(&Config::default().rules);
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let prices: Vec<f64> = (0..200).map(|i| 0.40 + i as f64 * 0.001).collect();
    let snap = snapshot(now);
    let observation = Observation {
        now,
        prices: &prices,
        vwap: Some(0.48),
        oracle: Some(&snap),
    };

    c.bench_function("rules_evaluate_all", |b| {
        b.iter(|| rules.evaluate_all(black_box(&observation)))
    });
}

fn benchmark_voting(c: &mut Criterion) {
    let voting = VotingAggregator::new(3, 0.6);
    let votes: Vec<Vote> = (0..12)
        .map(|i| {
            let direction = if i % 3 == 0 {
                Direction::Short
            } else {
                Direction::Long
            };
            Vote::new("rule", direction, 0.5 + i as f64 * 0.03, 1.0 + i as f64 * 0.1, "")
        })
        .collect();

    c.bench_function("voting_decide", |b| {
        b.iter(|| voting.decide_with_adjustment(black_box(&votes), black_box(0.05)))
    });
}

fn benchmark_decision_tick(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let deadline = start + Duration::minutes(15);
    let now = deadline - Duration::seconds(240);
    let snap = Arc::new(snapshot(now));
    let mut engine = DecisionEngine::from_config(&Config::default(), None);
    for i in 0..100 {
        engine.observe_price(
            now - Duration::seconds(100 - i),
            Decimal::new(50 + i % 15, 2),
            None,
        );
    }

    c.bench_function("decision_tick", |b| {
        b.iter(|| {
            let mut window = WindowState::new(start, deadline, dec!(0.5));
            engine.decide(black_box(now), dec!(0.62), &mut window, Some(Arc::clone(&snap)))
        })
    });
}

fn benchmark_cvd_window(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    c.bench_function("cvd_add_evict_1000", |b| {
        b.iter(|| {
            let mut window = VolumeDeltaWindow::new(Duration::seconds(60));
            for i in 0..1000 {
                let ts = start + Duration::milliseconds(i * 100);
                window.add(ts, if i % 2 == 0 { 1.5e4 } else { -1.2e4 });
                window.evict(ts);
            }
            black_box(window.value())
        })
    });
}

criterion_group!(
    benches,
    benchmark_rule_evaluation,
    benchmark_voting,
    benchmark_decision_tick,
    benchmark_cvd_window
);
criterion_main!(benches);
