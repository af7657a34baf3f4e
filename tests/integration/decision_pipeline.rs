//! Decision pipeline integration tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use poly_oracle::config::Config;
use poly_oracle::indicators::TrendLabel;
use poly_oracle::oracle::OracleSnapshot;
use poly_oracle::risk::{GateReason, RiskGate, WindowState};
use poly_oracle::signal::{decide, DecisionEngine, Direction, Vote};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn bullish_snapshot(at: DateTime<Utc>) -> Arc<OracleSnapshot> {
    let mut s = OracleSnapshot::empty(at);
    s.sequence = 42;
    s.cvd_short = 45_000.0;
    s.cvd_long = 120_000.0;
    s.momentum_60s = 2.5;
    s.trend_label = TrendLabel::Long;
    Arc::new(s)
}

/// Engine primed with a steadily rising contract price
fn rising_engine(now: DateTime<Utc>) -> DecisionEngine {
    let mut engine = DecisionEngine::from_config(&Config::default(), None);
    let prices: Vec<Decimal> = (49..=62).map(|c| Decimal::new(c, 2)).collect();
    let start = now - Duration::seconds(prices.len() as i64);
    for (i, price) in prices.iter().enumerate() {
        assert!(engine.observe_price(start + Duration::seconds(i as i64), *price, None));
    }
    engine
}

#[test]
fn test_bullish_window_goes_long_at_full_size() {
    let deadline = window_start() + Duration::minutes(15);
    let now = deadline - Duration::seconds(240);
    let mut engine = rising_engine(now);
    let mut window = WindowState::new(window_start(), deadline, dec!(0.5));

    let signal = engine
        .decide(now, dec!(0.62), &mut window, Some(bullish_snapshot(now)))
        .expect("signal");

    // cvd_short, cvd_long, momentum_60s, trend, price_momentum, trend_strength
    assert_eq!(signal.vote.long_votes, 6);
    // RSI overbought and price above VWAP lean the other way
    assert_eq!(signal.vote.short_votes, 2);
    assert_eq!(signal.direction, Direction::Long);
    assert!(signal.vote.passed_gate);
    assert!(!signal.vetoed);
    assert_eq!(signal.multiplier, Decimal::ONE);
    assert!(signal.confidence >= 0.6);
    assert!(signal.rationale.iter().any(|r| r.starts_with("cvd_long LONG")));
}

#[test]
fn test_choppy_window_is_vetoed() {
    let deadline = window_start() + Duration::minutes(15);
    let now = deadline - Duration::seconds(240);
    let mut engine = rising_engine(now);
    let mut window = WindowState::new(window_start(), deadline, dec!(0.5));
    for price in [
        dec!(0.45),
        dec!(0.55),
        dec!(0.45),
        dec!(0.55),
        dec!(0.45),
        dec!(0.55),
    ] {
        window.observe_price(price);
    }
    // 0.62 keeps the price above the baseline, no new crossing
    assert_eq!(window.crossings(), 5);

    let signal = engine
        .decide(now, dec!(0.62), &mut window, Some(bullish_snapshot(now)))
        .expect("signal");
    assert!(signal.vetoed);
    assert_eq!(signal.multiplier, Decimal::ZERO);
    assert!(signal
        .rationale
        .iter()
        .any(|r| r == &GateReason::Choppy { crossings: 5 }.to_string()));
}

#[test]
fn test_expiry_veto_short_circuits() {
    let deadline = window_start() + Duration::minutes(15);
    let now = deadline - Duration::seconds(90);
    let mut engine = rising_engine(now);
    let mut window = WindowState::new(window_start(), deadline, dec!(0.5));

    let signal = engine
        .decide(now, dec!(0.62), &mut window, Some(bullish_snapshot(now)))
        .expect("signal");
    assert!(signal.vetoed);
    assert_eq!(signal.multiplier, Decimal::ZERO);
    // Gate reasons come last; only the expiry veto is reported
    let late = GateReason::TooLate { remaining_secs: 90 }.to_string();
    assert_eq!(signal.rationale.last(), Some(&late));
    assert!(!signal.rationale.iter().any(|r| r.starts_with("choppy")));
}

#[test]
fn test_missing_snapshot_scales_down() {
    let deadline = window_start() + Duration::minutes(15);
    let now = deadline - Duration::seconds(240);
    let gate = RiskGate::new(Config::default().risk);
    let window = WindowState::new(window_start(), deadline, dec!(0.5));

    let votes = vec![
        Vote::new("a", Direction::Long, 0.8, 1.0, ""),
        Vote::new("b", Direction::Long, 0.8, 1.0, ""),
        Vote::new("c", Direction::Long, 0.8, 1.0, ""),
    ];
    let result = decide(&votes, 3, 0.6).unwrap();
    let defense = gate.evaluate(&result, None, &window, dec!(0.62), now);
    assert!(!defense.vetoed);
    assert_eq!(defense.multiplier, dec!(0.5));
    assert!(defense.reasons.contains(&GateReason::MissingSnapshot));
}

#[test]
fn test_even_split_goes_long() {
    let votes = vec![
        Vote::new("up_a", Direction::Long, 0.7, 1.0, ""),
        Vote::new("up_b", Direction::Long, 0.7, 1.0, ""),
        Vote::new("down_a", Direction::Short, 0.7, 1.0, ""),
        Vote::new("down_b", Direction::Short, 0.7, 1.0, ""),
    ];
    let result = decide(&votes, 3, 0.6).unwrap();
    assert_eq!(result.direction, Direction::Long);

    let mut reversed = votes.clone();
    reversed.reverse();
    assert_eq!(decide(&reversed, 3, 0.6), Some(result));
}

#[test]
fn test_no_snapshot_and_no_history_is_silent() {
    let deadline = window_start() + Duration::minutes(15);
    let now = deadline - Duration::seconds(240);
    let mut engine = DecisionEngine::from_config(&Config::default(), None);
    let mut window = WindowState::new(window_start(), deadline, dec!(0.5));
    assert!(engine.decide(now, dec!(0.62), &mut window, None).is_none());
}
