//! Streaming aggregator
//!
//! Owns all rolling state. Each accumulator sits behind its own lock so the
//! trade task, the depth task and the timer task only contend on the piece
//! they touch. Readers never see the accumulators; they receive immutable
//! snapshots through a watch channel.

use super::accumulator::FlowAccumulator;
use super::book::{DepthTracker, WallReading};
use super::types::{fresh_snapshot, OracleSnapshot, TickOutcome};
use crate::config::OracleConfig;
use crate::feed::{Candle, DepthSnapshot, TradeTick};
use crate::indicators::{ema_trend, ut_bot_hull_trend, PriceRing, TrendLabel, TrendParams};
use crate::telemetry::{increment, set_gauge, CounterMetric, GaugeMetric};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Candles kept per timeframe
const MAX_CANDLES: usize = 200;

#[derive(Debug, Default)]
struct TrendState {
    candles_15m: Vec<Candle>,
    candles_1h: Vec<Candle>,
    label_15m: TrendLabel,
    label_1h: TrendLabel,
}

#[derive(Debug, Default)]
struct PublishState {
    sequence: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Composite flow score in [-10, 10].
///
/// Blends both CVD windows with the wall imbalance; an extreme imbalance
/// confirmed by long-window flow pins the score to the rail.
pub fn signal_score(cvd_short: f64, cvd_long: f64, imbalance: Option<f64>) -> f64 {
    let short = (cvd_short / 50_000.0).clamp(-3.0, 3.0);
    let long = (cvd_long / 150_000.0).clamp(-5.0, 5.0);
    let mut score = long * 0.7 + short * 0.3;

    if let Some(imbalance) = imbalance {
        score += imbalance * 3.0;
        if imbalance > 0.85 && cvd_long > 50_000.0 {
            return 10.0;
        }
        if imbalance < -0.85 && cvd_long < -50_000.0 {
            return -10.0;
        }
    }

    let score = score.clamp(-10.0, 10.0);
    (score * 1000.0).round() / 1000.0
}

/// Streaming aggregator over one reference instrument
pub struct Oracle {
    config: OracleConfig,
    flow: Mutex<FlowAccumulator>,
    depth: Mutex<DepthTracker>,
    prices: Mutex<PriceRing>,
    trend: Mutex<TrendState>,
    publish_state: Mutex<PublishState>,
    publisher: watch::Sender<Option<Arc<OracleSnapshot>>>,
}

impl Oracle {
    pub fn new(config: OracleConfig) -> Self {
        let (publisher, _) = watch::channel(None);
        Self {
            flow: Mutex::new(FlowAccumulator::new(&config)),
            depth: Mutex::new(DepthTracker::new(config.wall_smoothing)),
            prices: Mutex::new(PriceRing::new(config.momentum_capacity)),
            trend: Mutex::new(TrendState::default()),
            publish_state: Mutex::new(PublishState::default()),
            publisher,
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(OracleConfig::default())
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Read side for consumers
    pub fn handle(&self) -> OracleHandle {
        OracleHandle {
            rx: self.publisher.subscribe(),
            max_age: Duration::seconds(self.config.freshness_secs),
        }
    }

    /// Add one trade to both volume-delta windows
    pub async fn ingest_trade(&self, tick: TradeTick) -> TickOutcome {
        let outcome = self.flow.lock().await.ingest(&tick);
        match outcome {
            TickOutcome::Accepted => increment(CounterMetric::TradesAccepted),
            TickOutcome::Duplicate => increment(CounterMetric::TradesDuplicate),
            TickOutcome::TooLate => increment(CounterMetric::TradesLate),
            TickOutcome::Invalid => increment(CounterMetric::TradesInvalid),
        }
        if outcome != TickOutcome::Accepted {
            tracing::debug!(trade_id = tick.trade_id, ?outcome, "Dropped trade");
        }
        outcome
    }

    /// Replace the book view
    pub async fn ingest_depth(&self, snapshot: DepthSnapshot) {
        self.depth.lock().await.ingest(&snapshot);
        increment(CounterMetric::DepthUpdates);
    }

    /// Append the latest traded price to the momentum ring
    pub async fn sample_price(&self, now: DateTime<Utc>) -> bool {
        let Some(price) = self.flow.lock().await.last_price() else {
            return false;
        };
        self.prices.lock().await.push(now, price)
    }

    /// Refresh MACD and Z-score over the sampled CVD series
    pub async fn compute_derived(&self) {
        let derived = self.flow.lock().await.compute_derived();
        tracing::trace!(?derived, "Derived stats refreshed");
    }

    /// Replace candle history and recompute the trend labels
    pub async fn update_candles(&self, candles_15m: Option<Vec<Candle>>, candles_1h: Option<Vec<Candle>>) {
        let params = TrendParams {
            key: self.config.ut_bot_key,
            atr_period: self.config.ut_bot_atr_period,
            hull_length: self.config.hull_length,
        };
        let mut trend = self.trend.lock().await;
        if let Some(mut candles) = candles_15m {
            trim_front(&mut candles, MAX_CANDLES);
            trend.label_15m = ut_bot_hull_trend(&candles, params).unwrap_or_default();
            trend.candles_15m = candles;
        }
        if let Some(mut candles) = candles_1h {
            trim_front(&mut candles, MAX_CANDLES);
            trend.label_1h = ema_trend(
                &candles,
                self.config.trend_ema_period,
                self.config.trend_min_candles,
            )
            .unwrap_or_default();
            trend.candles_1h = candles;
        }
        tracing::debug!(
            trend_15m = ?trend.label_15m,
            trend_1h = ?trend.label_1h,
            candles = trend.candles_15m.len(),
            "Trend labels updated"
        );
    }

    /// Build and publish a new immutable snapshot
    pub async fn publish(&self, now: DateTime<Utc>) -> Arc<OracleSnapshot> {
        let (cvd_short, cvd_long, derived, last_price, trade_count) = {
            let mut flow = self.flow.lock().await;
            flow.evict(now);
            (
                flow.cvd_short(),
                flow.cvd_long(),
                flow.derived(),
                flow.last_price(),
                flow.trade_count(),
            )
        };

        let stale_after = Duration::seconds(self.config.freshness_secs);
        let walls: WallReading = self.depth.lock().await.reading(now, stale_after);

        let (momentum_30s, momentum_60s, momentum_120s) = {
            let prices = self.prices.lock().await;
            (
                prices.momentum(now, Duration::seconds(30)),
                prices.momentum(now, Duration::seconds(60)),
                prices.momentum(now, Duration::seconds(120)),
            )
        };

        let (trend_label, trend_1h) = {
            let trend = self.trend.lock().await;
            (trend.label_15m, trend.label_1h)
        };

        let snapshot = {
            let mut state = self.publish_state.lock().await;
            state.sequence += 1;
            // Published timestamps never go backwards
            let timestamp = state.last_timestamp.map_or(now, |last| last.max(now));
            state.last_timestamp = Some(timestamp);

            Arc::new(OracleSnapshot {
                timestamp,
                sequence: state.sequence,
                cvd_short,
                cvd_long,
                momentum_30s,
                momentum_60s,
                momentum_120s,
                buy_wall: walls.buy_wall,
                sell_wall: walls.sell_wall,
                wall_imbalance: walls.imbalance,
                macd_histogram: derived.macd_histogram,
                delta_zscore: derived.delta_zscore,
                trend_label,
                trend_1h,
                last_price,
                trade_count,
                signal_score: signal_score(cvd_short, cvd_long, walls.imbalance),
            })
        };

        self.publisher.send_replace(Some(Arc::clone(&snapshot)));

        increment(CounterMetric::SnapshotsPublished);
        set_gauge(GaugeMetric::CvdShort, cvd_short);
        set_gauge(GaugeMetric::CvdLong, cvd_long);
        tracing::trace!(
            sequence = snapshot.sequence,
            cvd_short,
            cvd_long,
            score = snapshot.signal_score,
            "Published snapshot"
        );

        snapshot
    }
}

fn trim_front<T>(items: &mut Vec<T>, max: usize) {
    if items.len() > max {
        items.drain(..items.len() - max);
    }
}

/// Cloneable read handle that applies the freshness rule
#[derive(Clone)]
pub struct OracleHandle {
    rx: watch::Receiver<Option<Arc<OracleSnapshot>>>,
    max_age: Duration,
}

impl OracleHandle {
    /// Latest snapshot if it is fresh at `now`
    pub fn latest(&self, now: DateTime<Utc>) -> Option<Arc<OracleSnapshot>> {
        let snapshot = self.rx.borrow().clone();
        fresh_snapshot(snapshot, now, self.max_age)
    }

    /// Latest snapshot regardless of age
    pub fn latest_any(&self) -> Option<Arc<OracleSnapshot>> {
        self.rx.borrow().clone()
    }

    /// Wait for the next publish; `false` once the oracle is gone
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeltaUnit;
    use crate::feed::{DepthLevel, TradeSide};
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn oracle() -> Oracle {
        Oracle::new(OracleConfig {
            delta_unit: DeltaUnit::Base,
            ..OracleConfig::default()
        })
    }

    fn trade(id: u64, secs: i64, price: f64, size: f64, side: TradeSide) -> TradeTick {
        TradeTick {
            trade_id: id,
            timestamp: t(secs),
            price,
            size,
            side,
        }
    }

    #[test]
    fn test_signal_score_blend() {
        assert_eq!(signal_score(0.0, 0.0, None), 0.0);
        // 0.7 * 1 + 0.3 * 1
        assert_eq!(signal_score(50_000.0, 150_000.0, None), 1.0);
        // Clamped windows
        assert_eq!(signal_score(1e9, 1e9, None), 0.7 * 5.0 + 0.3 * 3.0);
        assert_eq!(signal_score(0.0, 0.0, Some(0.5)), 1.5);
    }

    #[test]
    fn test_signal_score_extreme_override() {
        assert_eq!(signal_score(0.0, 60_000.0, Some(0.9)), 10.0);
        assert_eq!(signal_score(0.0, -60_000.0, Some(-0.9)), -10.0);
        // Imbalance without confirming flow does not pin
        assert!(signal_score(0.0, -60_000.0, Some(0.9)) < 10.0);
    }

    #[tokio::test]
    async fn test_publish_reflects_trades_and_depth() {
        let oracle = oracle();
        oracle.ingest_trade(trade(1, 0, 100.0, 3.0, TradeSide::Buy)).await;
        oracle.ingest_trade(trade(2, 1, 101.0, 1.0, TradeSide::Sell)).await;
        oracle
            .ingest_depth(DepthSnapshot {
                timestamp: t(1),
                bids: vec![DepthLevel { price: 100.0, size: 4.0 }],
                asks: vec![DepthLevel { price: 101.0, size: 1.0 }],
            })
            .await;

        let snapshot = oracle.publish(t(2)).await;
        assert_eq!(snapshot.sequence, 1);
        assert_eq!(snapshot.cvd_short, 2.0);
        assert_eq!(snapshot.cvd_long, 2.0);
        assert_eq!(snapshot.buy_wall, 4.0);
        assert_eq!(snapshot.sell_wall, 1.0);
        assert_eq!(snapshot.last_price, Some(101.0));
        assert_eq!(snapshot.trade_count, 2);
        assert!((snapshot.wall_imbalance.unwrap() - 0.6).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_published_snapshot_is_not_mutated() {
        let oracle = oracle();
        oracle.ingest_trade(trade(1, 0, 100.0, 1.0, TradeSide::Buy)).await;
        let first = oracle.publish(t(1)).await;

        oracle.ingest_trade(trade(2, 1, 100.0, 5.0, TradeSide::Buy)).await;
        let second = oracle.publish(t(2)).await;

        assert_eq!(first.cvd_short, 1.0);
        assert_eq!(second.cvd_short, 6.0);
        assert_eq!(second.sequence, 2);
    }

    #[tokio::test]
    async fn test_publish_timestamps_non_decreasing() {
        let oracle = oracle();
        let first = oracle.publish(t(10)).await;
        let second = oracle.publish(t(5)).await;
        assert_eq!(first.timestamp, t(10));
        assert_eq!(second.timestamp, t(10));
    }

    #[tokio::test]
    async fn test_momentum_from_sampled_prices() {
        let oracle = oracle();
        assert!(!oracle.sample_price(t(0)).await);

        oracle.ingest_trade(trade(1, 0, 100.0, 1.0, TradeSide::Buy)).await;
        assert!(oracle.sample_price(t(0)).await);
        oracle.ingest_trade(trade(2, 30, 102.0, 1.0, TradeSide::Buy)).await;
        assert!(oracle.sample_price(t(30)).await);

        let snapshot = oracle.publish(t(30)).await;
        assert!((snapshot.momentum_30s - 2.0).abs() < 1e-12);
        assert_eq!(snapshot.momentum_60s, 0.0);
    }

    #[tokio::test]
    async fn test_handle_applies_freshness() {
        let oracle = oracle();
        let handle = oracle.handle();
        assert!(handle.latest(t(0)).is_none());

        oracle.publish(t(0)).await;
        assert!(handle.latest(t(30)).is_some());
        assert!(handle.latest(t(61)).is_none());
        assert!(handle.latest_any().is_some());
    }

    #[tokio::test]
    async fn test_dropped_handle_sender_reads_stale() {
        let handle = {
            let oracle = oracle();
            oracle.publish(t(0)).await;
            oracle.handle()
        };
        // Oracle stopped: last value is still readable but ages out
        assert!(handle.latest(t(10)).is_some());
        assert!(handle.latest(t(120)).is_none());
    }

    #[tokio::test]
    async fn test_update_candles_sets_trend() {
        let oracle = oracle();
        let start = t(0);
        let candles: Vec<Candle> = (0..60)
            .map(|i| {
                let close = 1000.0 + i as f64 * 20.0;
                Candle {
                    open_time: start + Duration::minutes(15 * i),
                    open: close,
                    high: close + 5.0,
                    low: close - 5.0,
                    close,
                    volume: 1.0,
                }
            })
            .collect();
        oracle
            .update_candles(Some(candles.clone()), Some(candles))
            .await;
        let snapshot = oracle.publish(t(1)).await;
        assert_eq!(snapshot.trend_label, TrendLabel::Long);
        assert_eq!(snapshot.trend_1h, TrendLabel::Long);
    }
}
