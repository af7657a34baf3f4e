//! Oracle streaming integration tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use poly_oracle::config::{DeltaUnit, OracleConfig};
use poly_oracle::feed::{DepthLevel, DepthSnapshot, TradeSide, TradeTick};
use poly_oracle::oracle::{
    read_snapshot_file, write_snapshot_file, Oracle, TickOutcome, VolumeDeltaWindow,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn trade(id: u64, at: DateTime<Utc>, size: f64, side: TradeSide) -> TradeTick {
    TradeTick {
        trade_id: id,
        timestamp: at,
        price: 100_000.0,
        size,
        side,
    }
}

#[test]
fn test_running_sum_matches_resummation() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut window = VolumeDeltaWindow::new(Duration::seconds(60));
    let mut entries: Vec<(DateTime<Utc>, f64)> = Vec::new();

    let mut now = t0();
    for _ in 0..20_000 {
        now += Duration::milliseconds(rng.gen_range(1..250));
        let delta = rng.gen_range(-5.0e5..5.0e5);
        window.add(now, delta);
        entries.push((now, delta));
        window.evict(now);
    }

    let cutoff = now - Duration::seconds(60);
    let expected: f64 = entries
        .iter()
        .filter(|(ts, _)| *ts >= cutoff)
        .map(|(_, d)| d)
        .sum();
    let live = entries.iter().filter(|(ts, _)| *ts >= cutoff).count();
    assert_eq!(window.len(), live);
    assert!((window.value() - expected).abs() < 1e-3);
}

#[tokio::test]
async fn test_replayed_and_late_trades_are_dropped() {
    let oracle = Oracle::new(OracleConfig {
        delta_unit: DeltaUnit::Base,
        ..OracleConfig::default()
    });

    let base = t0();
    assert_eq!(
        oracle.ingest_trade(trade(1, base, 2.0, TradeSide::Buy)).await,
        TickOutcome::Accepted
    );
    assert_eq!(
        oracle
            .ingest_trade(trade(2, base + Duration::seconds(5), 1.0, TradeSide::Sell))
            .await,
        TickOutcome::Accepted
    );
    // Reconnect replay
    assert_eq!(
        oracle.ingest_trade(trade(2, base + Duration::seconds(5), 1.0, TradeSide::Sell)).await,
        TickOutcome::Duplicate
    );
    // Fresh id but 3s behind the newest accepted trade
    assert_eq!(
        oracle
            .ingest_trade(trade(3, base + Duration::seconds(2), 9.0, TradeSide::Buy))
            .await,
        TickOutcome::TooLate
    );

    let snapshot = oracle.publish(base + Duration::seconds(5)).await;
    assert_eq!(snapshot.trade_count, 2);
    assert!((snapshot.cvd_short - 1.0).abs() < 1e-12);
    assert!((snapshot.cvd_long - 1.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_published_snapshot_reaches_file_readers() {
    let oracle = Oracle::with_defaults();
    let now = t0();
    oracle.ingest_trade(trade(1, now, 0.5, TradeSide::Buy)).await;
    oracle
        .ingest_depth(DepthSnapshot {
            timestamp: now,
            bids: vec![DepthLevel {
                price: 99_999.0,
                size: 3.0,
            }],
            asks: vec![DepthLevel {
                price: 100_001.0,
                size: 1.0,
            }],
        })
        .await;

    let handle = oracle.handle();
    let snapshot = oracle.publish(now).await;
    assert_eq!(handle.latest(now).as_deref(), Some(&*snapshot));
    assert_eq!(snapshot.buy_wall, 3.0);
    assert_eq!(snapshot.wall_imbalance, Some(0.5));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("snapshot.json");
    write_snapshot_file(&path, &snapshot).await.unwrap();
    let back = read_snapshot_file(&path).await.unwrap();
    assert_eq!(back, *snapshot);
}

#[test]
fn test_dropped_oracle_reads_as_stale() {
    let handle = {
        let oracle = Oracle::with_defaults();
        tokio_test::block_on(oracle.publish(t0()));
        oracle.handle()
    };
    // The last value stays readable until it ages out
    assert!(handle.latest(t0()).is_some());
    assert!(handle.latest(t0() + Duration::seconds(61)).is_none());
    assert!(handle.latest_any().is_some());
}
