//! Session store and prior integration tests

use chrono::{Duration, TimeZone, Utc};
use poly_oracle::config::MemoryConfig;
use poly_oracle::memory::{
    write_sessions, ParquetSessionStore, PriorBias, SessionFeature, SessionMemory, SessionRecord,
    SessionStore,
};
use poly_oracle::signal::Direction;
use std::sync::Arc;
use tempfile::TempDir;

fn features() -> SessionFeature {
    SessionFeature {
        price_bucket: 3,
        time_bucket: 2,
        rsi_bucket: 2,
        cvd_bucket: 1,
        trend_bucket: 1,
    }
}

fn far_features() -> SessionFeature {
    SessionFeature {
        price_bucket: 0,
        time_bucket: 0,
        rsi_bucket: 4,
        cvd_bucket: -2,
        trend_bucket: -1,
    }
}

/// 20 long-favouring and 10 short-favouring matches, plus 15 unrelated sessions
fn history() -> Vec<SessionRecord> {
    let start = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    let mut records = Vec::new();
    for i in 0..45 {
        let (direction, won, f) = match i {
            0..=19 => (Direction::Long, true, features()),
            20..=29 => (Direction::Long, false, features()),
            _ => (Direction::Short, true, far_features()),
        };
        records.push(SessionRecord {
            recorded_at: start + Duration::minutes(15 * i),
            direction,
            features: f,
            won,
        });
    }
    records
}

#[test]
fn test_parquet_store_round_trip_newest_first() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions.parquet");
    let records = history();
    write_sessions(&path, &records).unwrap();

    let store = ParquetSessionStore::open(&path).unwrap();
    assert_eq!(store.len(), 45);

    let recent = store.recent(3).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0], records[44]);
    assert_eq!(recent[2], records[42]);
}

#[test]
fn test_missing_store_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = ParquetSessionStore::open(dir.path().join("absent.parquet")).unwrap();
    assert!(store.is_empty());
    assert!(store.recent(10).unwrap().is_empty());
}

#[test]
fn test_prior_from_parquet_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions.parquet");
    write_sessions(&path, &history()).unwrap();

    let store: Arc<dyn SessionStore> = Arc::new(ParquetSessionStore::open(&path).unwrap());
    let memory = SessionMemory::new(store, MemoryConfig::default());

    let bias = memory.prior_bias(&features());
    match bias {
        PriorBias::Bias { value, samples } => {
            assert_eq!(samples, 30);
            assert!((value - 1.0 / 3.0).abs() < 1e-12);
        }
        PriorBias::Neutral => panic!("expected a bias"),
    }
    assert!((memory.adjustment(&bias) - 0.1 / 3.0).abs() < 1e-12);

    // Too few matches for the unrelated bucket tuple
    assert_eq!(memory.prior_bias(&far_features()), PriorBias::Neutral);
}

#[test]
fn test_disabled_memory_is_neutral() {
    let store: Arc<dyn SessionStore> =
        Arc::new(poly_oracle::memory::InMemorySessionStore::new(history()));
    let config = MemoryConfig {
        enabled: false,
        ..MemoryConfig::default()
    };
    let memory = SessionMemory::new(store, config);
    assert_eq!(memory.prior_bias(&features()), PriorBias::Neutral);
    assert_eq!(memory.adjustment(&PriorBias::Neutral), 0.0);
}
