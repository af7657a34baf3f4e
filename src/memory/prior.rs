//! Historical-similarity prior

use super::store::SessionStore;
use super::types::{PriorBias, SessionFeature, SessionRecord};
use crate::config::MemoryConfig;
use std::sync::Arc;

/// Bias over the sessions within `max_distance` of `features`.
///
/// Neutral below `min_samples` matches.
pub fn prior_bias_from(
    records: &[SessionRecord],
    features: &SessionFeature,
    max_distance: u32,
    min_samples: usize,
) -> PriorBias {
    let (total, net) = records
        .iter()
        .filter(|r| r.features.distance(features) <= max_distance)
        .fold((0usize, 0i64), |(n, net), r| {
            (n + 1, net + i64::from(r.long_outcome()))
        });

    if total == 0 || total < min_samples {
        return PriorBias::Neutral;
    }
    PriorBias::Bias {
        value: net as f64 / total as f64,
        samples: total,
    }
}

/// Prior estimator over a read-only session store
pub struct SessionMemory {
    store: Arc<dyn SessionStore>,
    config: MemoryConfig,
}

impl SessionMemory {
    pub fn new(store: Arc<dyn SessionStore>, config: MemoryConfig) -> Self {
        Self { store, config }
    }

    /// Bias from the most recent `lookback` sessions. A store failure reads
    /// as Neutral.
    pub fn prior_bias(&self, features: &SessionFeature) -> PriorBias {
        if !self.config.enabled {
            return PriorBias::Neutral;
        }
        let records = match self.store.recent(self.config.lookback) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Session store read failed, prior is neutral");
                return PriorBias::Neutral;
            }
        };
        let bias = prior_bias_from(
            &records,
            features,
            self.config.max_distance,
            self.config.min_samples,
        );
        tracing::debug!(?features, ?bias, scanned = records.len(), "Session prior");
        bias
    }

    /// Signed confidence adjustment for `bias`, bounded by `max_adjustment`
    pub fn adjustment(&self, bias: &PriorBias) -> f64 {
        let limit = self.config.max_adjustment;
        (bias.value() * self.config.prior_weight).clamp(-limit, limit)
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySessionStore;
    use crate::signal::Direction;
    use chrono::{Duration, Utc};

    fn features(price_bucket: u8) -> SessionFeature {
        SessionFeature {
            price_bucket,
            time_bucket: 1,
            rsi_bucket: 2,
            cvd_bucket: 1,
            trend_bucket: 0,
        }
    }

    fn records(wins: usize, losses: usize, features: SessionFeature) -> Vec<SessionRecord> {
        let now = Utc::now();
        (0..wins + losses)
            .map(|i| SessionRecord {
                recorded_at: now - Duration::minutes(15 * i as i64),
                direction: Direction::Long,
                features,
                won: i < wins,
            })
            .collect()
    }

    #[test]
    fn test_bias_from_matched_set() {
        let history = records(20, 10, features(2));
        let bias = prior_bias_from(&history, &features(2), 0, 30);
        match bias {
            PriorBias::Bias { value, samples } => {
                assert_eq!(samples, 30);
                assert!((value - 1.0 / 3.0).abs() < 1e-12);
            }
            PriorBias::Neutral => panic!("expected a bias"),
        }
    }

    #[test]
    fn test_neutral_below_min_samples() {
        let history = records(20, 9, features(2));
        assert_eq!(
            prior_bias_from(&history, &features(2), 0, 30),
            PriorBias::Neutral
        );
    }

    #[test]
    fn test_distance_filter() {
        let mut history = records(20, 10, features(2));
        history.extend(records(0, 30, features(4)));
        // Bucket 4 is two steps away
        let bias = prior_bias_from(&history, &features(2), 1, 30);
        assert!((bias.value() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_wins_count_against_long() {
        let mut history = records(0, 0, features(2));
        let now = Utc::now();
        for i in 0..30 {
            history.push(SessionRecord {
                recorded_at: now - Duration::minutes(i),
                direction: Direction::Short,
                features: features(2),
                won: true,
            });
        }
        assert_eq!(prior_bias_from(&history, &features(2), 0, 30).value(), -1.0);
    }

    #[test]
    fn test_lookback_limits_scan() {
        let store = Arc::new(InMemorySessionStore::new(records(20, 10, features(2))));
        let memory = SessionMemory::new(
            store,
            MemoryConfig {
                lookback: 29,
                ..MemoryConfig::default()
            },
        );
        assert!(memory.prior_bias(&features(2)).is_neutral());
    }

    #[test]
    fn test_adjustment_is_bounded() {
        let memory = SessionMemory::new(
            Arc::new(InMemorySessionStore::default()),
            MemoryConfig {
                prior_weight: 0.5,
                max_adjustment: 0.1,
                ..MemoryConfig::default()
            },
        );
        let strong = PriorBias::Bias {
            value: -1.0,
            samples: 40,
        };
        assert_eq!(memory.adjustment(&strong), -0.1);
        assert_eq!(memory.adjustment(&PriorBias::Neutral), 0.0);
    }
}
