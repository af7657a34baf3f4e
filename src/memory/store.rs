//! Read access to recorded sessions

use super::types::{SessionRecord, StoreError};

/// Read-only view over past sessions
pub trait SessionStore: Send + Sync {
    /// Up to `limit` most recent sessions, newest first
    fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError>;
}

/// Store backed by a fixed in-memory list
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    /// Oldest first
    records: Vec<SessionRecord>,
}

impl InMemorySessionStore {
    pub fn new(mut records: Vec<SessionRecord>) -> Self {
        records.sort_by_key(|r| r.recorded_at);
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.records.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SessionFeature;
    use crate::signal::Direction;
    use chrono::{Duration, Utc};

    #[test]
    fn test_recent_is_newest_first_and_bounded() {
        let now = Utc::now();
        let features = SessionFeature {
            price_bucket: 2,
            time_bucket: 1,
            rsi_bucket: 2,
            cvd_bucket: 0,
            trend_bucket: 0,
        };
        let records: Vec<SessionRecord> = [3, 1, 2]
            .into_iter()
            .map(|m| SessionRecord {
                recorded_at: now - Duration::minutes(15 * m),
                direction: Direction::Long,
                features,
                won: true,
            })
            .collect();
        let store = InMemorySessionStore::new(records);

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].recorded_at, now - Duration::minutes(15));
        assert_eq!(recent[1].recorded_at, now - Duration::minutes(30));
    }
}
