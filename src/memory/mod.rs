//! Session memory
//!
//! Discretizes the current session, finds similar past sessions in a
//! read-only store and turns their outcomes into a bounded directional prior.

mod features;
mod parquet_store;
mod prior;
mod store;
mod types;

pub use self::features::{extract_features, FeatureInput};
pub use self::parquet_store::{read_sessions, session_schema, write_sessions, ParquetSessionStore};
pub use self::prior::{prior_bias_from, SessionMemory};
pub use self::store::{InMemorySessionStore, SessionStore};
pub use self::types::{PriorBias, SessionFeature, SessionRecord, StoreError};
