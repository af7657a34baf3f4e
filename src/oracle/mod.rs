//! Order-flow oracle
//!
//! Consumes the reference instrument's trade and depth streams, maintains
//! rolling flow statistics and publishes immutable snapshots for the
//! decision engine.

mod accumulator;
mod aggregator;
mod book;
mod service;
mod snapshot_file;
mod types;

pub use accumulator::{DerivedStats, FlowAccumulator, VolumeDeltaWindow};
pub use aggregator::{signal_score, Oracle, OracleHandle};
pub use book::{DepthTracker, WallReading};
pub use service::{OracleService, OracleTasks};
pub use snapshot_file::{read_snapshot_file, write_snapshot_file};
pub use types::{fresh_snapshot, OracleSnapshot, SnapshotFileError, TickOutcome};
