//! Signal generation module
//!
//! Vote aggregation and the per-tick decision pipeline

mod engine;
mod history;
mod types;
mod voting;

pub use engine::{fused_score, vote_score, DecisionEngine};
pub use history::PriceHistory;
pub use types::{Direction, Signal, Vote, VoteResult};
pub use voting::{decide, tally, VotingAggregator};
