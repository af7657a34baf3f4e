//! Weighted majority vote over rule outputs

use super::types::{Direction, Vote, VoteResult};
use crate::config::VotingConfig;
use std::cmp::Ordering;

/// Per-side accumulation
#[derive(Debug, Default, Clone, Copy)]
struct SideTally {
    count: usize,
    weighted_sum: f64,
    weight_sum: f64,
}

impl SideTally {
    fn add(&mut self, vote: &Vote) {
        self.count += 1;
        self.weighted_sum += vote.confidence * vote.weight;
        self.weight_sum += vote.weight;
    }

    fn weighted_confidence(&self) -> f64 {
        if self.weight_sum > 0.0 {
            self.weighted_sum / self.weight_sum
        } else {
            0.0
        }
    }
}

/// Order votes independent of how the caller produced them, so float sums
/// come out bit-identical for any permutation
fn canonical_order(a: &Vote, b: &Vote) -> Ordering {
    a.direction
        .cmp(&b.direction)
        .then_with(|| a.rule_name.cmp(&b.rule_name))
        .then_with(|| a.confidence.total_cmp(&b.confidence))
        .then_with(|| a.weight.total_cmp(&b.weight))
}

/// Count and weight both sides; `None` for an empty vote set.
///
/// More votes wins; equal counts go to the higher weighted confidence and a
/// full tie goes to LONG.
pub fn tally(votes: &[Vote]) -> Option<VoteResult> {
    if votes.is_empty() {
        return None;
    }

    let mut ordered: Vec<&Vote> = votes.iter().collect();
    ordered.sort_by(|a, b| canonical_order(a, b));

    let mut long = SideTally::default();
    let mut short = SideTally::default();
    for vote in ordered {
        match vote.direction {
            Direction::Long => long.add(vote),
            Direction::Short => short.add(vote),
        }
    }

    let long_conf = long.weighted_confidence();
    let short_conf = short.weighted_confidence();
    let direction = match long.count.cmp(&short.count) {
        Ordering::Greater => Direction::Long,
        Ordering::Less => Direction::Short,
        Ordering::Equal if short_conf > long_conf => Direction::Short,
        Ordering::Equal => Direction::Long,
    };
    let confidence = match direction {
        Direction::Long => long_conf,
        Direction::Short => short_conf,
    };

    Some(VoteResult {
        direction,
        confidence,
        long_votes: long.count,
        short_votes: short.count,
        long_weighted_confidence: long_conf,
        short_weighted_confidence: short_conf,
        passed_gate: false,
    })
}

/// Combine votes and apply the evidence gate.
///
/// Returns `None` below `min_votes` or `min_confidence`.
pub fn decide(votes: &[Vote], min_votes: usize, min_confidence: f64) -> Option<VoteResult> {
    VotingAggregator::new(min_votes, min_confidence).decide(votes)
}

/// Voting aggregator with fixed gate thresholds
#[derive(Debug, Clone, Copy)]
pub struct VotingAggregator {
    min_votes: usize,
    min_confidence: f64,
}

impl VotingAggregator {
    pub fn new(min_votes: usize, min_confidence: f64) -> Self {
        Self {
            min_votes,
            min_confidence,
        }
    }

    pub fn from_config(config: &VotingConfig) -> Self {
        Self::new(config.min_votes, config.min_confidence)
    }

    pub fn decide(&self, votes: &[Vote]) -> Option<VoteResult> {
        self.decide_with_adjustment(votes, 0.0)
    }

    /// Like [`decide`](Self::decide), with a signed confidence adjustment
    /// (positive favours LONG) applied to the winner before the confidence
    /// gate. The adjustment never changes the direction.
    pub fn decide_with_adjustment(&self, votes: &[Vote], adjustment: f64) -> Option<VoteResult> {
        if votes.len() < self.min_votes {
            tracing::debug!(votes = votes.len(), min = self.min_votes, "Too few votes");
            return None;
        }

        let mut result = tally(votes)?;
        if adjustment != 0.0 && adjustment.is_finite() {
            result.confidence =
                (result.confidence + adjustment * result.direction.sign()).clamp(0.0, 1.0);
        }

        if result.confidence < self.min_confidence {
            tracing::debug!(
                direction = %result.direction,
                confidence = result.confidence,
                min = self.min_confidence,
                "Confidence below gate"
            );
            return None;
        }

        Some(result)
    }

    pub fn min_votes(&self) -> usize {
        self.min_votes
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }
}
