//! Five-factor defense layer
//!
//! Factors run in a fixed order; each returns pass, a multiplier or a veto.
//! The first veto stops evaluation.

use super::types::{DefenseResult, Factor, GateReason};
use super::window::WindowState;
use crate::config::RiskConfig;
use crate::oracle::OracleSnapshot;
use crate::signal::{Direction, VoteResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Multiplicative risk gate
#[derive(Debug, Clone)]
pub struct RiskGate {
    config: RiskConfig,
}

impl RiskGate {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Gate a vote result.
    ///
    /// `contract_price` is the YES price; `now` is compared against the
    /// window's absolute deadline only.
    pub fn evaluate(
        &self,
        vote: &VoteResult,
        snapshot: Option<&OracleSnapshot>,
        window: &WindowState,
        contract_price: Decimal,
        now: DateTime<Utc>,
    ) -> DefenseResult {
        let direction = vote.direction;
        let factors: [&dyn Fn() -> Factor; 5] = [
            &|| self.expiry(window, now),
            &|| self.chop(direction, window, snapshot),
            &|| self.profit_margin(direction, contract_price),
            &|| self.agreement(direction, snapshot),
            &|| self.baseline_distance(contract_price),
        ];

        let mut result = DefenseResult::pass();
        for factor in factors {
            result.apply(factor());
            if result.vetoed {
                break;
            }
        }

        tracing::debug!(
            %direction,
            multiplier = %result.multiplier,
            vetoed = result.vetoed,
            reasons = result.reasons.len(),
            "Risk gate evaluated"
        );
        result
    }

    /// Veto too close to expiry; scale or veto too early in the window
    pub fn expiry(&self, window: &WindowState, now: DateTime<Utc>) -> Factor {
        let remaining_secs = window.remaining(now).num_seconds();
        if remaining_secs < self.config.min_remaining_secs {
            return Factor::Veto(GateReason::TooLate { remaining_secs });
        }
        match self.config.max_remaining_secs {
            Some(max) if remaining_secs > max => match self.config.early_multiplier {
                Some(multiplier) => Factor::Scale(multiplier, GateReason::TooEarly { remaining_secs }),
                None => Factor::Veto(GateReason::TooEarly { remaining_secs }),
            },
            _ => Factor::Pass,
        }
    }

    /// Penalize or veto a window that keeps crossing the baseline, unless
    /// long-window flow strongly confirms the direction
    pub fn chop(
        &self,
        direction: Direction,
        window: &WindowState,
        snapshot: Option<&OracleSnapshot>,
    ) -> Factor {
        let crossings = window.crossings();
        if crossings < self.config.caution_crossings && crossings < self.config.max_crossings {
            return Factor::Pass;
        }

        if let Some(cvd_long) = snapshot
            .map(|s| s.cvd_long)
            .filter(|cvd| direction.confirmed_by(*cvd, self.config.chop_override_cvd))
        {
            return Factor::Note(GateReason::ChopOverride {
                crossings,
                cvd_long,
            });
        }

        if crossings >= self.config.max_crossings {
            Factor::Veto(GateReason::Choppy { crossings })
        } else {
            Factor::Scale(
                self.config.caution_multiplier,
                GateReason::ChopCaution { crossings },
            )
        }
    }

    /// Scale by where the entry price sits; LONG enters at the YES price,
    /// SHORT at its complement
    pub fn profit_margin(&self, direction: Direction, contract_price: Decimal) -> Factor {
        let entry_price = match direction {
            Direction::Long => contract_price,
            Direction::Short => Decimal::ONE - contract_price,
        };
        let c = &self.config;
        let within = |low: Decimal, high: Decimal| entry_price >= low && entry_price <= high;

        if within(c.optimal_low, c.optimal_high) {
            Factor::Pass
        } else if within(c.fair_low, c.fair_high) {
            Factor::Scale(c.fair_multiplier, GateReason::FairPrice { entry_price })
        } else if within(c.edge_low, c.edge_high) {
            Factor::Scale(c.edge_multiplier, GateReason::EdgePrice { entry_price })
        } else {
            Factor::Veto(GateReason::PriceOutOfBand { entry_price })
        }
    }

    /// Penalize when reference-market flow points the other way
    pub fn agreement(&self, direction: Direction, snapshot: Option<&OracleSnapshot>) -> Factor {
        let Some(snapshot) = snapshot else {
            return Factor::Scale(
                self.config.missing_snapshot_multiplier,
                GateReason::MissingSnapshot,
            );
        };

        let sign = direction.sign();
        if snapshot.cvd_long * sign < -self.config.strong_disagreement_cvd {
            Factor::Scale(
                self.config.strong_disagreement_multiplier,
                GateReason::StrongDisagreement {
                    cvd_long: snapshot.cvd_long,
                },
            )
        } else if snapshot.cvd_short * sign < -self.config.disagreement_cvd {
            Factor::Scale(
                self.config.disagreement_multiplier,
                GateReason::Disagreement {
                    cvd_short: snapshot.cvd_short,
                },
            )
        } else {
            Factor::Pass
        }
    }

    /// Penalize prices that carry little information
    pub fn baseline_distance(&self, contract_price: Decimal) -> Factor {
        let distance = (contract_price - self.config.baseline).abs();
        if distance < self.config.near_distance {
            Factor::Scale(
                self.config.near_multiplier,
                GateReason::NearBaseline { distance },
            )
        } else if distance < self.config.mid_distance {
            Factor::Scale(
                self.config.mid_multiplier,
                GateReason::MidBaseline { distance },
            )
        } else {
            Factor::Pass
        }
    }
}
