//! Risk gate types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a factor scaled or vetoed the position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateReason {
    /// Less time left than the minimum (veto)
    TooLate { remaining_secs: i64 },
    /// Early in the window
    TooEarly { remaining_secs: i64 },
    /// Crossed the baseline too often (veto)
    Choppy { crossings: u32 },
    /// Crossing count near the limit
    ChopCaution { crossings: u32 },
    /// Choppy window let through by strong confirming flow
    ChopOverride { crossings: u32, cvd_long: f64 },
    /// Entry price outside every band (veto)
    PriceOutOfBand { entry_price: Decimal },
    /// Entry price in the fair band
    FairPrice { entry_price: Decimal },
    /// Entry price in the edge band
    EdgePrice { entry_price: Decimal },
    /// Long-window flow opposes the direction
    StrongDisagreement { cvd_long: f64 },
    /// Short-window flow opposes the direction
    Disagreement { cvd_short: f64 },
    /// No fresh snapshot to confirm the direction
    MissingSnapshot,
    /// Price very close to the baseline
    NearBaseline { distance: Decimal },
    /// Price fairly close to the baseline
    MidBaseline { distance: Decimal },
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateReason::TooLate { remaining_secs } => {
                write!(f, "too late: {}s left", remaining_secs)
            }
            GateReason::TooEarly { remaining_secs } => {
                write!(f, "early window: {}s left", remaining_secs)
            }
            GateReason::Choppy { crossings } => write!(f, "choppy: {} crossings", crossings),
            GateReason::ChopCaution { crossings } => {
                write!(f, "chop caution: {} crossings", crossings)
            }
            GateReason::ChopOverride {
                crossings,
                cvd_long,
            } => write!(
                f,
                "chop override: {} crossings, cvd_long {:+.0}",
                crossings, cvd_long
            ),
            GateReason::PriceOutOfBand { entry_price } => {
                write!(f, "entry {} outside bands", entry_price)
            }
            GateReason::FairPrice { entry_price } => write!(f, "fair entry {}", entry_price),
            GateReason::EdgePrice { entry_price } => write!(f, "edge entry {}", entry_price),
            GateReason::StrongDisagreement { cvd_long } => {
                write!(f, "cvd_long disagrees ({:+.0})", cvd_long)
            }
            GateReason::Disagreement { cvd_short } => {
                write!(f, "cvd_short disagrees ({:+.0})", cvd_short)
            }
            GateReason::MissingSnapshot => write!(f, "no fresh oracle snapshot"),
            GateReason::NearBaseline { distance } => {
                write!(f, "near baseline ({})", distance)
            }
            GateReason::MidBaseline { distance } => write!(f, "close to baseline ({})", distance),
        }
    }
}

/// Outcome of a single gate factor
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    /// No adjustment
    Pass,
    /// Pass with a note but no adjustment
    Note(GateReason),
    /// Scale the multiplier
    Scale(Decimal, GateReason),
    /// Reject outright
    Veto(GateReason),
}

/// Final multiplier and the reasons behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseResult {
    /// In [0, 1]; zero when vetoed
    pub multiplier: Decimal,
    pub vetoed: bool,
    pub reasons: Vec<GateReason>,
}

impl DefenseResult {
    pub fn pass() -> Self {
        Self {
            multiplier: Decimal::ONE,
            vetoed: false,
            reasons: Vec::new(),
        }
    }

    /// Fold one factor in; a veto zeroes the multiplier
    pub fn apply(&mut self, factor: Factor) {
        match factor {
            Factor::Pass => {}
            Factor::Note(reason) => self.reasons.push(reason),
            Factor::Scale(multiplier, reason) => {
                self.multiplier *= multiplier;
                self.reasons.push(reason);
            }
            Factor::Veto(reason) => {
                self.multiplier = Decimal::ZERO;
                self.vetoed = true;
                self.reasons.push(reason);
            }
        }
    }
}
