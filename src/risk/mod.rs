//! Risk gate
//!
//! Converts a vote result into a position-size multiplier or a veto

mod gate;
mod types;
mod window;

pub use gate::RiskGate;
pub use types::{DefenseResult, Factor, GateReason};
pub use window::WindowState;
