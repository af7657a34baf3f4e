//! Indicator library
//!
//! Incremental and slice-based technical indicators shared by the oracle
//! and the rule set. All math is `f64`; callers guard the `None` cases.

mod ema;
mod momentum;
mod rsi;
mod trend;
mod vwap;
mod zscore;

pub use ema::{ema_series, Ema, Macd, MacdValue};
pub use momentum::{pct_change, PriceRing};
pub use rsi::rsi;
pub use trend::{
    atr_series, ema_trend, hull_series, ut_bot_hull_trend, wma_series, TrendLabel, TrendParams,
};
pub use vwap::SessionVwap;
pub use zscore::RollingZScore;
