//! poly-oracle: order-flow oracle and decision engine for Polymarket BTC
//! up/down windows
//!
//! This library provides the core components for:
//! - Real-time trade and depth streams from Binance
//! - Rolling order-flow statistics published as immutable snapshots
//! - Independent voting rules over snapshots and contract prices
//! - Weighted vote aggregation with an evidence gate
//! - A bounded prior from similar past sessions
//! - A multiplicative risk gate with hard vetoes
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod feed;
pub mod indicators;
pub mod memory;
pub mod oracle;
pub mod risk;
pub mod rules;
pub mod signal;
pub mod telemetry;
pub mod ws;
