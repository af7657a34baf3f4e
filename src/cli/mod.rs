//! CLI interface for poly-oracle
//!
//! Provides subcommands for:
//! - `oracle`: Run the order-flow oracle and publish snapshots
//! - `decide`: Compute one decision against the latest snapshot
//! - `status`: Show the latest published snapshot
//! - `config`: Validate and print configuration

mod decide;
mod oracle;
mod status;

pub use decide::DecideArgs;
pub use oracle::OracleArgs;
pub use status::StatusArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poly-oracle")]
#[command(about = "Order-flow oracle and decision engine for Polymarket BTC up/down windows")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the oracle until interrupted
    Oracle(OracleArgs),
    /// Compute one decision from the snapshot file
    Decide(DecideArgs),
    /// Show the latest snapshot
    Status(StatusArgs),
    /// Validate and print configuration
    Config,
}
