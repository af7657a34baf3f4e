//! Status command implementation

use crate::config::Config;
use crate::oracle::read_snapshot_file;
use chrono::{Duration, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Override the snapshot file path
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

impl StatusArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = self
            .snapshot
            .clone()
            .unwrap_or_else(|| config.oracle.snapshot_path.clone());

        let snapshot = match read_snapshot_file(&path).await {
            Ok(s) => s,
            Err(e) => {
                println!("poly-oracle status");
                println!("  Snapshot: {} ({})", path.display(), e);
                println!("  Status: No snapshot");
                return Ok(());
            }
        };

        let now = Utc::now();
        let max_age = Duration::seconds(config.oracle.freshness_secs);
        let age = snapshot.age(now);
        let fresh = if snapshot.is_fresh(now, max_age) {
            "fresh"
        } else {
            "STALE"
        };

        println!("poly-oracle status");
        println!("  Snapshot: {}", path.display());
        println!(
            "  Sequence: {} at {} ({:.1}s old, {})",
            snapshot.sequence,
            snapshot.timestamp,
            age.num_milliseconds() as f64 / 1000.0,
            fresh
        );
        println!("  Trades: {}", snapshot.trade_count);
        println!(
            "  CVD: short={:.0} long={:.0}",
            snapshot.cvd_short, snapshot.cvd_long
        );
        println!(
            "  Momentum: 30s={:+.3}% 60s={:+.3}% 120s={:+.3}%",
            snapshot.momentum_30s, snapshot.momentum_60s, snapshot.momentum_120s
        );
        println!(
            "  Walls: buy={:.3} sell={:.3} imbalance={}",
            snapshot.buy_wall,
            snapshot.sell_wall,
            fmt_opt(snapshot.wall_imbalance)
        );
        println!(
            "  MACD hist: {}  Delta z: {}",
            fmt_opt(snapshot.macd_histogram),
            fmt_opt(snapshot.delta_zscore)
        );
        println!(
            "  Trend: 15m={} 1h={}",
            snapshot.trend_label, snapshot.trend_1h
        );
        println!("  Score: {:+.3}", snapshot.signal_score);
        Ok(())
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:+.3}", v))
}
