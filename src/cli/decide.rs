//! Decide command implementation

use crate::config::Config;
use crate::memory::{ParquetSessionStore, SessionStore};
use crate::oracle::read_snapshot_file;
use crate::risk::WindowState;
use crate::signal::DecisionEngine;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct DecideArgs {
    /// Current contract price in (0, 1)
    #[arg(long)]
    pub price: Decimal,

    /// Window deadline as Unix epoch seconds
    #[arg(long)]
    pub deadline: i64,

    /// Earlier contract prices, oldest first, one second apart
    #[arg(long, value_delimiter = ',')]
    pub history: Vec<Decimal>,

    /// Override the snapshot file path
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Print the signal as JSON
    #[arg(long)]
    pub json: bool,
}

impl DecideArgs {
    /// Absolute deadline of the current window
    pub fn deadline(&self) -> anyhow::Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.deadline, 0)
            .ok_or_else(|| anyhow::anyhow!("deadline {} is out of range", self.deadline))
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let deadline = self.deadline()?;
        let path = self
            .snapshot
            .clone()
            .unwrap_or_else(|| config.oracle.snapshot_path.clone());
        let snapshot = match read_snapshot_file(&path).await {
            Ok(s) => Some(Arc::new(s)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "No snapshot, deciding without oracle");
                None
            }
        };

        let store: Option<Arc<dyn SessionStore>> = match &config.memory.store_path {
            Some(p) => Some(Arc::new(ParquetSessionStore::open(p)?)),
            None => None,
        };
        let mut engine = DecisionEngine::from_config(config, store);

        let now = Utc::now();
        let start = now - Duration::seconds(self.history.len() as i64);
        for (i, price) in self.history.iter().enumerate() {
            engine.observe_price(start + Duration::seconds(i as i64), *price, None);
        }

        let mut window = WindowState::new(
            deadline - Duration::seconds(config.memory.window_secs),
            deadline,
            config.risk.baseline,
        );
        for price in &self.history {
            window.observe_price(*price);
        }

        let Some(signal) = engine.decide(now, self.price, &mut window, snapshot) else {
            println!("No signal");
            return Ok(());
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&signal)?);
            return Ok(());
        }

        println!(
            "{} confidence={:.3} score={:+.3} multiplier={} {}",
            signal.direction,
            signal.confidence,
            signal.score,
            signal.multiplier,
            if signal.vetoed { "VETOED" } else { "accepted" }
        );
        println!(
            "  votes: {} long / {} short",
            signal.vote.long_votes, signal.vote.short_votes
        );
        for line in &signal.rationale {
            println!("  - {}", line);
        }
        Ok(())
    }
}
