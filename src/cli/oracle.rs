//! Oracle command implementation

use crate::config::Config;
use crate::feed::{BinanceFeed, KlineClient};
use crate::oracle::{Oracle, OracleService};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct OracleArgs {
    /// Override the snapshot file path
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Skip candle refresh; trend labels stay NEUTRAL
    #[arg(long)]
    pub no_klines: bool,
}

impl OracleArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let snapshot_path = self
            .snapshot
            .clone()
            .unwrap_or_else(|| config.oracle.snapshot_path.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let oracle = Arc::new(Oracle::new(config.oracle.clone()));
        let feed = BinanceFeed::from_config(&config.feed).with_shutdown(shutdown_rx.clone());

        let mut service = OracleService::new(Arc::clone(&oracle), shutdown_rx)
            .with_snapshot_file(snapshot_path.clone());
        if !self.no_klines {
            let client = KlineClient::from_config(&config.feed)?;
            service = service.with_klines(client, &config.feed);
        }

        let tasks = service.start(&feed).await?;
        tracing::info!(
            symbol = %config.feed.symbol,
            snapshot = %snapshot_path.display(),
            tasks = tasks.len(),
            "Oracle running"
        );

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested");
        let _ = shutdown_tx.send(true);
        tasks.join().await;

        if let Some(last) = oracle.handle().latest_any() {
            tracing::info!(
                sequence = last.sequence,
                trades = last.trade_count,
                "Oracle stopped"
            );
        }
        Ok(())
    }
}
