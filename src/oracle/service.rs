//! Oracle task wiring
//!
//! Spawns the long-running tasks that feed an [`Oracle`]: one per stream,
//! one timer that samples prices and publishes, and one candle refresher.
//! Every task exits when the shutdown flag flips or its input closes.

use super::aggregator::Oracle;
use super::snapshot_file::write_snapshot_file;
use crate::config::FeedConfig;
use crate::feed::{KlineClient, MarketFeed};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Resolve once shutdown is requested or the controller is gone
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Handles for the spawned oracle tasks
pub struct OracleTasks {
    handles: Vec<JoinHandle<()>>,
}

impl OracleTasks {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every task to finish
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Oracle task panicked");
            }
        }
    }
}

/// Builder for the oracle's background tasks
pub struct OracleService {
    oracle: Arc<Oracle>,
    shutdown: watch::Receiver<bool>,
    klines: Option<(KlineClient, Duration, u32)>,
    snapshot_path: Option<PathBuf>,
}

impl OracleService {
    pub fn new(oracle: Arc<Oracle>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            oracle,
            shutdown,
            klines: None,
            snapshot_path: None,
        }
    }

    /// Refresh trend candles on the feed's cadence
    pub fn with_klines(mut self, client: KlineClient, feed: &FeedConfig) -> Self {
        let every = Duration::from_secs(feed.kline_refresh_secs.max(1));
        self.klines = Some((client, every, feed.kline_limit));
        self
    }

    /// Mirror each published snapshot to a JSON file
    pub fn with_snapshot_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Subscribe to `feed` and spawn all tasks
    pub async fn start<F>(self, feed: &F) -> anyhow::Result<OracleTasks>
    where
        F: MarketFeed + ?Sized,
    {
        let trades = feed.subscribe_trades().await?;
        let depth = feed.subscribe_depth().await?;

        let mut handles = vec![
            tokio::spawn(trade_task(
                Arc::clone(&self.oracle),
                trades,
                self.shutdown.clone(),
            )),
            tokio::spawn(depth_task(
                Arc::clone(&self.oracle),
                depth,
                self.shutdown.clone(),
            )),
            tokio::spawn(timer_task(
                Arc::clone(&self.oracle),
                self.snapshot_path,
                self.shutdown.clone(),
            )),
        ];

        if let Some((client, every, limit)) = self.klines {
            handles.push(tokio::spawn(kline_task(
                Arc::clone(&self.oracle),
                client,
                every,
                limit,
                self.shutdown.clone(),
            )));
        }

        tracing::info!(tasks = handles.len(), "Oracle started");
        Ok(OracleTasks { handles })
    }
}

async fn trade_task(
    oracle: Arc<Oracle>,
    mut trades: tokio::sync::mpsc::Receiver<crate::feed::TradeTick>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            tick = trades.recv() => match tick {
                Some(tick) => {
                    oracle.ingest_trade(tick).await;
                }
                None => {
                    tracing::warn!("Trade stream closed");
                    break;
                }
            },
        }
    }
    tracing::debug!("Trade task stopped");
}

async fn depth_task(
    oracle: Arc<Oracle>,
    mut depth: tokio::sync::mpsc::Receiver<crate::feed::DepthSnapshot>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            update = depth.recv() => match update {
                Some(update) => oracle.ingest_depth(update).await,
                None => {
                    tracing::warn!("Depth stream closed");
                    break;
                }
            },
        }
    }
    tracing::debug!("Depth task stopped");
}

async fn timer_task(
    oracle: Arc<Oracle>,
    snapshot_path: Option<PathBuf>,
    mut shutdown: watch::Receiver<bool>,
) {
    let config = oracle.config();
    let mut sample = tokio::time::interval(Duration::from_millis(config.sample_interval_ms.max(1)));
    let mut publish =
        tokio::time::interval(Duration::from_millis(config.publish_interval_ms.max(1)));
    sample.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    publish.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            _ = sample.tick() => {
                oracle.sample_price(Utc::now()).await;
            }
            _ = publish.tick() => {
                oracle.compute_derived().await;
                let snapshot = oracle.publish(Utc::now()).await;
                if let Some(path) = &snapshot_path {
                    if let Err(e) = write_snapshot_file(path, &snapshot).await {
                        tracing::warn!(error = %e, path = %path.display(), "Failed to write snapshot file");
                    }
                }
            }
        }
    }
    tracing::debug!("Timer task stopped");
}

async fn kline_task(
    oracle: Arc<Oracle>,
    client: KlineClient,
    every: Duration,
    limit: u32,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut refresh = tokio::time::interval(every);
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            _ = refresh.tick() => {
                // A failed fetch keeps the previous label for that timeframe
                let candles_15m = match client.fetch("15m", limit).await {
                    Ok(c) => Some(c),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to fetch 15m candles");
                        None
                    }
                };
                let candles_1h = match client.fetch("1h", limit).await {
                    Ok(c) => Some(c),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to fetch 1h candles");
                        None
                    }
                };
                oracle.update_candles(candles_15m, candles_1h).await;
            }
        }
    }
    tracing::debug!("Kline task stopped");
}
