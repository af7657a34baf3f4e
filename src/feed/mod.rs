//! Market data feed module
//!
//! Trade and depth streams for the reference instrument, plus REST candles
//! used for the coarse trend labels.

mod binance;
mod klines;
mod types;

pub use binance::BinanceFeed;
pub use klines::KlineClient;
pub use types::{Candle, DepthLevel, DepthSnapshot, FeedError, TradeSide, TradeTick};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Subscription-style source of trade and depth events for one instrument
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Subscribe to executed trades
    async fn subscribe_trades(&self) -> anyhow::Result<mpsc::Receiver<TradeTick>>;
    /// Subscribe to top-of-book depth snapshots
    async fn subscribe_depth(&self) -> anyhow::Result<mpsc::Receiver<DepthSnapshot>>;
}
