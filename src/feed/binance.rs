//! Binance WebSocket trade and depth streams

use super::{DepthLevel, DepthSnapshot, MarketFeed, TradeSide, TradeTick};
use crate::config::FeedConfig;
use crate::ws::{WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Binance WebSocket base URL
const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443/ws";

/// Binance aggTrade message structure
#[derive(Debug, Deserialize)]
struct BinanceAggTrade {
    /// Event type
    #[serde(rename = "e")]
    event_type: String,
    /// Aggregate trade ID
    #[serde(rename = "a")]
    agg_id: u64,
    /// Price
    #[serde(rename = "p")]
    price: String,
    /// Quantity
    #[serde(rename = "q")]
    quantity: String,
    /// Trade time (milliseconds)
    #[serde(rename = "T")]
    trade_time: i64,
    /// Buyer is the maker, i.e. the aggressor sold
    #[serde(rename = "m")]
    buyer_is_maker: bool,
}

/// Binance partial book depth message (`<symbol>@depth20@100ms`)
#[derive(Debug, Deserialize)]
struct BinanceDepth {
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

/// Binance aggTrade + depth20 feed
pub struct BinanceFeed {
    symbol: String,
    base_url: String,
    ws_config: WsConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl BinanceFeed {
    /// Create a new Binance feed for the given symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().to_lowercase(),
            base_url: BINANCE_WS_URL.to_string(),
            ws_config: WsConfig::default(),
            shutdown: None,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        let ws_config = WsConfig::default()
            .max_reconnects(config.max_reconnect_attempts)
            .initial_delay(Duration::from_millis(config.initial_reconnect_ms))
            .max_delay(Duration::from_millis(config.max_reconnect_ms));
        Self {
            symbol: config.symbol.to_lowercase(),
            base_url: config.ws_base_url.trim_end_matches('/').to_string(),
            ws_config,
            shutdown: None,
        }
    }

    /// Close both streams once the watched value becomes `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn stream_url(&self, stream: &str) -> String {
        format!("{}/{}@{}", self.base_url, self.symbol, stream)
    }

    fn client(&self, url: String) -> WsClient {
        let config = WsConfig {
            url,
            ..self.ws_config.clone()
        };
        let client = WsClient::new(config);
        match &self.shutdown {
            Some(rx) => client.with_shutdown(rx.clone()),
            None => client,
        }
    }

    /// Parse an aggTrade message into a TradeTick
    fn parse_agg_trade(msg: &str) -> Option<TradeTick> {
        let trade: BinanceAggTrade = serde_json::from_str(msg).ok()?;
        if trade.event_type != "aggTrade" {
            return None;
        }

        let price: f64 = trade.price.parse().ok()?;
        let size: f64 = trade.quantity.parse().ok()?;
        if !price.is_finite() || !size.is_finite() || price <= 0.0 || size < 0.0 {
            return None;
        }

        Some(TradeTick {
            trade_id: trade.agg_id,
            timestamp: Utc.timestamp_millis_opt(trade.trade_time).single()?,
            price,
            size,
            side: if trade.buyer_is_maker {
                TradeSide::Sell
            } else {
                TradeSide::Buy
            },
        })
    }

    /// Parse a partial depth message. The payload has no event time, so the
    /// receive time is used.
    fn parse_depth(msg: &str, received_at: DateTime<Utc>) -> Option<DepthSnapshot> {
        let depth: BinanceDepth = serde_json::from_str(msg).ok()?;
        let levels = |raw: &[[String; 2]]| -> Option<Vec<DepthLevel>> {
            raw.iter()
                .map(|[p, s]| {
                    Some(DepthLevel {
                        price: p.parse().ok()?,
                        size: s.parse().ok()?,
                    })
                })
                .collect()
        };
        Some(DepthSnapshot {
            timestamp: received_at,
            bids: levels(depth.bids.as_slice())?,
            asks: levels(depth.asks.as_slice())?,
        })
    }

    /// Forward parsed messages until either side goes away
    async fn run_message_loop<T, F>(
        stream: &'static str,
        mut ws_rx: mpsc::Receiver<WsMessage>,
        out_tx: mpsc::Sender<T>,
        parse: F,
    ) where
        F: Fn(&str) -> Option<T>,
    {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => match parse(&text) {
                    Some(event) => {
                        if out_tx.send(event).await.is_err() {
                            tracing::debug!(stream, "Receiver dropped, stopping feed");
                            break;
                        }
                    }
                    None => tracing::trace!(stream, "Ignoring unparseable message"),
                },
                WsMessage::Connected => {
                    tracing::info!(stream, "Binance stream connected");
                }
                WsMessage::Disconnected => {
                    tracing::warn!(stream, "Binance stream disconnected");
                    break;
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::warn!(stream, attempt, "Binance stream reconnecting");
                }
                WsMessage::Binary(_) => {
                    // Binance market streams are text only
                }
            }
        }
    }
}

#[async_trait]
impl MarketFeed for BinanceFeed {
    async fn subscribe_trades(&self) -> anyhow::Result<mpsc::Receiver<TradeTick>> {
        let (tx, rx) = mpsc::channel(4096);
        let url = self.stream_url("aggTrade");
        tracing::info!(symbol = %self.symbol, %url, "Subscribing to Binance trades");

        let ws_rx = self.client(url).connect();
        tokio::spawn(Self::run_message_loop(
            "aggTrade",
            ws_rx,
            tx,
            Self::parse_agg_trade,
        ));
        Ok(rx)
    }

    async fn subscribe_depth(&self) -> anyhow::Result<mpsc::Receiver<DepthSnapshot>> {
        let (tx, rx) = mpsc::channel(256);
        let url = self.stream_url("depth20@100ms");
        tracing::info!(symbol = %self.symbol, %url, "Subscribing to Binance depth");

        let ws_rx = self.client(url).connect();
        tokio::spawn(Self::run_message_loop("depth", ws_rx, tx, |msg: &str| {
            Self::parse_depth(msg, Utc::now())
        }));
        Ok(rx)
    }
}
