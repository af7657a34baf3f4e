//! REST candle backfill for the trend labels

use super::{Candle, FeedError};
use crate::config::FeedConfig;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::time::Duration;

/// Fetches `/api/v3/klines` for one symbol
pub struct KlineClient {
    http: reqwest::Client,
    base_url: String,
    symbol: String,
}

impl KlineClient {
    pub fn new(base_url: impl Into<String>, symbol: impl Into<String>) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            symbol: symbol.into().to_uppercase(),
        })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        Self::new(&config.rest_base_url, &config.symbol)
    }

    /// Most recent `limit` candles for `interval` (e.g. "15m", "1h"), oldest first
    pub async fn fetch(&self, interval: &str, limit: u32) -> Result<Vec<Candle>, FeedError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();
        let rows: Vec<Vec<Value>> = self
            .http
            .get(&url)
            .query(&[
                ("symbol", self.symbol.as_str()),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let candles = parse_rows(&rows)?;
        tracing::debug!(symbol = %self.symbol, interval, count = candles.len(), "Fetched candles");
        Ok(candles)
    }
}

fn parse_rows(rows: &[Vec<Value>]) -> Result<Vec<Candle>, FeedError> {
    rows.iter().map(|row| parse_row(row)).collect()
}

fn parse_row(row: &[Value]) -> Result<Candle, FeedError> {
    let number = |idx: usize| -> Result<f64, FeedError> {
        let value = row
            .get(idx)
            .ok_or_else(|| FeedError::Parse(format!("kline missing field {idx}")))?;
        match value {
            Value::String(s) => s
                .parse()
                .map_err(|_| FeedError::Parse(format!("kline field {idx} not numeric: {s}"))),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| FeedError::Parse(format!("kline field {idx} out of range"))),
            other => Err(FeedError::Parse(format!("kline field {idx} unexpected: {other}"))),
        }
    };

    let open_ms = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| FeedError::Parse("kline open time missing".into()))?;
    let open_time = Utc
        .timestamp_millis_opt(open_ms)
        .single()
        .ok_or_else(|| FeedError::Parse(format!("kline open time invalid: {open_ms}")))?;

    Ok(Candle {
        open_time,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
    })
}
