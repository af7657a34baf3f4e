//! Session feature extraction

use super::types::SessionFeature;
use chrono::Duration;

/// CVD that maps to the outer bucket
const CVD_SCALE: f64 = 150_000.0;
/// Price samples used for the trend bucket
const TREND_SAMPLES: usize = 5;
/// Relative move that saturates the trend
const TREND_SCALE: f64 = 0.1;

/// Inputs available at decision time
#[derive(Debug, Clone, Copy)]
pub struct FeatureInput<'a> {
    /// Current contract price
    pub price: f64,
    pub rsi: Option<f64>,
    pub cvd_long: Option<f64>,
    /// Contract price history, oldest first
    pub prices: &'a [f64],
    /// Time left until the deadline
    pub remaining: Duration,
    /// Full window length
    pub window: Duration,
}

fn price_bucket(price: f64) -> u8 {
    if !price.is_finite() {
        return 2;
    }
    ((price.clamp(0.0, 0.999_999) * 5.0).floor()) as u8
}

fn time_bucket(remaining: Duration, window: Duration) -> u8 {
    let window = window.num_milliseconds();
    if window <= 0 {
        return 0;
    }
    let elapsed = (window - remaining.num_milliseconds()).clamp(0, window - 1);
    (elapsed * 3 / window) as u8
}

fn rsi_bucket(rsi: Option<f64>) -> u8 {
    let rsi = rsi.filter(|r| r.is_finite()).unwrap_or(50.0);
    ((rsi.clamp(0.0, 99.999) / 20.0).floor()) as u8
}

fn cvd_bucket(cvd: Option<f64>) -> i8 {
    let cvd = cvd.filter(|c| c.is_finite()).unwrap_or(0.0);
    ((cvd / CVD_SCALE).clamp(-1.0, 1.0) * 2.0).round() as i8
}

fn trend_bucket(prices: &[f64]) -> i8 {
    if prices.len() < TREND_SAMPLES {
        return 0;
    }
    let recent = &prices[prices.len() - TREND_SAMPLES..];
    let first = recent[0];
    if first <= 0.0 {
        return 0;
    }
    let trend = ((recent[TREND_SAMPLES - 1] - first) / first / TREND_SCALE).clamp(-1.0, 1.0);
    if trend > 0.2 {
        1
    } else if trend < -0.2 {
        -1
    } else {
        0
    }
}

/// Discretize the current observation
pub fn extract_features(input: &FeatureInput<'_>) -> SessionFeature {
    SessionFeature {
        price_bucket: price_bucket(input.price),
        time_bucket: time_bucket(input.remaining, input.window),
        rsi_bucket: rsi_bucket(input.rsi),
        cvd_bucket: cvd_bucket(input.cvd_long),
        trend_bucket: trend_bucket(input.prices),
    }
}
