//! Candle trend labels: UT Bot trailing stop + Hull MA, and EMA trend

use super::ema::ema_series;
use crate::feed::Candle;
use serde::{Deserialize, Serialize};

/// Coarse trend label carried in the oracle snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendLabel {
    Long,
    Short,
    #[default]
    Neutral,
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendLabel::Long => write!(f, "LONG"),
            TrendLabel::Short => write!(f, "SHORT"),
            TrendLabel::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// UT Bot / Hull parameters
#[derive(Debug, Clone, Copy)]
pub struct TrendParams {
    /// ATR multiplier for the trailing stop
    pub key: f64,
    pub atr_period: usize,
    pub hull_length: usize,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            key: 1.5,
            atr_period: 10,
            hull_length: 20,
        }
    }
}

/// Simple-average true range. The first bar's range is `high - low`.
pub fn atr_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let tr: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let range = c.high - c.low;
            match i.checked_sub(1).map(|p| candles[p].close) {
                Some(prev) => range.max((c.high - prev).abs()).max((c.low - prev).abs()),
                None => range,
            }
        })
        .collect();
    rolling_mean(&tr, period)
}

fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= period {
            sum -= values[i - period];
        }
        out.push((i + 1 >= period).then(|| sum / period as f64));
    }
    out
}

/// Linearly weighted moving average (newest weight = `period`)
pub fn wma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let denom = (period * (period + 1)) as f64 / 2.0;
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let weighted: f64 = window
                .iter()
                .enumerate()
                .map(|(k, v)| (k + 1) as f64 * v)
                .sum();
            Some(weighted / denom)
        })
        .collect()
}

/// Hull moving average: `WMA(2*WMA(n/2) - WMA(n), floor(sqrt(n)))`
pub fn hull_series(values: &[f64], length: usize) -> Vec<Option<f64>> {
    let half = length / 2;
    let root = (length as f64).sqrt() as usize;
    if half == 0 || root == 0 {
        return vec![None; values.len()];
    }

    let wma_half = wma_series(values, half);
    let wma_full = wma_series(values, length);
    let raw: Vec<Option<f64>> = wma_half
        .iter()
        .zip(&wma_full)
        .map(|(h, f)| Some(2.0 * (*h)? - (*f)?))
        .collect();

    let Some(start) = raw.iter().position(Option::is_some) else {
        return raw;
    };
    let defined: Vec<f64> = raw[start..].iter().flatten().copied().collect();
    let mut out = vec![None; start];
    out.extend(wma_series(&defined, root));
    out
}

/// UT Bot trailing-stop direction combined with the Hull slope over two bars.
///
/// `None` while there are too few candles; `Neutral` when the two disagree.
pub fn ut_bot_hull_trend(candles: &[Candle], params: TrendParams) -> Option<TrendLabel> {
    let n = candles.len();
    if n < params.atr_period.max(params.hull_length) + 5 {
        return None;
    }

    let atr = atr_series(candles, params.atr_period);
    let mut stop = 0.0_f64;
    for i in 1..n {
        let Some(atr) = atr[i] else {
            continue;
        };
        let n_loss = params.key * atr;
        let close = candles[i].close;
        let prev_close = candles[i - 1].close;
        stop = if close > stop && prev_close > stop {
            stop.max(close - n_loss)
        } else if close < stop && prev_close < stop {
            stop.min(close + n_loss)
        } else if close > stop {
            close - n_loss
        } else {
            close + n_loss
        };
    }
    let ut_up = candles[n - 1].close > stop;

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let hull = hull_series(&closes, params.hull_length);
    let hull_up = hull[n - 1]? > hull[n - 3]?;

    Some(match (ut_up, hull_up) {
        (true, true) => TrendLabel::Long,
        (false, false) => TrendLabel::Short,
        _ => TrendLabel::Neutral,
    })
}

/// Close above its EMA reads LONG, otherwise SHORT
pub fn ema_trend(candles: &[Candle], period: usize, min_candles: usize) -> Option<TrendLabel> {
    if candles.is_empty() || candles.len() < min_candles {
        return None;
    }
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let ema = *ema_series(&closes, period).last()?;
    let close = *closes.last()?;
    Some(if close > ema {
        TrendLabel::Long
    } else {
        TrendLabel::Short
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candles_from(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                open_time: start + Duration::minutes(15 * i as i64),
                open: close,
                high: close + 5.0,
                low: close - 5.0,
                close,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_wma_weights_newest_highest() {
        let wma = wma_series(&[1.0, 2.0, 3.0], 3);
        assert_eq!(wma[0], None);
        assert_eq!(wma[1], None);
        // (1*1 + 2*2 + 3*3) / 6
        assert!((wma[2].unwrap() - 14.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_atr_first_bar_is_range() {
        let candles = candles_from(&[100.0, 100.0, 100.0]);
        let atr = atr_series(&candles, 1);
        assert_eq!(atr[0], Some(10.0));
        assert_eq!(atr[2], Some(10.0));
    }

    #[test]
    fn test_hull_defined_after_warmup() {
        let closes: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let hull = hull_series(&closes, 20);
        // WMA(20) defined at 19, then WMA(4) over it defined 3 later
        assert!(hull[21].is_none());
        assert!(hull[22].is_some());
    }

    #[test]
    fn test_ut_bot_hull_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 1000.0 + i as f64 * 20.0).collect();
        let candles = candles_from(&closes);
        assert_eq!(
            ut_bot_hull_trend(&candles, TrendParams::default()),
            Some(TrendLabel::Long)
        );
    }

    #[test]
    fn test_ut_bot_hull_downtrend() {
        let closes: Vec<f64> = (0..60).map(|i| 3000.0 - i as f64 * 20.0).collect();
        let candles = candles_from(&closes);
        assert_eq!(
            ut_bot_hull_trend(&candles, TrendParams::default()),
            Some(TrendLabel::Short)
        );
    }

    #[test]
    fn test_ut_bot_hull_needs_data() {
        let candles = candles_from(&[100.0; 10]);
        assert!(ut_bot_hull_trend(&candles, TrendParams::default()).is_none());
    }

    #[test]
    fn test_ema_trend() {
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        assert_eq!(ema_trend(&candles_from(&rising), 20, 50), Some(TrendLabel::Long));

        let falling: Vec<f64> = (0..60).map(|i| 100.0 - i as f64).collect();
        assert_eq!(ema_trend(&candles_from(&falling), 20, 50), Some(TrendLabel::Short));

        assert!(ema_trend(&candles_from(&rising[..10]), 20, 50).is_none());
    }

    #[test]
    fn test_trend_label_serde() {
        assert_eq!(serde_json::to_string(&TrendLabel::Long).unwrap(), "\"LONG\"");
        let label: TrendLabel = serde_json::from_str("\"NEUTRAL\"").unwrap();
        assert_eq!(label, TrendLabel::Neutral);
    }
}
