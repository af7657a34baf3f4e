//! Relative strength index

/// RSI over the last `period` changes using simple averages.
///
/// Returns `None` until `period + 1` prices exist. A window with no losses
/// reads 99.9 (or 50 when flat); the result is clamped to [0.1, 99.9].
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), change| {
            if change > 0.0 {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    let value = if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            99.9
        } else {
            50.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    Some(value.clamp(0.1, 99.9))
}
