//! Exponential moving averages and MACD

/// Exponential moving average seeded with its first input
/// (`adjust = false` recursion: `v = a*x + (1-a)*v`, `a = 2/(n+1)`).
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            alpha: 2.0 / (period.max(1) as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
            None => x,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// EMA over a whole slice, one output per input
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut ema = Ema::new(period);
    values.iter().map(|&v| ema.update(v)).collect()
}

/// One MACD reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Streaming MACD: fast EMA minus slow EMA, with a signal-line EMA of the difference.
///
/// Readings are withheld until `slow` inputs have been seen.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    warmup: usize,
    seen: usize,
    last: Option<MacdValue>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            warmup: slow,
            seen: 0,
            last: None,
        }
    }

    pub fn update(&mut self, x: f64) -> Option<MacdValue> {
        let macd = self.fast.update(x) - self.slow.update(x);
        let signal = self.signal.update(macd);
        self.seen += 1;

        if self.seen < self.warmup {
            return None;
        }
        let value = MacdValue {
            macd,
            signal,
            histogram: macd - signal,
        };
        self.last = Some(value);
        self.last
    }

    pub fn last(&self) -> Option<MacdValue> {
        self.last
    }
}
