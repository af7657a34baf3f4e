//! Rolling Z-score

use std::collections::VecDeque;

/// `(latest - mean) / std` over the last `window` values (sample std).
#[derive(Debug, Clone)]
pub struct RollingZScore {
    window: usize,
    values: VecDeque<f64>,
}

/// Below this the window is treated as having no variance
const MIN_STD: f64 = 1e-9;

impl RollingZScore {
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    /// Push a value and return the Z-score of it against the current window
    pub fn update(&mut self, x: f64) -> Option<f64> {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(x);
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if self.values.len() < self.window {
            return None;
        }
        let n = self.values.len() as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        let var = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = var.sqrt();
        if !std.is_finite() || std < MIN_STD {
            return None;
        }
        let latest = *self.values.back()?;
        Some((latest - mean) / std)
    }
}
