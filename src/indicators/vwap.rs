//! Session VWAP that restarts at each UTC midnight

use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, Default)]
pub struct SessionVwap {
    day: Option<NaiveDate>,
    numerator: f64,
    denominator: f64,
}

impl SessionVwap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, timestamp: DateTime<Utc>, price: f64, volume: f64) {
        let day = timestamp.date_naive();
        if self.day != Some(day) {
            self.day = Some(day);
            self.numerator = 0.0;
            self.denominator = 0.0;
        }
        if volume > 0.0 && price.is_finite() {
            self.numerator += price * volume;
            self.denominator += volume;
        }
    }

    pub fn value(&self) -> Option<f64> {
        (self.denominator > 0.0).then(|| self.numerator / self.denominator)
    }
}
