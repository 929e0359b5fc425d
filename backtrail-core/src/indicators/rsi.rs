//! Relative Strength Index (RSI).
//!
//! Exponential smoothing of gains and losses with alpha = 1/period, the
//! recursive (non-adjusted) form seeded from a zero change at bar 0.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period - 1.
//! Edge case: avg_loss == 0 → RSI = 100 (including a flat series).

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn key(period: usize) -> String {
        format!("rsi_{period}")
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let alpha = 1.0 / self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;

        for i in 0..n {
            // Bar 0 has no prior close: its change counts as zero.
            let change = if i == 0 {
                0.0
            } else {
                bars[i].close - bars[i - 1].close
            };

            if change.is_nan() {
                // Smoothing state is lost; nothing after this point is defined.
                return result;
            }

            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            if i == 0 {
                avg_gain = gain;
                avg_loss = loss;
            } else {
                avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
                avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            }

            if i >= self.lookback() {
                result[i] = compute_rsi(avg_gain, avg_loss);
            }
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
