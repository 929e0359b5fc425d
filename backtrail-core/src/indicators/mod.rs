//! Indicator engine: the `Indicator` trait, precomputed values, and the
//! concrete SMA, RSI and Bollinger implementations.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are precomputed once before signals are evaluated, never per bar.
//!
//! Bollinger Bands expose one named instance per band, keeping the
//! single-series `Indicator` trait unchanged.

pub mod bollinger;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::PriceBar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce an output series of the same
/// length. The first `lookback()` values are `f64::NAN` (warm-up).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Series name used as the `IndicatorValues` key (e.g., "sma_10", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars with undefined output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Container for precomputed indicator series, queried by bar index.
///
/// Insertion order is kept so diagnostics can print columns in the order the
/// strategy declared them.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
    order: Vec<String>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `bars`.
    pub fn precompute(bars: &[PriceBar], indicators: &[Box<dyn Indicator>]) -> Self {
        let mut values = Self::new();
        for indicator in indicators {
            values.insert(indicator.name(), indicator.compute(bars));
        }
        values
    }

    /// Insert a named series. Re-inserting a name replaces its values.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        if !self.series.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.series.insert(name, values);
    }

    /// Value at a specific bar index. `None` if the name or index is unknown.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Series names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Create synthetic bars from close prices for testing.
///
/// One bar per day starting 2024-01-02, OHL collapsed onto the close.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::from_close("TEST", base + Duration::days(i as i64), close))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert(
            "sma_20",
            vec![f64::NAN; 19]
                .into_iter()
                .chain(vec![100.0, 101.0])
                .collect(),
        );
        assert!(iv.get("sma_20", 0).unwrap().is_nan());
        assert_eq!(iv.get("sma_20", 19), Some(100.0));
        assert_eq!(iv.get("sma_20", 20), Some(101.0));
        assert_eq!(iv.get("sma_20", 21), None); // out of bounds
    }

    #[test]
    fn indicator_values_missing_name() {
        let iv = IndicatorValues::new();
        assert_eq!(iv.get("nonexistent", 0), None);
    }

    #[test]
    fn names_keep_insertion_order() {
        let mut iv = IndicatorValues::new();
        assert!(iv.is_empty());
        iv.insert("sma_50", vec![1.0]);
        iv.insert("sma_10", vec![1.0]);
        iv.insert("sma_50", vec![2.0]);
        assert_eq!(iv.names(), ["sma_50".to_string(), "sma_10".to_string()]);
        assert_eq!(iv.len(), 2);
        assert_eq!(iv.get("sma_50", 0), Some(2.0));
    }

    #[test]
    fn precompute_runs_every_indicator() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let indicators: Vec<Box<dyn Indicator>> = vec![Box::new(Sma::new(2)), Box::new(Rsi::new(2))];
        let iv = IndicatorValues::precompute(&bars, &indicators);
        assert_eq!(iv.len(), 2);
        assert_eq!(iv.get("sma_2", 2), Some(2.5));
        assert!(iv.get("rsi_2", 2).is_some());
    }
}
