//! Moving average crossover state signal.
//!
//! Buy while the short SMA is above the long SMA, Sell while it is below,
//! Hold when they are equal or either is still warming up. The signal reflects
//! the current regime on every bar, not only on the crossing bar.

use crate::domain::{PriceBar, Signal};
use crate::indicators::{Indicator, IndicatorValues, Sma};

use super::{defined, SignalGenerator};

/// # Indicator dependencies
/// - Short: `sma_{short_window}` (e.g., `sma_10`)
/// - Long: `sma_{long_window}` (e.g., `sma_50`)
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    short_key: String,
    long_key: String,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        assert!(short_window >= 1, "short_window must be >= 1");
        assert!(
            long_window > short_window,
            "long_window must be > short_window"
        );
        Self {
            short_window,
            long_window,
            short_key: Sma::key(short_window),
            long_key: Sma::key(long_window),
        }
    }

    pub fn default_params() -> Self {
        Self::new(10, 50)
    }
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &str {
        "moving_average"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Sma::new(self.short_window)),
            Box::new(Sma::new(self.long_window)),
        ]
    }

    fn evaluate(&self, _bars: &[PriceBar], bar_index: usize, indicators: &IndicatorValues) -> Signal {
        let (Some(short), Some(long)) = (
            defined(indicators, &self.short_key, bar_index),
            defined(indicators, &self.long_key, bar_index),
        ) else {
            return Signal::Hold;
        };

        if short > long {
            Signal::Buy
        } else if short < long {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
