//! RSI-filtered moving average signal.
//!
//! Buy when the short SMA is above the long SMA and RSI is oversold (< 30).
//! Sell when the short SMA is below the long SMA and RSI is overbought (> 70).
//! Bar 0 always holds.

use crate::domain::{PriceBar, Signal};
use crate::indicators::{Indicator, IndicatorValues, Rsi, Sma};

use super::{defined, SignalGenerator};

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct RsiMaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    short_key: String,
    long_key: String,
    rsi_key: String,
}

impl RsiMaCrossover {
    pub fn new(short_window: usize, long_window: usize, rsi_period: usize) -> Self {
        assert!(short_window >= 1, "short_window must be >= 1");
        assert!(
            long_window > short_window,
            "long_window must be > short_window"
        );
        assert!(rsi_period >= 1, "rsi_period must be >= 1");
        Self {
            short_window,
            long_window,
            rsi_period,
            short_key: Sma::key(short_window),
            long_key: Sma::key(long_window),
            rsi_key: Rsi::key(rsi_period),
        }
    }

    pub fn default_params() -> Self {
        Self::new(10, 50, 14)
    }
}

impl SignalGenerator for RsiMaCrossover {
    fn name(&self) -> &str {
        "rsi_ma"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Sma::new(self.short_window)),
            Box::new(Sma::new(self.long_window)),
            Box::new(Rsi::new(self.rsi_period)),
        ]
    }

    fn evaluate(&self, _bars: &[PriceBar], bar_index: usize, indicators: &IndicatorValues) -> Signal {
        if bar_index == 0 {
            return Signal::Hold;
        }

        let (Some(short), Some(long), Some(rsi)) = (
            defined(indicators, &self.short_key, bar_index),
            defined(indicators, &self.long_key, bar_index),
            defined(indicators, &self.rsi_key, bar_index),
        ) else {
            return Signal::Hold;
        };

        if short > long && rsi < RSI_OVERSOLD {
            Signal::Buy
        } else if short < long && rsi > RSI_OVERBOUGHT {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
