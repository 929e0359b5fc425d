//! Bollinger band breakout signal.
//!
//! Buy when the close breaks above the upper band, Sell when it breaks below
//! the lower band. Bar 0 always holds.

use crate::domain::{PriceBar, Signal};
use crate::indicators::{Bollinger, BollingerBand, Indicator, IndicatorValues};

use super::{defined, SignalGenerator};

#[derive(Debug, Clone)]
pub struct BollingerBreakout {
    pub window: usize,
    pub std_dev: f64,
    upper_key: String,
    lower_key: String,
}

impl BollingerBreakout {
    pub fn new(window: usize, std_dev: f64) -> Self {
        assert!(window >= 2, "window must be >= 2");
        assert!(std_dev > 0.0, "std_dev must be positive");
        Self {
            window,
            std_dev,
            upper_key: Bollinger::key(BollingerBand::Upper, window, std_dev),
            lower_key: Bollinger::key(BollingerBand::Lower, window, std_dev),
        }
    }

    pub fn default_params() -> Self {
        Self::new(20, 2.0)
    }
}

impl SignalGenerator for BollingerBreakout {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Bollinger::middle(self.window, self.std_dev)),
            Box::new(Bollinger::upper(self.window, self.std_dev)),
            Box::new(Bollinger::lower(self.window, self.std_dev)),
        ]
    }

    fn evaluate(&self, bars: &[PriceBar], bar_index: usize, indicators: &IndicatorValues) -> Signal {
        if bar_index == 0 {
            return Signal::Hold;
        }

        let close = bars[bar_index].close;
        if defined(indicators, &self.upper_key, bar_index).is_some_and(|upper| close > upper) {
            Signal::Buy
        } else if defined(indicators, &self.lower_key, bar_index).is_some_and(|lower| close < lower)
        {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
