//! Signal generation — turns bars and precomputed indicators into one
//! discrete `Signal` per bar.
//!
//! Generators are portfolio-agnostic: they see bar history and indicator
//! values, never cash or positions. The simulator consumes their output as
//! opaque input.

pub mod bollinger;
pub mod moving_average;
pub mod rsi_ma;
pub mod strategy;

pub use bollinger::BollingerBreakout;
pub use moving_average::MaCrossover;
pub use rsi_ma::RsiMaCrossover;
pub use strategy::{StrategyConfig, StrategyError, StrategySpec};

use serde::{Deserialize, Serialize};

use crate::domain::{PriceBar, Signal};
use crate::engine::SignalBar;
use crate::indicators::{Indicator, IndicatorValues};

/// Trait for signal generators.
///
/// # Architecture invariant
/// `evaluate` receives only bar history and indicator values, and must only
/// read `bars[0..=bar_index]` and indicator values at or before `bar_index`.
pub trait SignalGenerator: Send + Sync {
    /// Strategy identifier (e.g., "moving_average").
    fn name(&self) -> &str;

    /// Indicators this generator reads, precomputed before evaluation.
    fn indicators(&self) -> Vec<Box<dyn Indicator>>;

    /// Signal for the bar at `bar_index`. Hold while indicators are warming up.
    fn evaluate(&self, bars: &[PriceBar], bar_index: usize, indicators: &IndicatorValues)
        -> Signal;
}

/// Occurrences of each signal value over a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub buy: usize,
    pub hold: usize,
    pub sell: usize,
}

/// Output of running a generator over a bar series.
#[derive(Debug, Clone)]
pub struct SignalTable {
    pub signals: Vec<Signal>,
    pub indicators: IndicatorValues,
}

impl SignalTable {
    pub fn counts(&self) -> SignalCounts {
        let mut counts = SignalCounts::default();
        for signal in &self.signals {
            match signal {
                Signal::Buy => counts.buy += 1,
                Signal::Hold => counts.hold += 1,
                Signal::Sell => counts.sell += 1,
            }
        }
        counts
    }

    /// Zip the signals with their bars into simulator input.
    pub fn to_signal_bars(&self, bars: &[PriceBar]) -> Vec<SignalBar> {
        bars.iter()
            .zip(&self.signals)
            .map(|(bar, &signal)| SignalBar {
                timestamp: bar.timestamp,
                close: bar.close,
                signal,
            })
            .collect()
    }
}

/// Precompute the generator's indicators, then evaluate every bar in order.
pub fn generate_signals(generator: &dyn SignalGenerator, bars: &[PriceBar]) -> SignalTable {
    let indicators = IndicatorValues::precompute(bars, &generator.indicators());
    let signals = (0..bars.len())
        .map(|i| generator.evaluate(bars, i, &indicators))
        .collect();
    SignalTable {
        signals,
        indicators,
    }
}

/// Read an indicator value, treating missing and NaN alike as undefined.
pub(crate) fn defined(indicators: &IndicatorValues, name: &str, bar_index: usize) -> Option<f64> {
    indicators.get(name, bar_index).filter(|v| !v.is_nan())
}
