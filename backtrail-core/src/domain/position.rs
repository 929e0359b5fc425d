use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trailing_stop::TrailingStop;

/// Open long position. Exists only while `shares > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub shares: u64,
    pub entry_price: f64,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_bar: usize,
    pub trailing_stop: TrailingStop,
}

impl Position {
    pub fn open(
        shares: u64,
        entry_price: f64,
        entry_timestamp: DateTime<Utc>,
        entry_bar: usize,
        trailing_stop_pct: f64,
    ) -> Self {
        Self {
            shares,
            entry_price,
            entry_timestamp,
            entry_bar,
            trailing_stop: TrailingStop::new(entry_price, trailing_stop_pct),
        }
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.shares as f64 * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.shares as f64 * (current_price - self.entry_price)
    }

    /// Ratchet the trailing stop on a close above the entry price.
    ///
    /// Closes at or below entry never move the stop.
    pub fn ratchet_stop(&mut self, close: f64) -> bool {
        if close > self.entry_price {
            let candidate = self.trailing_stop.candidate(close);
            self.trailing_stop.raise_to(candidate)
        } else {
            false
        }
    }

    pub fn stop_level(&self) -> f64 {
        self.trailing_stop.level()
    }
}
