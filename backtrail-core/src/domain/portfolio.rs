//! PortfolioState — cash, the single open position, and the trade log.

use serde::{Deserialize, Serialize};

use super::position::Position;
use super::trade::Trade;

/// Per-instrument portfolio state threaded through the simulation.
///
/// Created once per run with `cash = starting_cash` and an empty log. The
/// equity identity holds at every bar: `equity == cash + shares * close`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    /// Commission paid over the run (entries only).
    pub total_commission: f64,
}

impl PortfolioState {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            cash: starting_cash,
            position: None,
            trades: Vec::new(),
            total_commission: 0.0,
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Shares currently held (0 when flat).
    pub fn shares(&self) -> u64 {
        self.position.as_ref().map_or(0, |p| p.shares)
    }

    /// Total equity = cash + open position valued at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    /// Current trailing stop level, if a position is open.
    pub fn stop_level(&self) -> Option<f64> {
        self.position.as_ref().map(Position::stop_level)
    }
}
