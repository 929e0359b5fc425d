use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{pair_round_trips, Position, RoundTrip, Trade};

/// Portfolio state after one bar's transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub cash: f64,
    pub shares: u64,
    pub trailing_stop: Option<f64>,
    pub equity: f64,
}

/// Outcome of simulating one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub symbol: String,
    pub trades: Vec<Trade>,
    pub snapshots: Vec<BarSnapshot>,
    pub starting_cash: f64,
    pub final_cash: f64,
    /// Position still open after the last bar. Never force-closed.
    pub open_position: Option<Position>,
    pub last_close: f64,
    /// `final_cash + open shares * last_close`.
    pub portfolio_value: f64,
    pub total_return_pct: f64,
    /// Executed BUYs, including a trailing unmatched one.
    pub entries: usize,
    pub total_commission: f64,
}

impl SimulationResult {
    /// Trade log length halved. An unmatched final BUY is not counted.
    pub fn total_trades(&self) -> usize {
        self.trades.len() / 2
    }

    pub fn round_trips(&self) -> Vec<RoundTrip> {
        pair_round_trips(&self.trades)
    }

    pub fn realized_profit(&self) -> f64 {
        self.round_trips().iter().map(RoundTrip::profit).sum()
    }

    pub fn win_rate(&self) -> Option<f64> {
        let trips = self.round_trips();
        if trips.is_empty() {
            return None;
        }
        let winners = trips.iter().filter(|t| t.is_winner()).count();
        Some(winners as f64 / trips.len() as f64)
    }

    /// Largest peak-to-trough equity decline, as a positive percentage.
    pub fn max_drawdown_pct(&self) -> f64 {
        let mut peak = self.starting_cash;
        let mut worst = 0.0_f64;
        for snapshot in &self.snapshots {
            peak = peak.max(snapshot.equity);
            if peak > 0.0 {
                worst = worst.max((peak - snapshot.equity) / peak * 100.0);
            }
        }
        worst
    }
}
