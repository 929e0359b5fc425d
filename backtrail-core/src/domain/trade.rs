//! Trade — one execution in the append-only trade log, and round-trip pairing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an execution. Long-only: BUY opens, SELL closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitReason {
    /// The bar's signal was Sell.
    SellSignal,
    /// The close fell to or below the trailing stop.
    TrailingStop { stop: f64 },
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::SellSignal => f.write_str("sell signal"),
            ExitReason::TrailingStop { stop } => write!(f, "trailing stop hit at {stop:.2}"),
        }
    }
}

/// A single execution. Immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub action: TradeAction,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub shares: u64,
    /// Index of the bar that produced this execution.
    pub bar_index: usize,
    /// Set on SELL trades only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

impl Trade {
    pub fn buy(timestamp: DateTime<Utc>, bar_index: usize, price: f64, shares: u64) -> Self {
        Self {
            action: TradeAction::Buy,
            timestamp,
            price,
            shares,
            bar_index,
            exit_reason: None,
        }
    }

    pub fn sell(
        timestamp: DateTime<Utc>,
        bar_index: usize,
        price: f64,
        shares: u64,
        reason: ExitReason,
    ) -> Self {
        Self {
            action: TradeAction::Sell,
            timestamp,
            price,
            shares,
            bar_index,
            exit_reason: Some(reason),
        }
    }
}

/// A matched BUY followed by its SELL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub entry_timestamp: DateTime<Utc>,
    pub exit_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: u64,
    pub bars_held: usize,
    pub exit_reason: Option<ExitReason>,
}

impl RoundTrip {
    /// Realized profit on the shares, gross of the entry commission.
    pub fn profit(&self) -> f64 {
        self.shares as f64 * (self.exit_price - self.entry_price)
    }

    /// Price return of the round trip as a fraction of entry price.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (self.exit_price - self.entry_price) / self.entry_price
    }

    pub fn is_winner(&self) -> bool {
        self.profit() > 0.0
    }
}

/// Pair a BUY/SELL trade log into round trips.
///
/// A trailing unmatched BUY (position still open at the end of the run) is
/// not a round trip and is ignored.
pub fn pair_round_trips(trades: &[Trade]) -> Vec<RoundTrip> {
    trades
        .chunks_exact(2)
        .filter(|pair| pair[0].action == TradeAction::Buy && pair[1].action == TradeAction::Sell)
        .map(|pair| {
            let (entry, exit) = (&pair[0], &pair[1]);
            RoundTrip {
                entry_timestamp: entry.timestamp,
                exit_timestamp: exit.timestamp,
                entry_price: entry.price,
                exit_price: exit.price,
                shares: exit.shares,
                bars_held: exit.bar_index.saturating_sub(entry.bar_index),
                exit_reason: exit.exit_reason,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn pairs_completed_round_trips_only() {
        let trades = vec![
            Trade::buy(day(1), 0, 100.0, 10),
            Trade::sell(day(4), 3, 110.0, 10, ExitReason::SellSignal),
            Trade::buy(day(5), 4, 108.0, 9),
        ];
        let trips = pair_round_trips(&trades);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].bars_held, 3);
        assert!((trips[0].profit() - 100.0).abs() < 1e-10);
        assert!(trips[0].is_winner());
        assert!((trips[0].return_pct() - 0.10).abs() < 1e-12);
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::SellSignal.to_string(), "sell signal");
        assert_eq!(
            ExitReason::TrailingStop { stop: 108.0 }.to_string(),
            "trailing stop hit at 108.00"
        );
    }

    #[test]
    fn action_serializes_uppercase() {
        let json = serde_json::to_string(&TradeAction::Buy).unwrap();
        assert_eq!(json, "\"BUY\"");
    }

    #[test]
    fn buy_trade_omits_exit_reason() {
        let json = serde_json::to_string(&Trade::buy(day(1), 0, 100.0, 1)).unwrap();
        assert!(!json.contains("exit_reason"));
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(back.exit_reason, None);
    }
}
