//! Position sizing — how many whole shares an entry buys.

use serde::{Deserialize, Serialize};

/// Share quantity rule applied on every entry.
///
/// A quantity of 0 means the entry is skipped. The simulator still checks
/// `quantity * price + commission <= cash` before executing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSizing {
    /// Largest whole-share quantity whose cost including commission fits in cash.
    #[default]
    AllIn,
    /// `floor(cash / price)`, ignoring commission. Entries the commission
    /// makes unaffordable are skipped.
    AllInGross,
    /// Fixed share count per entry.
    FixedShares { shares: u64 },
}

impl PositionSizing {
    /// Shares to buy at `price` with `cash` available.
    pub fn quantity(&self, cash: f64, price: f64, commission: f64) -> u64 {
        if !(price.is_finite() && price > 0.0) || cash <= 0.0 {
            return 0;
        }

        match *self {
            Self::AllIn => {
                let budget = cash - commission;
                if budget <= 0.0 {
                    return 0;
                }
                let mut shares = (budget / price).floor() as u64;
                // Division can round up across an integer boundary.
                if shares > 0 && shares as f64 * price + commission > cash {
                    shares -= 1;
                }
                shares
            }
            Self::AllInGross => (cash / price).floor() as u64,
            Self::FixedShares { shares } => shares,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AllIn => "all_in",
            Self::AllInGross => "all_in_gross",
            Self::FixedShares { .. } => "fixed_shares",
        }
    }
}
