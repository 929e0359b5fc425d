//! Per-instrument summary rows and cross-instrument insights.

use serde::{Deserialize, Serialize};

use backtrail_core::engine::SimulationResult;

/// One line of the batch summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub stock: String,
    /// Completed round trips: trade log length halved.
    pub total_trades: usize,
    /// Total return in percent, rounded to 2 decimals.
    pub total_return_pct: f64,
    /// `starting_cash * (1 + return / 100)` from the unrounded return,
    /// rounded to 2 decimals.
    pub final_portfolio_value: f64,
}

impl SummaryRow {
    pub fn from_result(result: &SimulationResult) -> Self {
        Self {
            stock: result.symbol.clone(),
            total_trades: result.total_trades(),
            total_return_pct: round2(result.total_return_pct),
            final_portfolio_value: round2(
                result.starting_cash * (1.0 + result.total_return_pct / 100.0),
            ),
        }
    }
}

/// Best or worst instrument by return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standout {
    pub stock: String,
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Mean of the rounded per-instrument returns.
    pub average_return_pct: f64,
    pub best: Standout,
    pub worst: Standout,
}

/// Aggregate insights over summary rows. `None` when no instrument ran.
///
/// Ties for best or worst go to the earliest row.
pub fn insights(rows: &[SummaryRow]) -> Option<Insights> {
    let first = rows.first()?;
    let mut best = first;
    let mut worst = first;
    for row in &rows[1..] {
        if row.total_return_pct > best.total_return_pct {
            best = row;
        }
        if row.total_return_pct < worst.total_return_pct {
            worst = row;
        }
    }

    let sum: f64 = rows.iter().map(|r| r.total_return_pct).sum();
    let standout = |row: &SummaryRow| Standout {
        stock: row.stock.clone(),
        return_pct: row.total_return_pct,
    };

    Some(Insights {
        average_return_pct: sum / rows.len() as f64,
        best: standout(best),
        worst: standout(worst),
    })
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(stock: &str, ret: f64) -> SummaryRow {
        SummaryRow {
            stock: stock.into(),
            total_trades: 1,
            total_return_pct: ret,
            final_portfolio_value: 0.0,
        }
    }

    #[test]
    fn round2_values() {
        assert_eq!(round2(4.9399999), 4.94);
        assert_eq!(round2(-1.234), -1.23);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn insights_pick_best_worst_and_mean() {
        let rows = [row("AAPL", 4.94), row("MSFT", -2.5), row("NVDA", 10.0)];
        let insights = insights(&rows).unwrap();
        assert!((insights.average_return_pct - (4.94 - 2.5 + 10.0) / 3.0).abs() < 1e-12);
        assert_eq!(insights.best.stock, "NVDA");
        assert_eq!(insights.worst.stock, "MSFT");
        assert_eq!(insights.worst.return_pct, -2.5);
    }

    #[test]
    fn ties_go_to_first_row() {
        let rows = [row("A", 1.0), row("B", 1.0)];
        let insights = insights(&rows).unwrap();
        assert_eq!(insights.best.stock, "A");
        assert_eq!(insights.worst.stock, "A");
    }

    #[test]
    fn no_rows_no_insights() {
        assert_eq!(insights(&[]), None);
    }
}
