//! Single-instrument bar loop.
//!
//! Each bar runs three phases in a fixed order against the state left by the
//! previous bar:
//!
//! 1. Entry: on Buy with no open position, size and buy at the close
//! 2. Ratchet: on a close above entry, raise the trailing stop
//! 3. Exit: on Sell, or a close at or below the stop, sell everything
//!
//! The next state is built from a copy and committed only once all three
//! phases have run. No forced liquidation happens after the last bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{ExitReason, PortfolioState, Position, Signal, Trade, TradeAction};

use super::config::{ConfigError, SimulationConfig};
use super::result::{BarSnapshot, SimulationResult};

/// One simulator input element: a bar's close and its precomputed signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalBar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub signal: Signal,
}

impl SignalBar {
    pub fn new(timestamp: DateTime<Utc>, close: f64, signal: Signal) -> Self {
        Self {
            timestamp,
            close,
            signal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("no bars to simulate")]
    EmptyInput,
    #[error("bar {index}: timestamp {current} is not after {previous}")]
    OutOfOrder {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),
}

/// Run the long-only trailing-stop simulation over one instrument's bars.
///
/// Fails only on invalid config, empty input, or timestamps that are not
/// strictly increasing; all of these are checked before the first bar. An
/// unaffordable entry is a silent no-op. Bars with a non-positive or
/// non-finite close are carried through as snapshots without trading.
pub fn run_simulation(
    symbol: &str,
    bars: &[SignalBar],
    config: &SimulationConfig,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;
    check_order(bars)?;

    let mut state = PortfolioState::new(config.starting_cash);
    let mut snapshots = Vec::with_capacity(bars.len());
    let mut last_close: Option<f64> = None;

    for (index, bar) in bars.iter().enumerate() {
        if is_tradable(bar.close) {
            let step = BarStep::plan(&state, bar, index, config);
            step.commit(&mut state, symbol);
            last_close = Some(bar.close);
        }

        let mark = last_close.unwrap_or(0.0);
        snapshots.push(BarSnapshot {
            timestamp: bar.timestamp,
            close: bar.close,
            cash: state.cash,
            shares: state.shares(),
            trailing_stop: state.stop_level(),
            equity: state.equity(mark),
        });
    }

    let last_close = last_close.unwrap_or(bars[bars.len() - 1].close);
    let portfolio_value = state.equity(last_close);
    let total_return_pct = (portfolio_value - config.starting_cash) / config.starting_cash * 100.0;
    let entries = state
        .trades
        .iter()
        .filter(|t| t.action == TradeAction::Buy)
        .count();

    info!(
        symbol,
        bars = bars.len(),
        sizing = config.sizing.name(),
        trades = state.trades.len(),
        end_value = portfolio_value,
        return_pct = total_return_pct,
        open = state.has_position(),
        "simulation finished"
    );

    Ok(SimulationResult {
        symbol: symbol.to_string(),
        trades: state.trades,
        snapshots,
        starting_cash: config.starting_cash,
        final_cash: state.cash,
        open_position: state.position,
        last_close,
        portfolio_value,
        total_return_pct,
        entries,
        total_commission: state.total_commission,
    })
}

fn check_order(bars: &[SignalBar]) -> Result<(), SimulationError> {
    if bars.is_empty() {
        return Err(SimulationError::EmptyInput);
    }
    match bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        Some(i) => Err(SimulationError::OutOfOrder {
            index: i + 1,
            previous: bars[i].timestamp,
            current: bars[i + 1].timestamp,
        }),
        None => Ok(()),
    }
}

fn is_tradable(close: f64) -> bool {
    close.is_finite() && close > 0.0
}

/// Next state for one bar, computed against a copy of the current state.
struct BarStep {
    cash: f64,
    position: Option<Position>,
    fills: Vec<Trade>,
    commission: f64,
    /// Gross profit of an exit on this bar.
    realized: Option<f64>,
}

impl BarStep {
    fn plan(state: &PortfolioState, bar: &SignalBar, index: usize, config: &SimulationConfig) -> Self {
        let mut cash = state.cash;
        let mut position = state.position.clone();
        let mut fills = Vec::new();
        let mut commission = 0.0;
        let mut realized = None;

        if position.is_none() && bar.signal == Signal::Buy {
            let shares = config
                .sizing
                .quantity(cash, bar.close, config.commission);
            let cost = shares as f64 * bar.close + config.commission;
            if shares > 0 && cost <= cash {
                cash -= cost;
                commission += config.commission;
                position = Some(Position::open(
                    shares,
                    bar.close,
                    bar.timestamp,
                    index,
                    config.trailing_stop_pct,
                ));
                fills.push(Trade::buy(bar.timestamp, index, bar.close, shares));
            }
        }

        if let Some(pos) = position.as_mut() {
            pos.ratchet_stop(bar.close);
        }

        let reason = position.as_ref().and_then(|pos| exit_reason(pos, bar));
        if let (Some(reason), Some(pos)) = (reason, position.as_ref()) {
            cash += pos.market_value(bar.close);
            realized = Some(pos.unrealized_pnl(bar.close));
            fills.push(Trade::sell(
                bar.timestamp,
                index,
                bar.close,
                pos.shares,
                reason,
            ));
            position = None;
        }

        Self {
            cash,
            position,
            fills,
            commission,
            realized,
        }
    }

    fn commit(self, state: &mut PortfolioState, symbol: &str) {
        for fill in &self.fills {
            match fill.action {
                TradeAction::Buy => debug!(
                    symbol,
                    shares = fill.shares,
                    price = fill.price,
                    at = %fill.timestamp,
                    "BUY"
                ),
                TradeAction::Sell => debug!(
                    symbol,
                    shares = fill.shares,
                    price = fill.price,
                    at = %fill.timestamp,
                    reason = %fill.exit_reason.map_or_else(String::new, |r| r.to_string()),
                    profit = self.realized.unwrap_or(0.0),
                    "SELL"
                ),
            }
        }

        state.cash = self.cash;
        state.position = self.position;
        state.total_commission += self.commission;
        state.trades.extend(self.fills);
    }
}

fn exit_reason(position: &Position, bar: &SignalBar) -> Option<ExitReason> {
    if bar.signal == Signal::Sell {
        Some(ExitReason::SellSignal)
    } else if position.trailing_stop.is_hit(bar.close) {
        Some(ExitReason::TrailingStop {
            stop: position.stop_level(),
        })
    } else {
        None
    }
}
