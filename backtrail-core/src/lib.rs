//! backtrail core — domain types, indicators, signal generators, and the
//! trailing-stop simulator.
//!
//! This crate is pure computation:
//! - Domain types (bars, signals, trades, positions, portfolio state)
//! - Indicators precomputed over a bar series (SMA, RSI, Bollinger bands)
//! - Signal generators that map bars and indicators to Buy/Hold/Sell
//! - The long-only simulator with a ratcheting trailing stop
//!
//! Loading data, running many instruments, and writing artifacts live in
//! `backtrail-runner`.

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;

pub use domain::{PriceBar, Signal, Trade, TradeAction};
pub use engine::{run_simulation, SignalBar, SimulationConfig, SimulationResult};
pub use signals::{generate_signals, StrategyConfig};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across the runner's worker threads
    /// are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::PortfolioState>();
        require_sync::<domain::PortfolioState>();

        require_send::<indicators::IndicatorValues>();
        require_sync::<indicators::IndicatorValues>();
        require_send::<Box<dyn indicators::Indicator>>();
        require_sync::<Box<dyn indicators::Indicator>>();

        require_send::<signals::StrategyConfig>();
        require_sync::<signals::StrategyConfig>();
        require_send::<Box<dyn signals::SignalGenerator>>();
        require_sync::<Box<dyn signals::SignalGenerator>>();

        require_send::<engine::SimulationConfig>();
        require_sync::<engine::SimulationConfig>();
        require_send::<engine::SimulationResult>();
        require_sync::<engine::SimulationResult>();
    }

    /// Architecture contract: signal generators never see portfolio state.
    ///
    /// `evaluate()` takes bars, an index, and indicator values only. Adding a
    /// portfolio parameter changes the trait and breaks this function.
    #[test]
    fn signal_generator_trait_has_no_portfolio_parameter() {
        fn _check_trait_object_builds(
            generator: &dyn signals::SignalGenerator,
            bars: &[domain::PriceBar],
            indicators: &indicators::IndicatorValues,
        ) -> Signal {
            generator.evaluate(bars, 0, indicators)
        }
    }

    /// Architecture contract: the simulator takes precomputed signals, not a
    /// generator, so it cannot recompute them.
    #[test]
    fn simulator_takes_opaque_signals() {
        fn _check(
            bars: &[SignalBar],
            config: &SimulationConfig,
        ) -> Result<SimulationResult, engine::SimulationError> {
            run_simulation("X", bars, config)
        }
    }
}
