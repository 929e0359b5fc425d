//! Backtest engine — the single-instrument simulator and its configuration.
//!
//! The engine consumes `SignalBar`s (close plus a precomputed signal) and
//! folds them, in timestamp order, into a `PortfolioState`. It never computes
//! signals itself and performs no I/O.

pub mod config;
pub mod result;
pub mod simulator;
pub mod sizing;

pub use config::{ConfigError, SimulationConfig};
pub use result::{BarSnapshot, SimulationResult};
pub use simulator::{run_simulation, SignalBar, SimulationError};
pub use sizing::PositionSizing;
