//! Simulation configuration, fixed for the duration of a run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sizing::PositionSizing;

/// Configuration errors, raised before the first bar is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("starting_cash must be positive and finite, got {0}")]
    StartingCash(f64),
    #[error("commission must be non-negative and finite, got {0}")]
    Commission(f64),
    #[error("trailing_stop_pct must be in [0, 1), got {0}")]
    TrailingStopPct(f64),
    #[error("fixed_shares sizing needs shares >= 1")]
    FixedShares,
}

/// Immutable per-run settings passed to the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub starting_cash: f64,
    /// Flat fee charged on each entry. Exits are free.
    pub commission: f64,
    /// Fraction below the reference price at which the stop sits.
    pub trailing_stop_pct: f64,
    pub sizing: PositionSizing,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            starting_cash: 10_000.0,
            commission: 1.0,
            trailing_stop_pct: 0.10,
            sizing: PositionSizing::AllIn,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.starting_cash.is_finite() && self.starting_cash > 0.0) {
            return Err(ConfigError::StartingCash(self.starting_cash));
        }
        if !(self.commission.is_finite() && self.commission >= 0.0) {
            return Err(ConfigError::Commission(self.commission));
        }
        if !(0.0..1.0).contains(&self.trailing_stop_pct) {
            return Err(ConfigError::TrailingStopPct(self.trailing_stop_pct));
        }
        if self.sizing == (PositionSizing::FixedShares { shares: 0 }) {
            return Err(ConfigError::FixedShares);
        }
        Ok(())
    }
}
