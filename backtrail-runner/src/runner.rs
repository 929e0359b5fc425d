//! Batch runner — loads each instrument, generates signals, and simulates.
//!
//! Two entry points:
//! - `run_instrument()`: one symbol against a bar source. Never fails the batch;
//!   problems come back as a `SkipReason`.
//! - `run_batch()`: every configured symbol on a rayon pool, merged back in
//!   configured order.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use rayon::prelude::*;

use backtrail_core::engine::{run_simulation, SimulationConfig, SimulationResult};
use backtrail_core::signals::{generate_signals, SignalCounts, StrategyConfig};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{dataset_hash, BarSource};
use crate::summary::{insights, Insights, SummaryRow};

/// Errors that stop a whole batch. Per-instrument problems are skips.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Why an instrument did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientData { bars: usize, required: usize },
    LoadFailed { reason: String },
    InvalidInput { reason: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData { bars, required } => {
                write!(f, "not enough data ({bars} bars, need {required})")
            }
            Self::LoadFailed { reason } => write!(f, "load failed: {reason}"),
            Self::InvalidInput { reason } => write!(f, "invalid input: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedInstrument {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Completed simulation for one instrument, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub symbol: String,
    pub bar_count: usize,
    pub dataset_hash: String,
    pub signal_counts: SignalCounts,
    pub result: SimulationResult,
}

/// Everything one batch produced, in configured symbol order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub strategy: StrategyConfig,
    pub source: String,
    pub completed: Vec<InstrumentReport>,
    pub skipped: Vec<SkippedInstrument>,
}

impl BatchReport {
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.completed
            .iter()
            .map(|report| SummaryRow::from_result(&report.result))
            .collect()
    }

    pub fn insights(&self) -> Option<Insights> {
        insights(&self.summary_rows())
    }

    pub fn get(&self, symbol: &str) -> Option<&InstrumentReport> {
        self.completed.iter().find(|r| r.symbol == symbol)
    }
}

/// Load, check eligibility, generate signals, and simulate one instrument.
pub fn run_instrument(
    symbol: &str,
    source: &dyn BarSource,
    strategy: &StrategyConfig,
    simulation: &SimulationConfig,
    min_bars: usize,
) -> Result<InstrumentReport, SkipReason> {
    let bars = source.fetch(symbol).map_err(|e| SkipReason::LoadFailed {
        reason: e.to_string(),
    })?;

    if bars.len() < min_bars {
        return Err(SkipReason::InsufficientData {
            bars: bars.len(),
            required: min_bars,
        });
    }

    let generator = strategy.build();
    let table = generate_signals(generator.as_ref(), &bars);
    let signal_bars = table.to_signal_bars(&bars);

    let result = run_simulation(symbol, &signal_bars, simulation).map_err(|e| {
        SkipReason::InvalidInput {
            reason: e.to_string(),
        }
    })?;

    Ok(InstrumentReport {
        symbol: symbol.to_string(),
        bar_count: bars.len(),
        dataset_hash: dataset_hash(&bars),
        signal_counts: table.counts(),
        result,
    })
}

/// Run every configured symbol.
///
/// The config is validated up front; after that, no instrument can fail the
/// batch. `output.threads > 0` runs on a dedicated pool of that size.
pub fn run_batch(config: &BacktestConfig, source: &dyn BarSource) -> Result<BatchReport, RunError> {
    let strategy = config.validate()?;
    let run_id = config.run_id()?;
    let simulation = &config.backtest.simulation;
    let min_bars = config.backtest.min_bars;

    info!(
        run_id = %run_id,
        strategy = %strategy,
        source = source.name(),
        symbols = config.backtest.symbols.len(),
        "starting batch"
    );

    let run_all = || -> Vec<(String, Result<InstrumentReport, SkipReason>)> {
        config
            .backtest
            .symbols
            .par_iter()
            .map(|symbol| {
                let outcome = run_instrument(symbol, source, &strategy, simulation, min_bars);
                (symbol.clone(), outcome)
            })
            .collect()
    };

    let outcomes = if config.output.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.output.threads)
            .build()?
            .install(run_all)
    } else {
        run_all()
    };

    let mut completed = Vec::new();
    let mut skipped = Vec::new();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(report) => completed.push(report),
            Err(reason) => {
                warn!(symbol = %symbol, %reason, "skipping instrument");
                skipped.push(SkippedInstrument { symbol, reason });
            }
        }
    }

    info!(
        completed = completed.len(),
        skipped = skipped.len(),
        "batch finished"
    );

    Ok(BatchReport {
        run_id,
        config: config.clone(),
        strategy,
        source: source.name().to_string(),
        completed,
        skipped,
    })
}
