//! Batch configuration loaded from TOML.
//!
//! ```toml
//! [backtest]
//! symbols = ["AAPL", "MSFT"]
//! starting_cash = 10000.0
//! commission = 1.0
//! trailing_stop_pct = 0.10
//! min_bars = 50
//! sizing = { type = "all_in" }
//!
//! [strategy]
//! type = "rsi_ma"
//!
//! [strategy.params]
//! short_window = 10
//! long_window = 50
//! rsi_period = 14
//!
//! [data]
//! source = "csv"
//! dir = "data"
//! limit = 365
//!
//! [output]
//! dir = "backtest_results"
//! threads = 0
//! ```
//!
//! Only `backtest.symbols` is required.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use backtrail_core::engine::{self, SimulationConfig};
use backtrail_core::signals::{StrategyConfig, StrategyError, StrategySpec};

/// Content hash identifying a batch configuration.
pub type RunId = String;

/// Default instrument eligibility floor, in bars.
pub const DEFAULT_MIN_BARS: usize = 50;

/// Default number of most recent bars kept per instrument.
pub const DEFAULT_LIMIT: usize = 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("backtest.symbols is empty")]
    NoSymbols,
    #[error("backtest.symbols contains a blank entry")]
    BlankSymbol,
    #[error("backtest.symbols entry '{0}' cannot be used as a file name")]
    UnsafeSymbol(String),
    #[error("backtest.symbols lists '{0}' more than once")]
    DuplicateSymbol(String),
    #[error("data.start {start} is after data.end {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Simulation(#[from] engine::ConfigError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level batch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategySpec,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbols: Vec<String>,
    /// Instruments with fewer bars are skipped.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,
    #[serde(flatten)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    #[default]
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub source: DataSourceKind,
    /// CSV source: bars are read from `<dir>/<SYMBOL>.csv`.
    pub dir: PathBuf,
    /// Keep the most recent N bars. 0 keeps everything.
    pub limit: usize,
    /// Synthetic source: first calendar day generated.
    pub start: NaiveDate,
    /// Synthetic source: last calendar day generated.
    pub end: NaiveDate,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Csv,
            dir: PathBuf::from("data"),
            limit: DEFAULT_LIMIT,
            start: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    /// Worker threads for the instrument pool. 0 uses the rayon default.
    pub threads: usize,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("backtest_results"),
            threads: 0,
        }
    }
}

/// Symbols name `<SYMBOL>.csv` inputs and `<SYMBOL>_trades.csv` outputs, so
/// they must stay a single path component.
fn is_file_safe(symbol: &str) -> bool {
    !symbol.contains(['/', '\\', '\0']) && symbol != "." && symbol != ".."
}

fn default_min_bars() -> usize {
    DEFAULT_MIN_BARS
}

impl BacktestConfig {
    /// Config for `symbols` with every other field at its default.
    pub fn for_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            backtest: BacktestSection {
                symbols: symbols.into_iter().map(Into::into).collect(),
                min_bars: DEFAULT_MIN_BARS,
                simulation: SimulationConfig::default(),
            },
            strategy: StrategySpec::default(),
            data: DataSection::default(),
            output: OutputSection::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Surface every configuration error before any instrument runs.
    ///
    /// Returns the resolved strategy on success.
    pub fn validate(&self) -> Result<StrategyConfig, ConfigError> {
        let symbols = &self.backtest.symbols;
        if symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for symbol in symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::BlankSymbol);
            }
            if !is_file_safe(symbol) {
                return Err(ConfigError::UnsafeSymbol(symbol.clone()));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(symbol.clone()));
            }
        }

        self.backtest.simulation.validate()?;

        if self.data.source == DataSourceKind::Synthetic && self.data.start > self.data.end {
            return Err(ConfigError::DateRange {
                start: self.data.start,
                end: self.data.end,
            });
        }

        Ok(StrategyConfig::from_spec(&self.strategy)?)
    }

    /// Deterministic BLAKE3 hash of the serialized config.
    ///
    /// Two batches with identical configs share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
