//! Backtrail Runner — batch orchestration on top of `backtrail-core`.
//!
//! This crate provides:
//! - TOML batch configuration with up-front validation and a content-hash run id
//! - Bar sources: per-symbol CSV files and a seeded synthetic generator
//! - Per-instrument runs fanned out over rayon, with skip-not-fail semantics
//! - Summary rows, cross-instrument insights, and CSV/JSON artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod summary;

pub use config::{BacktestConfig, ConfigError, DataSourceKind, RunId};
pub use data_loader::{
    dataset_hash, source_from_config, BarSource, CsvBarSource, LoadError, SyntheticBarSource,
};
pub use export::{load_manifest, save_artifacts, Manifest, SCHEMA_VERSION};
pub use runner::{
    run_batch, run_instrument, BatchReport, InstrumentReport, RunError, SkipReason,
    SkippedInstrument,
};
pub use summary::{insights, Insights, SummaryRow};
