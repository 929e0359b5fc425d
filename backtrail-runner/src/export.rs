//! Artifact export — per-instrument trade logs, the batch summary, and a
//! JSON manifest.
//!
//! Layout under the output directory:
//! - `<SYMBOL>_trades.csv` — columns `Action,Date,Price,Shares`
//! - `backtest_summary.csv` — columns `Stock,Total Trades,Total Return (%),Final Portfolio Value`
//! - `manifest.json` — run id, config, summary, insights, and skipped instruments
//!
//! The manifest carries a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use backtrail_core::domain::{Position, Trade};

use crate::config::{BacktestConfig, RunId};
use crate::runner::{BatchReport, InstrumentReport, SkippedInstrument};
use crate::summary::{Insights, SummaryRow};

/// Current schema version for persisted manifests.
pub const SCHEMA_VERSION: u32 = 1;

pub const TRADE_COLUMNS: [&str; 4] = ["Action", "Date", "Price", "Shares"];
pub const SUMMARY_COLUMNS: [&str; 4] = [
    "Stock",
    "Total Trades",
    "Total Return (%)",
    "Final Portfolio Value",
];
pub const SUMMARY_FILE: &str = "backtest_summary.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

pub fn trades_file_name(symbol: &str) -> String {
    format!("{symbol}_trades.csv")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade log as CSV. Dates are written as `YYYY-MM-DD HH:MM:SS+00:00`.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRADE_COLUMNS)?;

    for t in trades {
        wtr.write_record([
            t.action.as_str().to_string(),
            t.timestamp.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
            decimal(t.price),
            t.shares.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Batch summary as CSV. The header is written even with no rows.
pub fn export_summary_csv(rows: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(SUMMARY_COLUMNS)?;

    for row in rows {
        wtr.write_record([
            row.stock.clone(),
            row.total_trades.to_string(),
            decimal(row.total_return_pct),
            decimal(row.final_portfolio_value),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Shortest round-trip form, always with a fractional part (`100.0`, not `100`).
fn decimal(value: f64) -> String {
    format!("{value:?}")
}

// ─── Manifest ───────────────────────────────────────────────────────

/// Per-instrument detail recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestInstrument {
    pub symbol: String,
    pub bar_count: usize,
    pub dataset_hash: String,
    pub entries: usize,
    pub total_commission: f64,
    /// Profit summed over closed round trips, before commission.
    pub realized_profit: f64,
    pub portfolio_value: f64,
    pub max_drawdown_pct: f64,
    pub win_rate: Option<f64>,
    pub open_position: Option<Position>,
    pub trades_file: String,
}

impl ManifestInstrument {
    fn from_report(report: &InstrumentReport) -> Self {
        let result = &report.result;
        Self {
            symbol: report.symbol.clone(),
            bar_count: report.bar_count,
            dataset_hash: report.dataset_hash.clone(),
            entries: result.entries,
            total_commission: result.total_commission,
            realized_profit: result.realized_profit(),
            portfolio_value: result.portfolio_value,
            max_drawdown_pct: result.max_drawdown_pct(),
            win_rate: result.win_rate(),
            open_position: result.open_position.clone(),
            trades_file: trades_file_name(&report.symbol),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub source: String,
    pub summary: Vec<SummaryRow>,
    pub insights: Option<Insights>,
    pub instruments: Vec<ManifestInstrument>,
    pub skipped: Vec<SkippedInstrument>,
}

impl Manifest {
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: report.run_id.clone(),
            config: report.config.clone(),
            source: report.source.clone(),
            summary: report.summary_rows(),
            insights: report.insights(),
            instruments: report
                .completed
                .iter()
                .map(ManifestInstrument::from_report)
                .collect(),
            skipped: report.skipped.clone(),
        }
    }
}

pub fn export_manifest_json(manifest: &Manifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize manifest to JSON")
}

/// Parse a manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_json::from_str(json).context("failed to deserialize manifest JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set for a batch into `output_dir`, creating it if
/// needed. Existing files with the same names are overwritten.
///
/// Returns the paths written.
pub fn save_artifacts(report: &BatchReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(report.completed.len() + 2);

    for instrument in &report.completed {
        let path = output_dir.join(trades_file_name(&instrument.symbol));
        let csv = export_trades_csv(&instrument.result.trades)?;
        write_file(&path, &csv)?;
        written.push(path);
    }

    let summary_path = output_dir.join(SUMMARY_FILE);
    write_file(&summary_path, &export_summary_csv(&report.summary_rows())?)?;
    written.push(summary_path);

    let manifest_path = output_dir.join(MANIFEST_FILE);
    let json = export_manifest_json(&Manifest::from_report(report))?;
    write_file(&manifest_path, &json)?;
    written.push(manifest_path);

    Ok(written)
}

/// Load the manifest from an artifact directory.
pub fn load_manifest(dir: &Path) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_manifest_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
