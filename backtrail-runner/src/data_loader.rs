//! Bar sources for the runner.
//!
//! A `BarSource` turns a symbol into an ordered bar series:
//! - `CsvBarSource` reads `<dir>/<SYMBOL>.csv`
//! - `SyntheticBarSource` generates a deterministic random walk per symbol
//!
//! Both return bars sorted by timestamp with unique timestamps and a usable
//! close, trimmed to the most recent `limit` bars. Synthetic data is a
//! developer mode for offline runs; its results are not market results.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use backtrail_core::domain::PriceBar;

use crate::config::{DataSection, DataSourceKind};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{symbol}' at {}", path.display())]
    NotFound { symbol: String, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} row {row}: unrecognized timestamp '{value}'", path.display())]
    Timestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("no usable bars for '{symbol}'")]
    Empty { symbol: String },
}

/// Source of historical bars for one symbol at a time.
pub trait BarSource: Send + Sync {
    /// Source label for logs and manifests (e.g., "csv").
    fn name(&self) -> &str;

    /// Bars for `symbol`, oldest first.
    fn fetch(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError>;
}

/// Build the source a config's `[data]` section describes.
pub fn source_from_config(data: &DataSection) -> Box<dyn BarSource> {
    match data.source {
        DataSourceKind::Csv => Box::new(CsvBarSource::new(&data.dir).with_limit(data.limit)),
        DataSourceKind::Synthetic => {
            Box::new(SyntheticBarSource::new(data.start, data.end).with_limit(data.limit))
        }
    }
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Reads `<dir>/<SYMBOL>.csv` with a header row.
///
/// Recognized columns (case-insensitive): `timestamp` or `date`, `open`,
/// `high`, `low`, `close`, `volume`. Only the timestamp and close are
/// required; missing OHLV values fall back to the close and 0.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    dir: PathBuf,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "datetime", alias = "time")]
    timestamp: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    /// Required column. Blank or unparsable cells reject only that row.
    #[serde(deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

impl CsvBarSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            limit: 0,
        }
    }

    /// Keep only the most recent `limit` bars. 0 keeps everything.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read(&self, symbol: &str, path: &Path) -> Result<Vec<PriceBar>, LoadError> {
        let csv_err = |source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let headers: csv::StringRecord = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();
        reader.set_headers(headers);

        let mut bars = Vec::new();
        let mut rejected = 0usize;
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(csv_err)?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
                path: path.to_path_buf(),
                row: i + 1,
                value: row.timestamp.clone(),
            })?;

            let Some(close) = row.close else {
                rejected += 1;
                continue;
            };

            let bar = PriceBar {
                symbol: symbol.to_string(),
                timestamp,
                open: row.open.unwrap_or(close),
                high: row.high.unwrap_or(close),
                low: row.low.unwrap_or(close),
                close,
                volume: row.volume.map_or(0, |v| v.max(0.0).round() as u64),
            };
            if bar.has_valid_close() {
                bars.push(bar);
            } else {
                rejected += 1;
            }
        }

        if rejected > 0 {
            warn!(symbol, rejected, "dropped rows with a missing, non-positive or non-finite close");
        }
        Ok(bars)
    }
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(LoadError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }

        let bars = normalize(self.read(symbol, &path)?, self.limit);
        if bars.is_empty() {
            return Err(LoadError::Empty {
                symbol: symbol.to_string(),
            });
        }
        debug!(symbol, bars = bars.len(), path = %path.display(), "loaded csv bars");
        Ok(bars)
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[±HH:MM]`, and `YYYY-MM-DD`.
/// Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Sort by timestamp, keep the last row for each timestamp, then trim to
/// the most recent `limit` bars (0 keeps everything).
pub fn normalize(mut bars: Vec<PriceBar>, limit: usize) -> Vec<PriceBar> {
    // Stable sort keeps file order among equal timestamps, so the later row wins.
    bars.sort_by_key(|b| b.timestamp);

    let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => deduped.push(bar),
        }
    }

    if limit > 0 && deduped.len() > limit {
        deduped.drain(..deduped.len() - limit);
    }
    deduped
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random-walk bars, seeded from the symbol name.
///
/// Weekday-only daily bars starting at 100.0 with daily returns drawn from
/// ±3%. The same symbol and date range always produce the same series.
#[derive(Debug, Clone)]
pub struct SyntheticBarSource {
    start: NaiveDate,
    end: NaiveDate,
    limit: usize,
}

impl SyntheticBarSource {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            limit: 0,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn generate(&self, symbol: &str) -> Vec<PriceBar> {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = 100.0_f64;

        for day in self.start.iter_days().take_while(|d| *d <= self.end) {
            if matches!(day.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
                continue;
            }
            let Some(midnight) = day.and_hms_opt(0, 0, 0) else {
                continue;
            };

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(PriceBar {
                symbol: symbol.to_string(),
                timestamp: Utc.from_utc_datetime(&midnight),
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }

        bars
    }
}

impl BarSource for SyntheticBarSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
        let bars = normalize(self.generate(symbol), self.limit);
        if bars.is_empty() {
            return Err(LoadError::Empty {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }
}

/// Deterministic BLAKE3 hash over a bar series (timestamps and OHLCV).
pub fn dataset_hash(bars: &[PriceBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.timestamp.to_rfc3339().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
