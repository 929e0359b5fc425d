//! Integration tests for batch runs: data sources, eligibility, skip
//! isolation, and parallel determinism.

use std::fs;
use std::path::Path;

use backtrail_core::domain::TradeAction;
use backtrail_core::signals::StrategySpec;
use backtrail_runner::{
    run_batch, source_from_config, BacktestConfig, CsvBarSource, DataSourceKind, SkipReason,
    SyntheticBarSource,
};
use chrono::NaiveDate;

const TREND_CSV: &str = "\
Date,Open,High,Low,Close,Volume
2024-01-02,10,10,10,10,1000
2024-01-03,10,10,10,10,1000
2024-01-04,10,10,10,10,1000
2024-01-05,12,12,12,12,1000
2024-01-08,14,14,14,14,1000
2024-01-09,13,13,13,13,1000
2024-01-10,11,11,11,11,1000
2024-01-11,9,9,9,9,1000
";

fn write_csv(dir: &Path, symbol: &str, body: &str) {
    fs::write(dir.join(format!("{symbol}.csv")), body).unwrap();
}

fn synthetic_config(symbols: &[&str]) -> BacktestConfig {
    let mut config = BacktestConfig::for_symbols(symbols.iter().copied());
    config.data.source = DataSourceKind::Synthetic;
    config
}

fn csv_config(dir: &Path, symbols: &[&str]) -> BacktestConfig {
    let mut config = BacktestConfig::for_symbols(symbols.iter().copied());
    config.data.dir = dir.to_path_buf();
    config.backtest.min_bars = 5;
    config.backtest.simulation.starting_cash = 1000.0;
    config.backtest.simulation.trailing_stop_pct = 0.5;
    config.strategy = StrategySpec::named("moving_average")
        .with_param("short_window", 2.0)
        .with_param("long_window", 3.0);
    config
}

// ── 1. Synthetic batch ──────────────────────────────────────────────

#[test]
fn synthetic_batch_completes_every_symbol_in_order() {
    let config = synthetic_config(&["NVDA", "AAPL", "MSFT"]);
    let source = source_from_config(&config.data);
    let report = run_batch(&config, source.as_ref()).unwrap();

    assert_eq!(report.source, "synthetic");
    assert!(report.skipped.is_empty());
    let symbols: Vec<&str> = report.completed.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, ["NVDA", "AAPL", "MSFT"]);

    for instrument in &report.completed {
        assert_eq!(instrument.bar_count, 365);
        assert_eq!(instrument.result.snapshots.len(), 365);
        let counts = instrument.signal_counts;
        assert_eq!(counts.buy + counts.hold + counts.sell, 365);
        assert_eq!(instrument.dataset_hash.len(), 64);
    }

    let rows = report.summary_rows();
    assert_eq!(rows.len(), 3);
    assert!(report.insights().is_some());
}

#[test]
fn trade_logs_alternate_and_start_with_buy() {
    let config = synthetic_config(&["AAPL", "TSLA"]);
    let report = run_batch(&config, source_from_config(&config.data).as_ref()).unwrap();

    for instrument in &report.completed {
        for (i, trade) in instrument.result.trades.iter().enumerate() {
            let expected = if i % 2 == 0 {
                TradeAction::Buy
            } else {
                TradeAction::Sell
            };
            assert_eq!(trade.action, expected, "{} trade {i}", instrument.symbol);
        }
    }
}

// ── 2. Determinism ──────────────────────────────────────────────────

#[test]
fn thread_count_does_not_change_results() {
    let symbols = ["AAPL", "MSFT", "NVDA", "TSLA", "AMZN", "GOOG"];

    let mut single = synthetic_config(&symbols);
    single.output.threads = 1;
    let mut wide = synthetic_config(&symbols);
    wide.output.threads = 4;

    let a = run_batch(&single, source_from_config(&single.data).as_ref()).unwrap();
    let b = run_batch(&wide, source_from_config(&wide.data).as_ref()).unwrap();

    assert_eq!(a.completed, b.completed);
    assert_eq!(a.summary_rows(), b.summary_rows());
}

#[test]
fn repeated_runs_share_run_id_and_results() {
    let config = synthetic_config(&["AAPL"]);
    let a = run_batch(&config, source_from_config(&config.data).as_ref()).unwrap();
    let b = run_batch(&config, source_from_config(&config.data).as_ref()).unwrap();
    assert_eq!(a, b);
}

// ── 3. Skips ────────────────────────────────────────────────────────

#[test]
fn short_history_is_skipped_not_failed() {
    let mut config = synthetic_config(&["AAPL", "MSFT"]);
    config.backtest.min_bars = 1000;
    let report = run_batch(&config, source_from_config(&config.data).as_ref()).unwrap();

    assert!(report.completed.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::InsufficientData {
            bars: 365,
            required: 1000
        }
    );
    assert!(report.insights().is_none());
}

#[test]
fn missing_file_skips_only_that_symbol() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "GOOD", TREND_CSV);

    let config = csv_config(dir.path(), &["MISSING", "GOOD"]);
    let source = CsvBarSource::new(dir.path());
    let report = run_batch(&config, &source).unwrap();

    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].symbol, "GOOD");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].symbol, "MISSING");
    assert!(matches!(
        report.skipped[0].reason,
        SkipReason::LoadFailed { .. }
    ));
}

#[test]
fn invalid_config_fails_before_any_instrument() {
    let mut config = synthetic_config(&["AAPL"]);
    config.backtest.simulation.starting_cash = -5.0;
    assert!(run_batch(&config, &SyntheticBarSource::new(day(2), day(31))).is_err());

    let mut config = synthetic_config(&["AAPL"]);
    config.strategy = StrategySpec::named("moving_average").with_param("long_window", 5.0);
    assert!(run_batch(&config, &SyntheticBarSource::new(day(2), day(31))).is_err());
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

// ── 4. Hand-checked CSV run ─────────────────────────────────────────

#[test]
fn csv_trend_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "TREND", TREND_CSV);

    let config = csv_config(dir.path(), &["TREND"]);
    let report = run_batch(&config, &CsvBarSource::new(dir.path())).unwrap();
    let instrument = report.get("TREND").unwrap();
    let result = &instrument.result;

    // SMA(2) crosses above SMA(3) on the 12.0 bar, below on the 11.0 bar.
    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[0].action, TradeAction::Buy);
    assert_eq!(result.trades[0].price, 12.0);
    assert_eq!(result.trades[0].shares, 83);
    assert_eq!(result.trades[1].action, TradeAction::Sell);
    assert_eq!(result.trades[1].price, 11.0);
    assert_eq!(result.trades[1].shares, 83);

    assert!((result.final_cash - 916.0).abs() < 1e-9);
    assert!((result.realized_profit() + 83.0).abs() < 1e-9);
    assert!(result.open_position.is_none());

    let row = &report.summary_rows()[0];
    assert_eq!(row.total_trades, 1);
    assert_eq!(row.total_return_pct, -8.4);
    assert_eq!(row.final_portfolio_value, 916.0);
}
