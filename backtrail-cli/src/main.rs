//! Backtrail CLI — batch backtests, signal inspection, and config checks.
//!
//! Commands:
//! - `run` — execute a batch from a TOML config file and/or flags, write artifacts
//! - `signals` — print the tail of one symbol's indicator and signal columns
//! - `validate` — parse and validate a config file, print its run id
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backtrail_core::signals::{generate_signals, StrategySpec};
use backtrail_runner::{
    run_batch, save_artifacts, source_from_config, BacktestConfig, BatchReport, DataSourceKind,
};

#[derive(Parser)]
#[command(
    name = "backtrail",
    about = "Backtrail — signal-driven trailing-stop backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch backtest and write CSV/JSON artifacts.
    Run {
        /// Path to a TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbols to run (comma-separated). Required without --config.
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        simulation: SimulationArgs,

        /// Output directory for artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Worker threads (0 = one per core).
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print the last rows of one symbol's close, indicator, and signal columns.
    Signals {
        /// Symbol to inspect.
        #[arg(long)]
        symbol: String,

        /// Number of trailing rows to print.
        #[arg(long, default_value_t = 20)]
        rows: usize,

        /// Optional TOML config supplying data and strategy settings.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Parse and validate a config file, then print its run id.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}

/// Data and strategy selection shared by `run` and `signals`.
#[derive(Args)]
struct SourceArgs {
    /// Strategy: moving_average, rsi_ma, bollinger.
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameter as key=value (repeatable), e.g. --param short_window=5.
    #[arg(long = "param")]
    params: Vec<String>,

    /// Directory holding <SYMBOL>.csv files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use the seeded synthetic generator instead of CSV files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Keep only the most recent N bars (0 = all).
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct SimulationArgs {
    #[arg(long)]
    starting_cash: Option<f64>,

    /// Flat fee charged per entry.
    #[arg(long)]
    commission: Option<f64>,

    /// Trailing stop fraction, e.g. 0.10 for 10%.
    #[arg(long)]
    trailing_stop: Option<f64>,

    /// Skip instruments with fewer bars.
    #[arg(long)]
    min_bars: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            symbols,
            source,
            simulation,
            output_dir,
            threads,
        } => {
            let mut config = base_config(config, symbols)?;
            source.apply(&mut config)?;
            simulation.apply(&mut config);
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if let Some(threads) = threads {
                config.output.threads = threads;
            }
            run_cmd(&config)
        }
        Commands::Signals {
            symbol,
            rows,
            config,
            source,
        } => {
            let mut config = match config {
                Some(path) => {
                    let mut config = BacktestConfig::from_file(&path)?;
                    config.backtest.symbols = vec![symbol.clone()];
                    config
                }
                None => BacktestConfig::for_symbols([symbol.clone()]),
            };
            source.apply(&mut config)?;
            signals_cmd(&config, &symbol, rows)
        }
        Commands::Validate { config } => validate_cmd(config),
    }
}

fn base_config(path: Option<PathBuf>, symbols: Vec<String>) -> Result<BacktestConfig> {
    match path {
        Some(path) => {
            let mut config = BacktestConfig::from_file(&path)?;
            if !symbols.is_empty() {
                config.backtest.symbols = symbols;
            }
            Ok(config)
        }
        None if symbols.is_empty() => bail!("one of --config or --symbols is required"),
        None => Ok(BacktestConfig::for_symbols(symbols)),
    }
}

impl SourceArgs {
    fn apply(&self, config: &mut BacktestConfig) -> Result<()> {
        if let Some(name) = &self.strategy {
            // A new strategy name starts from its own defaults.
            if *name != config.strategy.name {
                config.strategy = StrategySpec::named(name.as_str());
            }
        }
        for param in &self.params {
            let (key, value) = param
                .split_once('=')
                .with_context(|| format!("--param '{param}' is not key=value"))?;
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("--param '{param}' has a non-numeric value"))?;
            config.strategy.params.insert(key.trim().to_string(), value);
        }
        if let Some(dir) = &self.data_dir {
            config.data.dir = dir.clone();
            config.data.source = DataSourceKind::Csv;
        }
        if self.synthetic {
            config.data.source = DataSourceKind::Synthetic;
        }
        if let Some(limit) = self.limit {
            config.data.limit = limit;
        }
        Ok(())
    }
}

impl SimulationArgs {
    fn apply(&self, config: &mut BacktestConfig) {
        let sim = &mut config.backtest.simulation;
        if let Some(cash) = self.starting_cash {
            sim.starting_cash = cash;
        }
        if let Some(commission) = self.commission {
            sim.commission = commission;
        }
        if let Some(pct) = self.trailing_stop {
            sim.trailing_stop_pct = pct;
        }
        if let Some(min_bars) = self.min_bars {
            config.backtest.min_bars = min_bars;
        }
    }
}

fn run_cmd(config: &BacktestConfig) -> Result<()> {
    let source = source_from_config(&config.data);
    let report = run_batch(config, source.as_ref())?;

    print_summary(&report);

    let written = save_artifacts(&report, &config.output.dir)?;
    println!(
        "Artifacts saved to: {} ({} files)",
        config.output.dir.display(),
        written.len()
    );
    Ok(())
}

fn signals_cmd(config: &BacktestConfig, symbol: &str, rows: usize) -> Result<()> {
    let strategy = config.validate()?;
    let source = source_from_config(&config.data);
    let bars = source
        .fetch(symbol)
        .with_context(|| format!("failed to load bars for {symbol}"))?;

    let generator = strategy.build();
    let table = generate_signals(generator.as_ref(), &bars);
    let names = table.indicators.names();

    println!("Strategy: {strategy}   Source: {}   Bars: {}", source.name(), bars.len());
    println!();

    let mut header = format!("{:<12} {:>10}", "Date", "Close");
    for name in names {
        header.push_str(&format!(" {name:>12}"));
    }
    header.push_str(&format!(" {:>7}", "Signal"));
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    let start = bars.len().saturating_sub(rows);
    for i in start..bars.len() {
        let mut line = format!(
            "{:<12} {:>10.2}",
            bars[i].timestamp.format("%Y-%m-%d"),
            bars[i].close
        );
        for name in names {
            match table.indicators.get(name, i).filter(|v| !v.is_nan()) {
                Some(v) => line.push_str(&format!(" {v:>12.4}")),
                None => line.push_str(&format!(" {:>12}", "NaN")),
            }
        }
        line.push_str(&format!(" {:>7}", table.signals[i]));
        println!("{line}");
    }

    let counts = table.counts();
    println!();
    println!("Signal counts:");
    println!("   1 (buy):  {}", counts.buy);
    println!("   0 (hold): {}", counts.hold);
    println!("  -1 (sell): {}", counts.sell);
    Ok(())
}

fn validate_cmd(path: PathBuf) -> Result<()> {
    let config = BacktestConfig::from_file(&path)?;
    let strategy = config.validate()?;
    let run_id = config.run_id()?;

    println!("Config OK: {}", path.display());
    println!("Symbols:   {}", config.backtest.symbols.join(", "));
    println!("Strategy:  {strategy}");
    println!("Run ID:    {run_id}");
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("=== Backtest Summary ===");
    println!("Run ID:   {}", report.run_id);
    println!("Strategy: {}   Source: {}", report.strategy, report.source);
    println!();

    let rows = report.summary_rows();
    println!(
        "{:<10} {:>12} {:>18} {:>22}",
        "Stock", "Total Trades", "Total Return (%)", "Final Portfolio Value"
    );
    println!("{}", "-".repeat(65));
    for row in &rows {
        println!(
            "{:<10} {:>12} {:>18.2} {:>22.2}",
            row.stock, row.total_trades, row.total_return_pct, row.final_portfolio_value
        );
    }

    if let Some(insights) = report.insights() {
        println!();
        println!("--- Insights ---");
        println!("Average Return:   {:.2}%", insights.average_return_pct);
        println!(
            "Best Performer:   {} ({:.2}%)",
            insights.best.stock, insights.best.return_pct
        );
        println!(
            "Worst Performer:  {} ({:.2}%)",
            insights.worst.stock, insights.worst.return_pct
        );
    }

    if !report.skipped.is_empty() {
        println!();
        for skipped in &report.skipped {
            println!("SKIPPED: {} — {}", skipped.symbol, skipped.reason);
        }
    }
    if report.source == "synthetic" {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
