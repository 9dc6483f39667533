//! SwingScan CLI — weekly swing-setup screen over an exchange universe.
//!
//! Commands:
//! - `scan`: screen a universe and save the ranked setups
//! - `evaluate`: screen a few symbols and print each verdict
//! - `show`: filter and print the newest saved scan
//! - `thresholds`: print the default configuration as TOML

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swingscan_core::data::{
    CircuitBreaker, CsvDirProvider, DataProvider, FileUniverse, NseUniverseProvider,
    SyntheticProvider, ThrottledProvider, UniverseProvider, YahooProvider,
};
use swingscan_core::{Evaluation, SignalRecord};
use swingscan_runner::export::render_table;
use swingscan_runner::{
    evaluate_symbols, fetch_benchmark, load_latest_scan, run_scan, save_scan, InstrumentOutcome,
    NoProgress, ScanConfig, ScanReport, ScanSummary, SignalFilter, StdoutScanProgress, ValueRange,
};

#[derive(Parser)]
#[command(
    name = "swingscan",
    about = "SwingScan CLI: weekly swing-trade screener for NSE equities"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where bars come from. Defaults to Yahoo Finance.
#[derive(Args, Clone)]
struct SourceArgs {
    /// Path to a TOML scan config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read bars from <DIR>/<SYMBOL>.csv instead of Yahoo Finance.
    #[arg(long, conflicts_with = "synthetic")]
    csv_dir: Option<PathBuf>,

    /// Use seeded synthetic bars (offline demo).
    #[arg(long, value_name = "SEED")]
    synthetic: Option<u64>,

    /// Benchmark index symbol (default ^NSEI).
    #[arg(long)]
    benchmark: Option<String>,

    /// Evaluate as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a universe and save the ranked setups.
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        /// Universe file (TOML or one symbol per line).
        #[arg(long, conflicts_with = "nse")]
        universe_file: Option<PathBuf>,

        /// Download the NSE equity listing as the universe.
        #[arg(long, default_value_t = false)]
        nse: bool,

        /// Scan at most this many symbols.
        #[arg(long)]
        limit: Option<usize>,

        /// Worker threads.
        #[arg(long)]
        workers: Option<usize>,

        /// Directory for the CSV and manifest.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Screen the given symbols and print each verdict.
    Evaluate {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Filter and print the newest saved scan.
    Show {
        /// Directory holding SWING_PRO_* results.
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Keep prices in LO..HI.
        #[arg(long, value_name = "LO..HI")]
        price: Option<ValueRange>,

        /// Keep RSI in LO..HI.
        #[arg(long, value_name = "LO..HI")]
        rsi: Option<ValueRange>,

        /// Keep setups risking at most this percent.
        #[arg(long, value_name = "PCT")]
        max_risk: Option<f64>,

        /// Keep setups with at least this RR at the 5% target.
        #[arg(long, value_name = "RR")]
        min_rr: Option<f64>,
    },
    /// Print the default configuration as TOML.
    Thresholds,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            source,
            universe_file,
            nse,
            limit,
            workers,
            output_dir,
        } => run_scan_cmd(source, universe_file, nse, limit, workers, output_dir),
        Commands::Evaluate { source, symbols } => run_evaluate_cmd(source, symbols),
        Commands::Show {
            dir,
            price,
            rsi,
            max_risk,
            min_rr,
        } => run_show_cmd(
            &dir,
            SignalFilter {
                price,
                rsi,
                max_risk_pct: max_risk,
                min_reward_ratio: min_rr,
            },
        ),
        Commands::Thresholds => {
            print!("{}", ScanConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "swingscan=debug" } else { "swingscan=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(source: &SourceArgs) -> Result<ScanConfig> {
    let mut config = match &source.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(benchmark) = &source.benchmark {
        config.benchmark_symbol = benchmark.clone();
    }
    Ok(config)
}

fn build_provider(source: &SourceArgs, config: &ScanConfig) -> Result<Box<dyn DataProvider>> {
    if let Some(dir) = &source.csv_dir {
        if !dir.is_dir() {
            bail!("--csv-dir {} is not a directory", dir.display());
        }
        return Ok(Box::new(CsvDirProvider::new(dir)));
    }
    if let Some(seed) = source.synthetic {
        return Ok(Box::new(SyntheticProvider::new(seed)));
    }

    let breaker = Arc::new(CircuitBreaker::default_provider());
    let yahoo = YahooProvider::new(breaker)?.with_suffix(config.symbol_suffix.clone());
    Ok(Box::new(ThrottledProvider::new(
        yahoo,
        Duration::from_millis(config.request_delay_ms),
    )))
}

fn as_of(source: &SourceArgs) -> NaiveDate {
    source
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}

fn run_scan_cmd(
    source: SourceArgs,
    universe_file: Option<PathBuf>,
    nse: bool,
    limit: Option<usize>,
    workers: Option<usize>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(&source)?;
    if let Some(limit) = limit {
        config.universe_limit = limit;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    config.validate()?;

    let universe: Box<dyn UniverseProvider> = match (universe_file, nse) {
        (Some(path), _) => Box::new(FileUniverse::new(path).with_limit(config.universe_limit)),
        (None, true) => Box::new(NseUniverseProvider::new(config.universe_limit)?),
        (None, false) => bail!("one of --universe-file or --nse is required"),
    };
    let provider = build_provider(&source, &config)?;
    tracing::debug!(
        universe = universe.name(),
        provider = provider.name(),
        workers = config.workers,
        "scan configured"
    );

    let started = Instant::now();
    let now = chrono::Local::now().naive_local();
    let rule = "=".repeat(70);
    println!("{rule}");
    println!("NSE PRO SWING SCANNER");
    println!("{}", now.format("%Y-%m-%d %H:%M"));
    println!("{rule}\n");

    let progress = StdoutScanProgress::new(config.progress_every);
    let report = run_scan(
        &config,
        universe.as_ref(),
        provider.as_ref(),
        as_of(&source),
        &progress,
        None,
    )?;

    match save_scan(&report, &config.output_dir, now)? {
        Some(saved) => {
            println!("Results saved to {}", saved.csv.display());
            println!("                 {}", saved.xlsx.display());
            println!("                 {}\n", saved.manifest.display());
            if let Some(summary) = report.summary() {
                print_summary(&summary, &report.benchmark_symbol, report.top(5));
            }
        }
        None => println!("No signals today — market is overextended. Capital preserved."),
    }
    print_rejections(&report);

    println!(
        "\nTime taken: {:.1} mins",
        started.elapsed().as_secs_f64() / 60.0
    );
    println!("Done.");
    Ok(())
}

fn print_summary(summary: &ScanSummary, benchmark: &str, top: &[SignalRecord]) {
    println!("Opportunities found: {}", summary.count);
    println!("Avg risk:            {:.1}%", summary.avg_risk_pct);
    println!("Avg RR (5%):         1:{:.1}", summary.avg_reward_ratio);
    println!("Avg RSI:             {:.1}", summary.avg_rsi);
    println!(
        "Beating {benchmark}:      {}/{}",
        summary.beating_benchmark, summary.count
    );
    println!("\nTOP {}:", top.len());
    println!("{}", render_table(top));
}

fn print_rejections(report: &ScanReport) {
    let histogram = report.rejection_histogram();
    if histogram.is_empty() {
        return;
    }
    println!("\nRejections by reason:");
    for (label, count) in histogram {
        println!("  {label:<24} {count:>6}");
    }
    if report.was_cancelled() {
        println!("  {:<24} {:>6}", "cancelled", report.aggregate.counts.cancelled);
    }
}

fn run_evaluate_cmd(source: SourceArgs, symbols: Vec<String>) -> Result<()> {
    let config = load_config(&source)?;
    let provider = build_provider(&source, &config)?;
    let as_of = as_of(&source);

    let benchmark = fetch_benchmark(&config, provider.as_ref(), as_of)?;
    println!(
        "{} trailing return: {:+.2}%\n",
        config.benchmark_symbol,
        benchmark.value() * 100.0
    );

    let results = evaluate_symbols(
        &config,
        &symbols,
        benchmark,
        provider.as_ref(),
        as_of,
        &NoProgress,
        None,
    )?;

    for result in &results {
        match &result.outcome {
            InstrumentOutcome::Evaluated(Evaluation::Accepted(record)) => {
                println!("{:<16} PASS", result.symbol);
                println!("{}\n", render_table(std::slice::from_ref(record)));
            }
            InstrumentOutcome::Evaluated(Evaluation::Rejected(rejection)) => {
                println!("{:<16} REJECT  {rejection}", result.symbol);
            }
            InstrumentOutcome::Cancelled => println!("{:<16} CANCELLED", result.symbol),
        }
    }
    Ok(())
}

fn run_show_cmd(dir: &std::path::Path, filter: SignalFilter) -> Result<()> {
    let Some((path, manifest)) = load_latest_scan(dir)? else {
        bail!("no saved scan (SWING_PRO_*.json) in {}", dir.display());
    };
    let saved = manifest.report.signals();
    let kept = filter.apply(saved);

    println!(
        "Scan of {} from {} ({})",
        manifest.report.as_of,
        manifest.created_at.format("%Y-%m-%d %H:%M"),
        path.display()
    );
    println!(
        "{} trailing return: {:+.2}%",
        manifest.report.benchmark_symbol,
        manifest.report.benchmark_return * 100.0
    );
    if !filter.is_empty() {
        println!("{} of {} setups match the filters", kept.len(), saved.len());
    }
    println!();

    match ScanSummary::from_signals(&kept) {
        Some(summary) => print_summary(&summary, &manifest.report.benchmark_symbol, &kept),
        None => println!("No setups match the filters."),
    }
    Ok(())
}
