// Momentum engine entry point
use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use momentum_engine::config::ScannerSettings;
use momentum_engine::data::{CachedProvider, CsvDirectoryProvider, HistoryWindow};
use momentum_engine::services::{signal_records, write_signals_csv, write_snapshots_csv, ScanOutcome, Scanner};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scores every configured ticker's momentum and backtests the score threshold.
#[derive(Parser, Debug)]
#[command(name = "momentum-engine", version, about)]
struct Cli {
    /// JSON settings file. Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Comma-separated tickers, replacing the configured list.
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    report_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => ScannerSettings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => ScannerSettings::default(),
    };
    if !cli.tickers.is_empty() {
        settings.tickers = cli.tickers.clone();
    }
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(dir) = cli.report_dir {
        settings.report_dir = dir;
    }
    settings.validate()?;

    if settings.tickers.is_empty() {
        anyhow::bail!("no tickers configured; pass --tickers or list them in the settings file");
    }

    let as_of = cli.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let window = HistoryWindow::new(as_of, settings.lookback_bars);
    let config = settings.backtest_config()?;
    info!(
        data_dir = %settings.data_dir.display(),
        %as_of,
        threshold = config.score_threshold(),
        "Starting momentum engine"
    );

    let provider = Arc::new(CachedProvider::new(CsvDirectoryProvider::new(&settings.data_dir)));
    let scanner = Scanner::new(provider, config.clone(), settings.max_concurrent_fetches);
    let report = scanner.scan(&settings.tickers, window).await;

    for ticker in &report.reports {
        match &ticker.outcome {
            ScanOutcome::Scored { snapshot, signals } => info!(
                ticker = %ticker.ticker,
                score = snapshot.momentum_score,
                trend = %snapshot.trend_label,
                rsi = snapshot.rsi14,
                adx = snapshot.adx14,
                signals = signals.len(),
                "ranked"
            ),
            ScanOutcome::Indeterminate { available } => {
                info!(ticker = %ticker.ticker, available, "indeterminate")
            }
            ScanOutcome::Failed { reason } => info!(ticker = %ticker.ticker, %reason, "failed"),
        }
    }

    let summary = report.summary(config.holding_periods());
    for horizon in &summary.horizons {
        info!(
            holding_period = horizon.holding_period,
            signals = horizon.signals,
            mean_return = ?horizon.mean_return,
            win_rate = ?horizon.win_rate,
            "backtest horizon"
        );
    }

    std::fs::create_dir_all(&settings.report_dir)
        .with_context(|| format!("failed to create {}", settings.report_dir.display()))?;
    let stamp = as_of.format("%Y-%m-%d");

    let snapshots_path = settings.report_dir.join(format!("snapshots_{}.csv", stamp));
    write_snapshots_csv(BufWriter::new(File::create(&snapshots_path)?), &report.reports)?;

    let signals_path = settings.report_dir.join(format!("signals_{}.csv", stamp));
    let records = signal_records(&report.reports);
    write_signals_csv(BufWriter::new(File::create(&signals_path)?), config.holding_periods(), &records)?;

    let summary_path = settings.report_dir.join(format!("summary_{}.json", stamp));
    serde_json::to_writer_pretty(BufWriter::new(File::create(&summary_path)?), &summary)?;

    info!(
        snapshots = %snapshots_path.display(),
        signals = %signals_path.display(),
        summary = %summary_path.display(),
        total_signals = summary.total_signals,
        "Reports written"
    );
    Ok(())
}
