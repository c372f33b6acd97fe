//! Multi-ticker fan-out: fetch, snapshot and backtest every ticker, tolerating
//! per-ticker failures.

use crate::backtest::{backtest, BacktestConfig, BacktestSummary};
use crate::data::{HistoryWindow, PriceHistoryProvider};
use crate::error::EngineError;
use crate::snapshot::{compute_snapshot, SnapshotResult};
use shared::{BacktestSignal, Bar, DataIntegrityError, IndicatorSnapshot, PriceHistory};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Outcome kind, in ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScanStatus {
    Scored,
    Indeterminate,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Scored => "scored",
            ScanStatus::Indeterminate => "indeterminate",
            ScanStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Scored {
        snapshot: IndicatorSnapshot,
        signals: Vec<BacktestSignal>,
    },
    Indeterminate {
        available: usize,
    },
    Failed {
        reason: String,
    },
}

impl ScanOutcome {
    pub fn status(&self) -> ScanStatus {
        match self {
            ScanOutcome::Scored { .. } => ScanStatus::Scored,
            ScanOutcome::Indeterminate { .. } => ScanStatus::Indeterminate,
            ScanOutcome::Failed { .. } => ScanStatus::Failed,
        }
    }

    fn score(&self) -> Option<u8> {
        match self {
            ScanOutcome::Scored { snapshot, .. } => Some(snapshot.momentum_score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerReport {
    pub ticker: String,
    pub outcome: ScanOutcome,
}

impl TickerReport {
    fn failed(ticker: String, err: &EngineError) -> Self {
        Self {
            ticker,
            outcome: ScanOutcome::Failed { reason: err.to_string() },
        }
    }

    pub fn snapshot(&self) -> Option<&IndicatorSnapshot> {
        match &self.outcome {
            ScanOutcome::Scored { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn signals(&self) -> &[BacktestSignal] {
        match &self.outcome {
            ScanOutcome::Scored { signals, .. } => signals,
            _ => &[],
        }
    }
}

/// Scored tickers first by score (descending), then indeterminate, then failed; ties by ticker.
fn compare_reports(a: &TickerReport, b: &TickerReport) -> Ordering {
    a.outcome
        .status()
        .cmp(&b.outcome.status())
        .then_with(|| b.outcome.score().cmp(&a.outcome.score()))
        .then_with(|| a.ticker.cmp(&b.ticker))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub window: HistoryWindow,
    pub reports: Vec<TickerReport>,
}

impl ScanReport {
    pub fn scored(&self) -> impl Iterator<Item = &TickerReport> {
        self.reports.iter().filter(|r| r.snapshot().is_some())
    }

    pub fn count(&self, status: ScanStatus) -> usize {
        self.reports.iter().filter(|r| r.outcome.status() == status).count()
    }

    /// Aggregate forward-return statistics over every ticker's signals.
    pub fn summary(&self, holding_periods: &BTreeSet<usize>) -> BacktestSummary {
        BacktestSummary::from_signals(
            self.reports.iter().flat_map(|r| r.signals()),
            holding_periods.iter().copied(),
        )
    }
}

/// Snapshot and backtest one ticker's bars.
pub fn evaluate_history(bars: &[Bar], config: &BacktestConfig) -> Result<ScanOutcome, DataIntegrityError> {
    match compute_snapshot(bars)? {
        SnapshotResult::Indeterminate { available, .. } => Ok(ScanOutcome::Indeterminate { available }),
        SnapshotResult::Ready(snapshot) => {
            let signals = backtest(bars, config)?;
            Ok(ScanOutcome::Scored { snapshot, signals })
        }
    }
}

fn evaluate_ticker(ticker: &str, bars: Vec<Bar>, config: &BacktestConfig) -> ScanOutcome {
    let evaluated = PriceHistory::new(ticker, bars).and_then(|history| evaluate_history(history.bars(), config));
    match evaluated {
        Ok(outcome) => {
            match &outcome {
                ScanOutcome::Scored { snapshot, signals } => tracing::debug!(
                    ticker = %ticker,
                    score = snapshot.momentum_score,
                    trend = %snapshot.trend_label,
                    signals = signals.len(),
                    "ticker scored"
                ),
                ScanOutcome::Indeterminate { available } => tracing::debug!(
                    ticker = %ticker,
                    available,
                    "insufficient history for ticker"
                ),
                ScanOutcome::Failed { .. } => {}
            }
            outcome
        }
        Err(e) => {
            tracing::warn!(ticker = %ticker, error = %e, "rejected malformed price history");
            ScanOutcome::Failed {
                reason: EngineError::from(e).to_string(),
            }
        }
    }
}

/// Runs the indicator and backtest pass on the blocking pool.
async fn resolve(ticker: String, fetched: Result<Vec<Bar>, EngineError>, config: BacktestConfig) -> ScanOutcome {
    let bars = match fetched {
        Ok(bars) => bars,
        Err(e) => {
            tracing::warn!(
                ticker = %ticker,
                error = %e,
                retryable = e.is_retryable(),
                "price history fetch failed, skipping ticker"
            );
            return ScanOutcome::Failed { reason: e.to_string() };
        }
    };

    let task_ticker = ticker.clone();
    match tokio::task::spawn_blocking(move || evaluate_ticker(&task_ticker, bars, &config)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = EngineError::from(e);
            tracing::warn!(ticker = %ticker, error = %err, "ticker evaluation aborted");
            ScanOutcome::Failed { reason: err.to_string() }
        }
    }
}

fn normalize_tickers(tickers: &[String]) -> BTreeSet<String> {
    tickers
        .iter()
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

pub struct Scanner<P> {
    provider: Arc<P>,
    config: BacktestConfig,
    max_concurrent_fetches: usize,
}

impl<P: PriceHistoryProvider + 'static> Scanner<P> {
    pub fn new(provider: Arc<P>, config: BacktestConfig, max_concurrent_fetches: usize) -> Self {
        Self {
            provider,
            config,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Every normalised ticker appears exactly once in the report, including tickers
    /// whose task panicked.
    pub async fn scan(&self, tickers: &[String], window: HistoryWindow) -> ScanReport {
        let tickers = normalize_tickers(tickers);
        tracing::info!(
            tickers = tickers.len(),
            as_of = %window.as_of,
            lookback = window.lookback_bars,
            max_concurrent = self.max_concurrent_fetches,
            "Starting momentum scan"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let mut tasks = JoinSet::new();
        let mut in_flight: HashMap<Id, String> = HashMap::new();
        for ticker in tickers {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            let task_ticker = ticker.clone();
            let handle = tasks.spawn(async move {
                let fetched = match semaphore.acquire_owned().await {
                    Ok(_permit) => provider.fetch_history(&task_ticker, &window).await,
                    Err(e) => Err(EngineError::TaskError(e.to_string())),
                };
                let outcome = resolve(task_ticker.clone(), fetched, config).await;
                TickerReport {
                    ticker: task_ticker,
                    outcome,
                }
            });
            in_flight.insert(handle.id(), ticker);
        }

        let mut reports = Vec::with_capacity(in_flight.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, report)) => {
                    in_flight.remove(&id);
                    reports.push(report);
                }
                Err(e) => {
                    let ticker = in_flight.remove(&e.id()).unwrap_or_default();
                    let err = EngineError::from(e);
                    tracing::error!(
                        ticker = %ticker,
                        error = %err,
                        retryable = err.is_retryable(),
                        "scan task did not complete"
                    );
                    reports.push(TickerReport::failed(ticker, &err));
                }
            }
        }
        reports.sort_by(compare_reports);

        let report = ScanReport { window, reports };
        tracing::info!(
            scored = report.count(ScanStatus::Scored),
            indeterminate = report.count(ScanStatus::Indeterminate),
            failed = report.count(ScanStatus::Failed),
            "Momentum scan complete"
        );
        report
    }
}
