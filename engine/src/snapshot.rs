//! Point-in-time indicator snapshots.
//!
//! [`IndicatorSeries`] computes every indicator once over a bar sequence. All calculators
//! are causal, so [`IndicatorSeries::snapshot_at`] for index `i` is identical to running
//! [`compute_snapshot`] on `bars[..=i]`. The backtest relies on that to avoid rescanning
//! the prefix at every step.

use crate::indicators::{Adx, AdxSeries, Ema, IndicatorCalculator, Macd, MacdSeries, Rsi, VolumeRatio};
use crate::scoring::{momentum_score, trend_label, ScoreInputs};
use shared::{validate_bars, Bar, DataIntegrityError, IndicatorSnapshot};

/// Bars required before a snapshot carries an opinion.
pub const MIN_BARS: usize = 50;

pub const EMA_SHORT: usize = 20;
pub const EMA_MEDIUM: usize = 50;
pub const EMA_LONG: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const ADX_PERIOD: usize = 14;
pub const VOLUME_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotResult {
    Ready(IndicatorSnapshot),
    /// Not enough history to judge. A valid outcome, not a fault.
    Indeterminate { available: usize, required: usize },
}

impl SnapshotResult {
    pub fn snapshot(&self) -> Option<&IndicatorSnapshot> {
        match self {
            SnapshotResult::Ready(snapshot) => Some(snapshot),
            SnapshotResult::Indeterminate { .. } => None,
        }
    }

    pub fn into_snapshot(self) -> Option<IndicatorSnapshot> {
        match self {
            SnapshotResult::Ready(snapshot) => Some(snapshot),
            SnapshotResult::Indeterminate { .. } => None,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, SnapshotResult::Indeterminate { .. })
    }
}

/// Validates `bars` and evaluates the indicators at the last bar.
pub fn compute_snapshot(bars: &[Bar]) -> Result<SnapshotResult, DataIntegrityError> {
    validate_bars(bars)?;
    if bars.len() < MIN_BARS {
        return Ok(SnapshotResult::Indeterminate {
            available: bars.len(),
            required: MIN_BARS,
        });
    }
    Ok(IndicatorSeries::compute(bars).snapshot_at(bars.len() - 1))
}

/// Full indicator series over a validated bar sequence.
pub(crate) struct IndicatorSeries<'a> {
    bars: &'a [Bar],
    ema_short: Vec<Option<f64>>,
    ema_medium: Vec<Option<f64>>,
    ema_long: Vec<Option<f64>>,
    rsi: Vec<Option<f64>>,
    volume_ratio: Vec<Option<f64>>,
    macd: MacdSeries,
    adx: AdxSeries,
}

fn run(calculator: &dyn IndicatorCalculator, bars: &[Bar]) -> Vec<Option<f64>> {
    let values = calculator.calculate(bars);
    tracing::trace!(
        indicator = calculator.name(),
        parameters = %calculator.parameters(),
        bars = bars.len(),
        "computed indicator series"
    );
    values
}

impl<'a> IndicatorSeries<'a> {
    /// `bars` must already have passed [`validate_bars`].
    pub(crate) fn compute(bars: &'a [Bar]) -> Self {
        Self {
            bars,
            ema_short: run(&Ema::new(EMA_SHORT), bars),
            ema_medium: run(&Ema::new(EMA_MEDIUM), bars),
            ema_long: run(&Ema::new(EMA_LONG), bars),
            rsi: run(&Rsi::new(RSI_PERIOD), bars),
            volume_ratio: run(&VolumeRatio::new(VOLUME_PERIOD), bars),
            macd: Macd::default().calculate(bars),
            adx: Adx::new(ADX_PERIOD).calculate(bars),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.bars.len()
    }

    /// Snapshot as of bar `index` (inclusive prefix).
    pub(crate) fn snapshot_at(&self, index: usize) -> SnapshotResult {
        let available = index + 1;
        if available < MIN_BARS || index >= self.len() {
            return SnapshotResult::Indeterminate {
                available: available.min(self.len()),
                required: MIN_BARS,
            };
        }

        let bar = &self.bars[index];
        let ema20 = self.ema_short[index].unwrap_or(bar.close);
        let ema50 = self.ema_medium[index].unwrap_or(bar.close);
        let ema200 = self.ema_long[index].unwrap_or(bar.close);
        let rsi14 = self.rsi[index].unwrap_or(50.0);
        let volume_ratio = self.volume_ratio[index].unwrap_or(1.0);

        let macd = self.macd.line[index];
        let macd_signal = self.macd.signal[index];
        let macd_histogram = self.macd.histogram[index];
        let macd_above_signal = macd > macd_signal;

        let plus_di = self.adx.plus_di[index];
        let minus_di = self.adx.minus_di[index];
        let (bullish_crossover, bearish_crossover) = crossovers(
            (self.adx.plus_di[index - 1], self.adx.minus_di[index - 1]),
            (plus_di, minus_di),
        );
        let adx14 = self.adx.adx[index].unwrap_or(0.0);

        let momentum_score = momentum_score(&ScoreInputs {
            close: bar.close,
            ema20,
            ema50,
            ema200,
            rsi: rsi14,
            macd_histogram,
            macd_above_signal,
            volume_ratio,
            adx: adx14,
            bullish_crossover,
            bearish_crossover,
        });

        SnapshotResult::Ready(IndicatorSnapshot {
            date: bar.date,
            close: bar.close,
            ema20,
            ema50,
            ema200,
            rsi14,
            macd,
            macd_signal,
            macd_histogram,
            macd_above_signal,
            adx14,
            plus_di14: plus_di.unwrap_or(0.0),
            minus_di14: minus_di.unwrap_or(0.0),
            volume_ratio,
            bullish_crossover,
            bearish_crossover,
            momentum_score,
            trend_label: trend_label(momentum_score),
        })
    }
}

/// `(bullish, bearish)` edge between two consecutive `(+DI, -DI)` readings.
///
/// Bullish when +DI was at or below -DI and is now strictly above it; bearish is the
/// mirror image. Undefined DI on either bar yields no crossover.
fn crossovers(previous: (Option<f64>, Option<f64>), current: (Option<f64>, Option<f64>)) -> (bool, bool) {
    match (previous, current) {
        ((Some(prev_plus), Some(prev_minus)), (Some(plus), Some(minus))) => (
            prev_plus <= prev_minus && plus > minus,
            prev_minus <= prev_plus && minus > plus,
        ),
        _ => (false, false),
    }
}
