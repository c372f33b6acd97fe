// Per-horizon aggregate statistics over backtest signals
use serde::Serialize;
use shared::utils::round_to;
use shared::BacktestSignal;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonStats {
    pub holding_period: usize,
    pub signals: usize,
    pub mean_return: Option<f64>,
    pub median_return: Option<f64>,
    /// Share of strictly positive returns, in percent.
    pub win_rate: Option<f64>,
    pub best_return: Option<f64>,
    pub worst_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub total_signals: usize,
    pub horizons: Vec<HorizonStats>,
}

impl BacktestSummary {
    pub fn from_signals<'a>(
        signals: impl IntoIterator<Item = &'a BacktestSignal>,
        holding_periods: impl IntoIterator<Item = usize>,
    ) -> Self {
        let signals: Vec<&BacktestSignal> = signals.into_iter().collect();
        let horizons = holding_periods
            .into_iter()
            .map(|period| {
                let returns: Vec<f64> = signals
                    .iter()
                    .filter_map(|s| s.forward_return(period))
                    .collect();
                HorizonStats::from_returns(period, returns)
            })
            .collect();
        Self {
            total_signals: signals.len(),
            horizons,
        }
    }

    pub fn horizon(&self, holding_period: usize) -> Option<&HorizonStats> {
        self.horizons.iter().find(|h| h.holding_period == holding_period)
    }
}

impl HorizonStats {
    fn from_returns(holding_period: usize, mut returns: Vec<f64>) -> Self {
        if returns.is_empty() {
            return Self {
                holding_period,
                signals: 0,
                mean_return: None,
                median_return: None,
                win_rate: None,
                best_return: None,
                worst_return: None,
            };
        }

        returns.sort_by(|a, b| a.total_cmp(b));
        let count = returns.len();
        let mean = returns.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (returns[count / 2 - 1] + returns[count / 2]) / 2.0
        } else {
            returns[count / 2]
        };
        let wins = returns.iter().filter(|r| **r > 0.0).count();

        Self {
            holding_period,
            signals: count,
            mean_return: Some(round_to(mean, 2)),
            median_return: Some(round_to(median, 2)),
            win_rate: Some(round_to(wins as f64 / count as f64 * 100.0, 2)),
            best_return: returns.last().copied(),
            worst_return: returns.first().copied(),
        }
    }
}
