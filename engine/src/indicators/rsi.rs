// Relative Strength Index (RSI) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::Bar;

/// RS used when neither gains nor losses have accumulated (a flat series).
const FLAT_RS: f64 = 100.0;

/// Wilder RSI: gain and loss averages are EMAs with `alpha = 1 / period`, seeded with
/// the first price change.
pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }
}

pub(crate) fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            return 100.0;
        }
        return 100.0 - 100.0 / (1.0 + FLAT_RS);
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>> {
        if data.is_empty() || self.period == 0 {
            return vec![None; data.len()];
        }

        let alpha = 1.0 / self.period as f64;
        let mut results = Vec::with_capacity(data.len());
        results.push(None); // no change on the first bar

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..data.len() {
            let change = data[i].close - data[i - 1].close;
            let (gain, loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };

            if i == 1 {
                avg_gain = gain;
                avg_loss = loss;
            } else {
                avg_gain += (gain - avg_gain) * alpha;
                avg_loss += (loss - avg_loss) * alpha;
            }
            results.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        }
        results
    }
}
