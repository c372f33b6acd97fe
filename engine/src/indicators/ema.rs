// Exponential Moving Average (EMA) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::Bar;

/// EMA with smoothing factor `2 / (span + 1)`, seeded with the first value.
///
/// The recursion runs over the whole input so early values keep decaying into the tail.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    let mut results = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;
    for &value in values {
        let ema = match previous {
            Some(prev) => (value - prev) * alpha + prev,
            None => value,
        };
        results.push(ema);
        previous = Some(ema);
    }
    results
}

pub struct Ema {
    name: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>> {
        if self.period == 0 {
            return vec![None; data.len()];
        }
        let closes: Vec<f64> = data.iter().map(|b| b.close).collect();
        ema_series(&closes, self.period).into_iter().map(Some).collect()
    }
}
