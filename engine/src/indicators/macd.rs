// Moving Average Convergence Divergence (MACD)
use super::ema::ema_series;
use shared::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self { fast, slow, signal }
    }

    pub fn calculate(&self, data: &[Bar]) -> MacdSeries {
        let closes: Vec<f64> = data.iter().map(|b| b.close).collect();
        let fast = ema_series(&closes, self.fast);
        let slow = ema_series(&closes, self.slow);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_series(&line, self.signal);
        let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
        MacdSeries { line, signal, histogram }
    }
}
