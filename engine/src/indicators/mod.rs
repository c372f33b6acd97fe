// Technical indicators module
pub mod adx;
pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;
pub mod volume;

pub use adx::{Adx, AdxSeries};
pub use ema::{ema_series, Ema};
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use volume::VolumeRatio;

use serde_json::Value;
use shared::Bar;

/// Common trait for single-output indicators.
///
/// Every implementation is causal: the value at index `i` only depends on `data[..=i]`,
/// so computing over a full history and reading index `i` equals computing over the prefix.
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    /// One entry per bar; `None` where the indicator is not yet defined.
    fn calculate(&self, data: &[Bar]) -> Vec<Option<f64>>;
}
