pub mod models;
pub mod utils;

pub use models::{
    validate_bars, BacktestSignal, Bar, DataIntegrityError, IndicatorSnapshot, PriceHistory,
    TrendLabel,
};
