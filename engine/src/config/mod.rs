pub mod settings;

pub use settings::{BacktestSettings, ScannerSettings};
