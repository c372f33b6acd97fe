// Momentum engine library root

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod scoring;
pub mod services;
pub mod snapshot;

pub use backtest::{backtest, BacktestConfig, BacktestSummary};
pub use error::EngineError;
pub use snapshot::{compute_snapshot, SnapshotResult};
