pub mod report;
pub mod scanner;

pub use report::{signal_records, write_signals_csv, write_snapshots_csv, SignalRecord};
pub use scanner::{
    evaluate_history, ScanOutcome, ScanReport, ScanStatus, Scanner, TickerReport, DEFAULT_MAX_CONCURRENT_FETCHES,
};
