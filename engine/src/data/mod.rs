pub mod cache;
pub mod csv_parser;
pub mod provider;

pub use cache::{CacheKey, CachedProvider, HistoryCache};
pub use csv_parser::DailyCsvParser;
pub use provider::{CsvDirectoryProvider, HistoryWindow, PriceHistoryProvider};
