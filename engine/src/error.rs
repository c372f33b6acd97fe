use shared::DataIntegrityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("Price history provider error for '{ticker}': {message}")]
    ProviderError { ticker: String, message: String },

    #[error("Scan task failed: {0}")]
    TaskError(String),
}

impl EngineError {
    /// Whether retrying the same input could possibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::IoError { .. } | EngineError::ProviderError { .. } | EngineError::TaskError(_)
        )
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Mapping JoinError to EngineError: {:?}", err);
        EngineError::TaskError(err.to_string())
    }
}
