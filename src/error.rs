use thiserror::Error;

pub type Result<T> = std::result::Result<T, QcError>;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Timestamp parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid QC configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid QC flag bits: {0:#06b}")]
    InvalidFlagBits(u16),

    #[error("Unknown quality label: {0}")]
    UnknownLabel(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Station {station_id}: timestamp {timestamp} is not after the previous row")]
    UnorderedSeries {
        station_id: String,
        timestamp: chrono::NaiveDateTime,
    },

    #[error("Station {station_id}: duplicate timestamp {timestamp}")]
    DuplicateTimestamp {
        station_id: String,
        timestamp: chrono::NaiveDateTime,
    },

    #[error("Single-station series contains rows from {expected} and {found}")]
    MixedStations { expected: String, found: String },

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl QcError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        QcError::InvalidConfig {
            message: message.into(),
        }
    }
}
