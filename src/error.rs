use chrono::NaiveDate;
use thiserror::Error;

/// Engine error types.
///
/// Numeric degeneracies in price data never surface here; they are absorbed
/// by the fallback paths in the indicator and prediction code. These variants
/// cover structural problems with inputs and failures in the outer shell.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("Bars out of order: {previous} is followed by {next}")]
    UnorderedSeries { previous: NaiveDate, next: NaiveDate },

    #[error("Duplicate bar date: {0}")]
    DuplicateDate(NaiveDate),

    #[error("No historical data for {0}")]
    DataNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
