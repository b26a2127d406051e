use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Missing line item: {0}")]
    MissingLineItem(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Period mismatch: {0}")]
    PeriodMismatch(String),

    #[error("API error: {0}")]
    ApiError(String),
}
