//! Error types for qg-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Unknown value: {0}")]
    UnknownValue(String),

    #[error("Invalid trading pair: {0}")]
    InvalidPair(String),

    #[error("Book rows out of order: {0}")]
    UnsortedBook(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
