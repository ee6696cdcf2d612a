//! Core error types for folioscope.
//!
//! Provider and storage specific failures are converted into these types by
//! the crates that implement the core traits.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the exposure engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Allocation lookup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("Security store error: {0}")]
    Store(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Validation errors for allocation data, holdings and parsed input.
///
/// Raised eagerly when a record is constructed. Values are never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{taxonomy}: bucket '{bucket}' is {value}%, expected a value in 0..=100")]
    BucketOutOfRange {
        taxonomy: &'static str,
        bucket: &'static str,
        value: u8,
    },

    #[error("{taxonomy}: buckets sum to {sum}%, expected exactly 100%")]
    BucketSumMismatch { taxonomy: &'static str, sum: u16 },

    #[error("{taxonomy}: expected {expected} bucket weights, got {actual}")]
    WeightCountMismatch {
        taxonomy: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Quantity for {symbol} must not be negative, got {quantity}")]
    NegativeQuantity { symbol: String, quantity: Decimal },

    #[error("Cash balance must not be negative, got {0}")]
    NegativeCash(Decimal),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(String),
}

/// Classification of provider failures for callers deciding whether to retry.
///
/// The lookup cache itself never retries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Retrying the same request will fail the same way.
    Never,
    /// Transient failure; a later attempt may succeed.
    WithBackoff,
}

/// Errors returned by allocation providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider has no allocation data for the symbol.
    #[error("No allocation data for symbol: {0}")]
    NotFound(String),

    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    #[error("Timeout: {provider} after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Network error: {provider} - {message}")]
    Network { provider: String, message: String },

    /// The provider answered but the payload could not be interpreted.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Provider unavailable: {provider} - {message}")]
    Unavailable { provider: String, message: String },

    /// The payload parsed but violates the allocation invariants.
    #[error("Allocation data failed validation: {0}")]
    Validation(#[from] ValidationError),
}

impl ProviderError {
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::NotFound(_) | Self::InvalidResponse { .. } | Self::Validation(_) => {
                RetryClass::Never
            }
            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::Network { .. }
            | Self::Unavailable { .. } => RetryClass::WithBackoff,
        }
    }
}

/// Errors raised while computing breakdowns and summary ratios.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// The weighted total for the measure is zero, so percentages are undefined.
    #[error("Cannot compute {measure}: weighted total is zero")]
    EmptyTotal { measure: String },

    /// An intermediate sum or product does not fit in a `Decimal`.
    #[error("Cannot compute {measure}: value overflow")]
    Overflow { measure: String },
}

/// Errors raised by holdings sources while parsing broker exports.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Input is not a valid {0} export")]
    InvalidFormat(String),

    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown data source type: {0}")]
    UnknownSource(String),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err.to_string()))
    }
}

impl From<rust_decimal::Error> for ValidationError {
    fn from(err: rust_decimal::Error) -> Self {
        ValidationError::DecimalParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
