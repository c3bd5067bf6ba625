//! Common error types for meterd

use thiserror::Error;

/// Common result type for meterd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the measurement lifecycle
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A measurement for this customer, type and month already exists
    #[error("Monthly reading already recorded")]
    DuplicateMeasurement,

    /// The value-extraction provider could not produce a reading
    #[error("Value extraction failed: {0}")]
    ExtractionFailed(String),

    /// Requested measurement not found
    #[error("Measurement not found: {0}")]
    NotFound(String),

    /// The measurement was already confirmed once
    #[error("Measurement already confirmed")]
    AlreadyConfirmed,

    /// Listing matched no measurements
    #[error("No measurements found")]
    NoMeasurementsFound,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
