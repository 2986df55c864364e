//! Error types for the tickprep pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tickprep pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source directory or files absent.
    #[error("Input not found: {0}")]
    InputNotFound(String),

    /// Every input file failed to parse.
    #[error("No valid records: {0}")]
    NoValidRecords(String),

    /// A single input file could not be read.
    #[error("Error reading {}: {reason}", path.display())]
    FileRead { path: PathBuf, reason: String },

    /// Split event with a non-positive or non-finite ratio.
    #[error("Malformed split event: {0}")]
    MalformedSplitEvent(String),

    /// Price series not ordered by timestamp.
    #[error("Unsorted input: {0}")]
    UnsortedInput(String),

    /// No defined daily returns to analyze.
    #[error("Empty returns: {0}")]
    EmptyReturns(String),

    /// Corporate-action reference lookup failed.
    #[error("Reference lookup error: {0}")]
    ReferenceLookup(String),

    /// Unparseable field value (timestamps, numbers).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Insufficient data for computation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an input-not-found error.
    pub fn input_not_found(msg: impl Into<String>) -> Self {
        Error::InputNotFound(msg.into())
    }

    /// Create a no-valid-records error.
    pub fn no_valid_records(msg: impl Into<String>) -> Self {
        Error::NoValidRecords(msg.into())
    }

    /// Create a per-file read error.
    pub fn file_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::FileRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed split event error.
    pub fn malformed_split(msg: impl Into<String>) -> Self {
        Error::MalformedSplitEvent(msg.into())
    }

    /// Create an unsorted input error.
    pub fn unsorted(msg: impl Into<String>) -> Self {
        Error::UnsortedInput(msg.into())
    }

    /// Create an empty returns error.
    pub fn empty_returns(msg: impl Into<String>) -> Self {
        Error::EmptyReturns(msg.into())
    }

    /// Create a reference lookup error.
    pub fn reference_lookup(msg: impl Into<String>) -> Self {
        Error::ReferenceLookup(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }

    /// Whether the pipeline may continue after this error.
    ///
    /// Only per-file read failures and reference lookups are recovered locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::FileRead { .. } | Error::ReferenceLookup(_))
    }
}
