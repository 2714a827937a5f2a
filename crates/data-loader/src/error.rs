//! Error types for the data-loader crate.
//!
//! Every record is read fail-fast: the first line that does not match its
//! expected schema is surfaced to the caller with the dataset label and line
//! number attached, and nothing after it is consumed.

use thiserror::Error;

/// Errors that can occur while reading and parsing the review datasets
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A line could not be parsed as a well-formed record of its dataset
    ///
    /// Missing required fields and fields of the wrong JSON type both land
    /// here; `reason` carries the serde message.
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field parsed as JSON but holds a value we cannot interpret
    /// (e.g. a review date that is not a date)
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl DataLoadError {
    /// True for the errors that mean "this record is malformed" as opposed
    /// to the file being unreadable.
    pub fn is_malformed_record(&self) -> bool {
        matches!(
            self,
            DataLoadError::ParseError { .. } | DataLoadError::InvalidValue { .. }
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
