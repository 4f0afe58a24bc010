use thiserror::Error;

/// Result type for matrix generation.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Two of the parallel observation columns have different lengths.
    #[error("{what} differ in length: {left} != {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// An observed label is missing from the label index.
    #[error("Unknown {axis} label: '{label}'")]
    UnknownLabel { axis: &'static str, label: String },

    /// A row of the matrix has a total of zero and cannot be normalized.
    #[error("Division by zero: row '{row}' has a total of 0")]
    DivisionByZero { row: String },

    #[error("Unhandled output format: {0}")]
    UnhandledFormat(String),

    #[error("Unrecognized {kind}: '{value}' (expected one of: {expected})")]
    UnrecognizedValue {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Column indices are 1-based and must exist in every row.
    #[error("Invalid {role} column {column}: {reason}")]
    InvalidColumn {
        role: &'static str,
        column: usize,
        reason: String,
    },

    #[error("Invalid weight '{value}' in row {row}")]
    InvalidWeight { row: usize, value: String },

    #[error("Invalid {what} '{value}': must be a single byte character")]
    InvalidDialect { what: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl Error {
    pub fn length_mismatch(what: &'static str, left: usize, right: usize) -> Self {
        Error::LengthMismatch { what, left, right }
    }

    pub fn invalid_column(role: &'static str, column: usize, reason: impl Into<String>) -> Self {
        Error::InvalidColumn {
            role,
            column,
            reason: reason.into(),
        }
    }
}
