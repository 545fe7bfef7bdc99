//! Load-time errors.
use thiserror::Error;

/// Reasons a raw table is rejected before any filtering happens.
///
/// Row indices are 0-based positions among the data rows (the header is not
/// counted).
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("row {row}: column `{column}` has value {value:?}, expected {expected}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("row {row}: column `{column}` value {value} is outside [{min}, {max}]")]
    OutOfRange {
        row: usize,
        column: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("row {row}: column `{column}` is inconsistent: {detail}")]
    Inconsistent {
        row: usize,
        column: String,
        detail: String,
    },

    #[error("row {row}: duplicate record for year {year}, branch {branch:?}")]
    DuplicateKey { row: usize, year: i32, branch: String },

    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    /// The column the error points at, if it is tied to one.
    pub fn column(&self) -> Option<&str> {
        match self {
            SchemaError::MissingColumn { column }
            | SchemaError::InvalidValue { column, .. }
            | SchemaError::OutOfRange { column, .. }
            | SchemaError::Inconsistent { column, .. } => Some(column),
            SchemaError::DuplicateKey { .. } => Some("branch"),
            SchemaError::Csv(_) | SchemaError::Io { .. } => None,
        }
    }

    /// The offending data row, if the error is row-level.
    pub fn row(&self) -> Option<usize> {
        match self {
            SchemaError::InvalidValue { row, .. }
            | SchemaError::OutOfRange { row, .. }
            | SchemaError::Inconsistent { row, .. }
            | SchemaError::DuplicateKey { row, .. } => Some(*row),
            SchemaError::MissingColumn { .. } | SchemaError::Csv(_) | SchemaError::Io { .. } => {
                None
            }
        }
    }
}
