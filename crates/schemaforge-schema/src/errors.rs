//! Error types for schema inference and validation.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while inferring, loading or persisting a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Cannot infer a schema from an empty dataset
    #[error("no data to create schema from")]
    NoData,

    /// Matrix rows with differing lengths
    #[error("unequal lengths in matrix for field '{field}'")]
    RaggedMatrix { field: String },

    /// I/O failure reading or writing a schema artifact
    #[error("i/o error while accessing schema artifact: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed schema artifact
    #[error("failed to parse schema artifact: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A single record field failing its declared type or shape.
///
/// Carries the field name and the offending value so a failure can be
/// diagnosed from the log alone.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid TEXT value in field '{field}': {value}")]
    Text { field: String, value: Value },

    #[error("invalid {expected} value in field '{field}': {value}")]
    Numeric {
        field: String,
        expected: &'static str,
        value: Value,
    },

    #[error("field '{field}' expects a sequence, got: {value}")]
    NotASequence { field: String, value: Value },

    #[error("vector field '{field}' expects {expected} elements, got {actual}")]
    VecLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("matrix field '{field}' expects {expected} rows, got {actual}")]
    MatrixRows {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("matrix field '{field}' row {row} expects {expected} columns, got {actual}")]
    MatrixCols {
        field: String,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error(
        "tensor field '{field}' dimension {dim} expects {expected}, got {actual}"
    )]
    TensorDim {
        field: String,
        dim: usize,
        expected: usize,
        actual: usize,
    },

    #[error("quaternion field '{field}' expects exactly 4 elements, got {actual}")]
    QuaternionLength { field: String, actual: usize },

    #[error("shaped field '{field}' contains a non-numeric element: {value}")]
    NonNumericElement { field: String, value: Value },
}

impl ValidationError {
    /// The offending field's name.
    pub fn field(&self) -> &str {
        match self {
            Self::Text { field, .. }
            | Self::Numeric { field, .. }
            | Self::NotASequence { field, .. }
            | Self::VecLength { field, .. }
            | Self::MatrixRows { field, .. }
            | Self::MatrixCols { field, .. }
            | Self::TensorDim { field, .. }
            | Self::QuaternionLength { field, .. }
            | Self::NonNumericElement { field, .. } => field,
        }
    }
}
