//! Table persistence on SQLite.
//!
//! One database file per dataset. Structured numeric fields (VEC, MATRIX,
//! TENSOR, QUATERNION) are stored as opaque blobs of flattened little-endian
//! f64 values; the encoding carries no shape header, so decoding requires the
//! schema's shape parameters.

use thiserror::Error;

mod encoding;
mod table;

pub use encoding::{decode_tensor, encode_tensor};
pub use table::TableStore;

/// Errors at the persistence boundary. Unlike load and validation errors,
/// these are not swallowed by the pipeline.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error while preparing database path: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode non-numeric element in field '{field}': {value}")]
    NonNumeric {
        field: String,
        value: serde_json::Value,
    },

    #[error("blob length {len} does not match shape {dims:?}")]
    ShapeMismatch { len: usize, dims: Vec<usize> },

    #[error("blob contains a non-finite value")]
    NonFinite,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
