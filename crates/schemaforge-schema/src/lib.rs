//! Schema model, type inference and shape validation.
//!
//! A dataset's schema is inferred once from its first record, persisted as a
//! YAML artifact, and afterwards loaded and trusted verbatim. Validation
//! checks every record against the declared field types and shape parameters.

mod artifact;
mod errors;
mod infer;
mod model;
mod validate;

pub use artifact::{get_or_create, load_schema, save_schema};
pub use errors::{SchemaError, SchemaResult, ValidationError};
pub use infer::{generate_schema, infer_field};
pub use model::{Field, FieldKind, Metadata, Record, Schema};
pub use validate::validate_record;
