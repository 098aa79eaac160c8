//! Type inference from a representative sample value.
//!
//! A single sample (the first record) drives the whole dataset's schema.
//! Heterogeneous datasets are a known limitation of this scheme; a schema
//! artifact can always be edited or deleted to override the guess.

use serde_json::Value;
use tracing::debug;

use crate::errors::{SchemaError, SchemaResult};
use crate::model::{Field, FieldKind, Record, Schema};

/// Derive a field's kind and shape parameters from one sample value.
pub fn infer_field(name: &str, value: &Value) -> SchemaResult<(FieldKind, Vec<usize>)> {
    if let Value::Array(items) = value {
        return infer_sequence(name, items);
    }

    let kind = match value {
        Value::Bool(_) => FieldKind::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldKind::Integer,
        Value::Number(_) => FieldKind::Real,
        Value::Object(_) => FieldKind::Json,
        _ => FieldKind::Text,
    };
    Ok((kind, vec![]))
}

fn infer_sequence(name: &str, items: &[Value]) -> SchemaResult<(FieldKind, Vec<usize>)> {
    match nesting_depth(items) {
        1 if items.len() == 4 => Ok((FieldKind::Quaternion, vec![4])),
        2 => {
            let cols = row_len(&items[0]);
            for row in items {
                if row_len(row) != cols {
                    return Err(SchemaError::RaggedMatrix { field: name.to_string() });
                }
            }
            Ok((FieldKind::Matrix, vec![items.len(), cols]))
        }
        d if d >= 3 => {
            // Shape along the first path only; sibling branches are checked
            // at validation time.
            let mut dims = vec![items.len()];
            let mut cursor = &items[0];
            while let Value::Array(inner) = cursor {
                if inner.is_empty() {
                    break;
                }
                dims.push(inner.len());
                cursor = &inner[0];
            }
            Ok((FieldKind::Tensor, dims))
        }
        // Depth 1 and the empty-sequence (depth 0) fallback.
        _ => Ok((FieldKind::Vec, vec![items.len()])),
    }
}

/// Nesting depth along the first element of each level. Descent stops at a
/// non-sequence or empty sequence.
fn nesting_depth(items: &[Value]) -> usize {
    if items.is_empty() {
        return 0;
    }
    let mut depth = 1;
    let mut cursor = &items[0];
    while let Value::Array(inner) = cursor {
        if inner.is_empty() {
            break;
        }
        depth += 1;
        cursor = &inner[0];
    }
    depth
}

fn row_len(row: &Value) -> usize {
    match row {
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

/// Generate a schema from a dataset's records. Only the first record is
/// sampled; fields keep the document's order.
pub fn generate_schema(records: &[Record], table: &str) -> SchemaResult<Schema> {
    let sample = records.first().ok_or(SchemaError::NoData)?;

    let mut fields = Vec::with_capacity(sample.len());
    for (name, value) in sample {
        let (kind, type_params) = infer_field(name, value)?;
        fields.push(Field::new(name.clone(), kind, type_params));
    }

    debug!(table = %table, fields = fields.len(), "schema inferred from first record");

    Ok(Schema {
        table: table.to_string(),
        fields,
        metadata: Default::default(),
    })
}
