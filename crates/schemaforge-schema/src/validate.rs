//! Shape-aware record validation.

use serde_json::Value;

use crate::errors::ValidationError;
use crate::model::{FieldKind, Record, Schema};

/// Check one record against a schema.
///
/// Fields absent from the record (or explicitly null) skip type and shape
/// checks; fields are nullable by default. Returns the first violation.
pub fn validate_record(record: &Record, schema: &Schema) -> Result<(), ValidationError> {
    for field in &schema.fields {
        let value = match record.get(&field.name) {
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };

        match field.kind {
            FieldKind::Text => validate_text(&field.name, value)?,
            FieldKind::Integer | FieldKind::Real => {
                validate_numeric(&field.name, field.kind, value)?;
            }
            FieldKind::Vec => {
                let expected = field.type_params.first().copied().unwrap_or(0);
                let items = as_sequence(&field.name, value)?;
                if items.len() != expected {
                    return Err(ValidationError::VecLength {
                        field: field.name.clone(),
                        expected,
                        actual: items.len(),
                    });
                }
                numeric_elements(&field.name, items)?;
            }
            FieldKind::Matrix => validate_matrix(&field.name, &field.type_params, value)?,
            FieldKind::Tensor => {
                let items = as_sequence(&field.name, value)?;
                validate_tensor(&field.name, items, &field.type_params, 0)?;
            }
            FieldKind::Quaternion => {
                let items = as_sequence(&field.name, value)?;
                if items.len() != 4 {
                    return Err(ValidationError::QuaternionLength {
                        field: field.name.clone(),
                        actual: items.len(),
                    });
                }
                numeric_elements(&field.name, items)?;
                // Unit-norm deliberately unchecked; no tolerance policy is
                // defined for stored quaternions.
            }
            // BOOLEAN and JSON carry no additional structural check.
            FieldKind::Boolean | FieldKind::Json => {}
        }
    }
    Ok(())
}

fn validate_text(field: &str, value: &Value) -> Result<(), ValidationError> {
    let ok = match value {
        Value::String(s) => !s.chars().any(char::is_control),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::Text {
            field: field.to_string(),
            value: value.clone(),
        })
    }
}

fn validate_numeric(field: &str, kind: FieldKind, value: &Value) -> Result<(), ValidationError> {
    // Both INTEGER and REAL accept any numeric value.
    if value.is_number() {
        Ok(())
    } else {
        Err(ValidationError::Numeric {
            field: field.to_string(),
            expected: kind.as_str(),
            value: value.clone(),
        })
    }
}

fn validate_matrix(field: &str, params: &[usize], value: &Value) -> Result<(), ValidationError> {
    let (rows, cols) = match params {
        [r, c, ..] => (*r, *c),
        _ => (0, 0),
    };
    let items = as_sequence(field, value)?;
    if items.len() != rows {
        return Err(ValidationError::MatrixRows {
            field: field.to_string(),
            expected: rows,
            actual: items.len(),
        });
    }
    for (i, row) in items.iter().enumerate() {
        let row_items = as_sequence(field, row)?;
        if row_items.len() != cols {
            return Err(ValidationError::MatrixCols {
                field: field.to_string(),
                row: i,
                expected: cols,
                actual: row_items.len(),
            });
        }
        numeric_elements(field, row_items)?;
    }
    Ok(())
}

/// Recursive shape check: at nesting level `dim`, every sub-sequence must
/// have length `shape[dim]`.
fn validate_tensor(
    field: &str,
    items: &[Value],
    shape: &[usize],
    dim: usize,
) -> Result<(), ValidationError> {
    let Some(&expected) = shape.first() else {
        return Ok(());
    };
    if items.len() != expected {
        return Err(ValidationError::TensorDim {
            field: field.to_string(),
            dim,
            expected,
            actual: items.len(),
        });
    }
    if shape.len() == 1 {
        return numeric_elements(field, items);
    }
    for item in items {
        let inner = as_sequence(field, item)?;
        validate_tensor(field, inner, &shape[1..], dim + 1)?;
    }
    Ok(())
}

/// Every element of a shaped field's innermost sequences must be numeric;
/// anything else cannot be carried by the binary column encoding.
fn numeric_elements(field: &str, items: &[Value]) -> Result<(), ValidationError> {
    for item in items {
        if !item.is_number() {
            return Err(ValidationError::NonNumericElement {
                field: field.to_string(),
                value: item.clone(),
            });
        }
    }
    Ok(())
}

fn as_sequence<'a>(field: &str, value: &'a Value) -> Result<&'a Vec<Value>, ValidationError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ValidationError::NotASequence {
            field: field.to_string(),
            value: value.clone(),
        }),
    }
}
