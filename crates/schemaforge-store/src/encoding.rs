//! Binary encoding for shaped numeric values.
//!
//! Values are flattened depth-first and written as little-endian f64. Shape
//! is recoverable only via the schema's `type_params`.

use serde_json::{Number, Value};

use crate::{StoreError, StoreResult};

/// Flatten a nested numeric sequence to little-endian f64 bytes.
pub fn encode_tensor(field: &str, value: &Value) -> StoreResult<Vec<u8>> {
    let mut out = Vec::new();
    flatten(field, value, &mut out)?;
    Ok(out)
}

fn flatten(field: &str, value: &Value, out: &mut Vec<u8>) -> StoreResult<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(field, item, out)?;
            }
            Ok(())
        }
        Value::Number(n) => {
            let f = n.as_f64().ok_or_else(|| StoreError::NonNumeric {
                field: field.to_string(),
                value: value.clone(),
            })?;
            out.extend_from_slice(&f.to_le_bytes());
            Ok(())
        }
        other => Err(StoreError::NonNumeric {
            field: field.to_string(),
            value: other.clone(),
        }),
    }
}

/// Rebuild the nested value from a blob and the originating shape parameters.
///
/// The blob length must equal the product of `dims` times eight bytes.
pub fn decode_tensor(bytes: &[u8], dims: &[usize]) -> StoreResult<Value> {
    let expected: usize = if dims.is_empty() {
        0
    } else {
        dims.iter().product()
    };
    if bytes.len() != expected * 8 {
        return Err(StoreError::ShapeMismatch {
            len: bytes.len(),
            dims: dims.to_vec(),
        });
    }

    let mut flat = Vec::with_capacity(expected);
    for chunk in bytes.chunks_exact(8) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        let f = f64::from_le_bytes(buf);
        let n = Number::from_f64(f).ok_or(StoreError::NonFinite)?;
        flat.push(Value::Number(n));
    }

    Ok(nest(&mut flat.into_iter(), dims))
}

fn nest(flat: &mut std::vec::IntoIter<Value>, dims: &[usize]) -> Value {
    match dims {
        [] => flat.next().unwrap_or(Value::Null),
        [n] => Value::Array(flat.take(*n).collect()),
        [n, rest @ ..] => {
            Value::Array((0..*n).map(|_| nest(flat, rest)).collect())
        }
    }
}
