//! Table creation and batched upserts.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::Value;
use tracing::debug;

use schemaforge_schema::{FieldKind, Record, Schema};

use crate::encoding::{decode_tensor, encode_tensor};
use crate::{StoreError, StoreResult};

/// One SQLite database, one table per schema.
pub struct TableStore {
    conn: Connection,
}

impl TableStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA busy_timeout=5000;",
        )?;
        Ok(Self { conn })
    }

    /// In-memory store (for testing).
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create the backing table if absent, one column per schema field.
    pub fn create_table(&self, schema: &Schema) -> StoreResult<()> {
        let mut columns = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let mut col = format!("\"{}\" {}", field.name, column_type(field.kind));
            if field.primary_key {
                col.push_str(" PRIMARY KEY");
            }
            if field.unique {
                col.push_str(" UNIQUE");
            }
            columns.push(col);
        }

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            schema.table,
            columns.join(", ")
        );
        debug!(table = %schema.table, sql = %sql, "ensuring table");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Insert-or-replace all records in one transaction. Shaped fields are
    /// encoded to blobs; everything else passes through. Returns the number
    /// of rows written.
    pub fn upsert(&mut self, records: &[Record], schema: &Schema) -> StoreResult<usize> {
        let names: Vec<String> = schema
            .fields
            .iter()
            .map(|f| format!("\"{}\"", f.name))
            .collect();
        let placeholders: Vec<String> =
            (1..=schema.fields.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO \"{}\" ({}) VALUES ({})",
            schema.table,
            names.join(", "),
            placeholders.join(", ")
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                let row = bind_row(record, schema)?;
                stmt.execute(rusqlite::params_from_iter(row))?;
            }
        }
        tx.commit()?;

        debug!(table = %schema.table, rows = records.len(), "batch upserted");
        Ok(records.len())
    }

    /// Read every row back as records, decoding shaped blobs through the
    /// schema's shape parameters.
    pub fn select_all(&self, schema: &Schema) -> StoreResult<Vec<Record>> {
        let sql = format!("SELECT * FROM \"{}\"", schema.table);
        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> =
            stmt.column_names().iter().map(|n| n.to_string()).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in names.iter().enumerate() {
                let sql_value: SqlValue = row.get(i)?;
                let value = from_sql(sql_value, schema.field(name))?;
                record.insert(name.clone(), value);
            }
            out.push(record);
        }
        Ok(out)
    }
}

/// SQLite column affinity per field kind; shaped kinds are opaque blobs.
fn column_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Boolean | FieldKind::Integer => "INTEGER",
        FieldKind::Real => "REAL",
        FieldKind::Text | FieldKind::Json => "TEXT",
        FieldKind::Vec | FieldKind::Matrix | FieldKind::Tensor | FieldKind::Quaternion => {
            "BLOB"
        }
    }
}

fn bind_row(record: &Record, schema: &Schema) -> StoreResult<Vec<SqlValue>> {
    let mut row = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let value = record.get(&field.name).unwrap_or(&Value::Null);
        row.push(to_sql(&field.name, field.kind, value)?);
    }
    Ok(row)
}

fn to_sql(name: &str, kind: FieldKind, value: &Value) -> StoreResult<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    if kind.is_shaped() {
        return Ok(SqlValue::Blob(encode_tensor(name, value)?));
    }
    Ok(match value {
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        // JSON-typed fields (and any other structured leftover) persist as
        // their compact JSON text.
        other => SqlValue::Text(other.to_string()),
    })
}

fn from_sql(value: SqlValue, field: Option<&schemaforge_schema::Field>) -> StoreResult<Value> {
    Ok(match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => match field.map(|f| f.kind) {
            Some(FieldKind::Json) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
            _ => Value::String(s),
        },
        SqlValue::Blob(bytes) => match field {
            Some(f) if f.kind.is_shaped() => decode_tensor(&bytes, &f.type_params)?,
            _ => Value::Null,
        },
    })
}
