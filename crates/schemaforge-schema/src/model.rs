//! Schema and record model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One logical row: field name → untyped value. Records are ephemeral and
/// live only between loading and persistence.
pub type Record = serde_json::Map<String, Value>;

/// Logical field type. Shape parameters for the structured kinds live in
/// [`Field::type_params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldKind {
    Boolean,
    Integer,
    Real,
    Text,
    Json,
    Vec,
    Matrix,
    Tensor,
    Quaternion,
}

impl FieldKind {
    /// Structured numeric kinds stored as opaque binary blobs.
    pub fn is_shaped(self) -> bool {
        matches!(self, Self::Vec | Self::Matrix | Self::Tensor | Self::Quaternion)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Json => "JSON",
            Self::Vec => "VEC",
            Self::Matrix => "MATRIX",
            Self::Tensor => "TENSOR",
            Self::Quaternion => "QUATERNION",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Shape parameters: VEC `[len]`, MATRIX `[rows, cols]`, TENSOR the full
    /// dimension vector, QUATERNION `[4]`. Empty for primitive kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<usize>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, type_params: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params,
            unique: false,
            primary_key: false,
        }
    }
}

fn is_false(v: &bool) -> bool {
    !v
}

/// Schema metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub private: bool,
}

/// One schema per dataset file, keyed by the dataset's path relative to the
/// data root. Immutable once persisted; regeneration replaces the whole
/// schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub table: String,
    pub fields: Vec<Field>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl Schema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
