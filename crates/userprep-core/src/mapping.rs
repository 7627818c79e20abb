//! Column → type mapping loaded from a JSON document.
//!
//! The document is a flat object whose key order is the output column order.
//! After parsing, the identity columns are forced to fixed types with
//! [`apply_identity_overrides`]; those values win over whatever the document
//! declares.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{config, ConfigError, PrepResult};

/// Identity columns and the types they always carry, in the order they are
/// appended when the document does not mention them.
pub const IDENTITY_OVERRIDES: [(&str, &str); 5] = [
    ("id", "integer"),
    ("email", "string"),
    ("name", "string"),
    ("phone", "string"),
    ("address", "string"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedColumn {
    pub column: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    columns: Vec<MappedColumn>,
}

impl TypeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type of `column`, keeping its position when it already exists.
    pub fn set(&mut self, column: &str, type_name: &str) {
        match self.columns.iter_mut().find(|entry| entry.column == column) {
            Some(entry) => entry.type_name = type_name.to_string(),
            None => self.columns.push(MappedColumn {
                column: column.to_string(),
                type_name: type_name.to_string(),
            }),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.type_name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappedColumn> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|entry| entry.column.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn entries(&self) -> &[MappedColumn] {
        &self.columns
    }
}

pub fn parse_type_mapping(contents: &str) -> PrepResult<TypeMapping> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let value: Value = serde_json::from_str(contents)
        .map_err(|err| Box::new(ConfigError(format!("mapping document is not valid json: {err}"))))?;
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(Box::new(ConfigError(format!(
                "mapping document must be a json object, got {}",
                json_kind(&other)
            ))))
        }
    };

    let mut mapping = TypeMapping::new();
    for (column, type_value) in object {
        match type_value {
            Value::String(type_name) => mapping.set(&column, &type_name),
            other => {
                return Err(Box::new(ConfigError(format!(
                    "mapping column {column} must map to a type name string, got {}",
                    json_kind(&other)
                ))))
            }
        }
    }
    Ok(mapping)
}

pub fn apply_identity_overrides(mapping: &mut TypeMapping) {
    for (column, type_name) in IDENTITY_OVERRIDES {
        mapping.set(column, type_name);
    }
}

pub fn validate_type_names(mapping: &TypeMapping) -> PrepResult<()> {
    for entry in mapping.iter() {
        config::validate_type_name(&entry.column, &entry.type_name)?;
    }
    Ok(())
}

/// Parse, force the identity types, then check every type name resolves.
pub fn resolve_type_mapping(contents: &str) -> PrepResult<TypeMapping> {
    let mut mapping = parse_type_mapping(contents)?;
    apply_identity_overrides(&mut mapping);
    validate_type_names(&mapping)?;
    Ok(mapping)
}

pub fn load_type_mapping(path: &Path) -> PrepResult<TypeMapping> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        Box::new(ConfigError(format!(
            "failed to read mapping document at {}: {err}",
            path.display()
        )))
    })?;
    resolve_type_mapping(&contents)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
