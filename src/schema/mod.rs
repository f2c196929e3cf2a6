//! Table schema definitions.
//!
//! A [`TableSpec`] describes one target index: its name, the ordered field
//! list with semantic types, and the optional identifier field used for
//! upsert-by-id writes. Specs are supplied once at startup by the
//! [`catalog`] and never mutated afterwards.

pub mod catalog;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table {index}: identifier field `{id_field}` is not declared in the field list")]
    UnknownIdField { index: String, id_field: String },
}

/// Semantic type of a single indexed field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Exact-match string.
    Keyword,
    /// Analyzed free text. The generated mapping always carries a parallel
    /// exact-match `keyword` sub-field.
    Text { analyzer: Option<String> },
    Integer,
    Float,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

/// Schema for one target index.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub index: String,
    pub fields: Vec<Field>,
    /// Field whose value becomes the external document id, when set.
    pub id_field: Option<String>,
}

impl TableSpec {
    /// Check that `id_field`, if present, names a declared field.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if let Some(id_field) = &self.id_field {
            if !self.fields.iter().any(|field| &field.name == id_field) {
                return Err(SchemaError::UnknownIdField {
                    index: self.index.clone(),
                    id_field: id_field.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn keyword(name: &str) -> Field {
    Field {
        name: name.to_string(),
        field_type: FieldType::Keyword,
    }
}

pub fn text(name: &str) -> Field {
    Field {
        name: name.to_string(),
        field_type: FieldType::Text { analyzer: None },
    }
}

pub fn spanish_text(name: &str) -> Field {
    Field {
        name: name.to_string(),
        field_type: FieldType::Text {
            analyzer: Some("spanish_analyzer".to_string()),
        },
    }
}

pub fn integer(name: &str) -> Field {
    Field {
        name: name.to_string(),
        field_type: FieldType::Integer,
    }
}

pub fn float(name: &str) -> Field {
    Field {
        name: name.to_string(),
        field_type: FieldType::Float,
    }
}
