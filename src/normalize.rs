//! Row-to-document conversion.
//!
//! A raw CSV row becomes a [`Document`] holding exactly the fields the table
//! schema declares. Every representation of "missing" (absent column, empty
//! cell, NaN sentinel, unparseable numeric) collapses to
//! [`FieldValue::Absent`], which serializes as JSON `null` so the store never
//! receives a NaN-class value in a numeric field.

use crate::schema::{FieldType, TableSpec};
use crate::source::RawRecord;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// One typed field value. A `Float` is never NaN or infinite.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Absent,
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// String form used for external document ids.
    pub fn stringify(&self) -> Option<String> {
        match self {
            FieldValue::Str(value) => Some(value.clone()),
            FieldValue::Int(value) => Some(value.to_string()),
            FieldValue::Float(value) => Some(value.to_string()),
            FieldValue::Absent => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Str(value) => serializer.serialize_str(value),
            FieldValue::Int(value) => serializer.serialize_i64(*value),
            FieldValue::Float(value) => serializer.serialize_f64(*value),
            FieldValue::Absent => serializer.serialize_none(),
        }
    }
}

/// A normalized document, keyed by field name.
pub type Document = BTreeMap<String, FieldValue>;

/// Convert one raw record into a document covering every declared field.
///
/// Pure function of its inputs: unparseable values degrade to `Absent`
/// instead of erroring, and no key outside the table schema appears in the
/// output.
pub fn normalize_record(record: &RawRecord, spec: &TableSpec) -> Document {
    spec.fields
        .iter()
        .map(|field| {
            (
                field.name.clone(),
                coerce(record.get(&field.name), &field.field_type),
            )
        })
        .collect()
}

fn coerce(raw: Option<&str>, field_type: &FieldType) -> FieldValue {
    let Some(raw) = raw else {
        return FieldValue::Absent;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return FieldValue::Absent;
    }

    match field_type {
        FieldType::Keyword | FieldType::Text { .. } => FieldValue::Str(trimmed.to_string()),
        FieldType::Integer => coerce_integer(trimmed),
        FieldType::Float => match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => FieldValue::Float(value),
            _ => FieldValue::Absent,
        },
    }
}

fn coerce_integer(trimmed: &str) -> FieldValue {
    if let Ok(value) = trimmed.parse::<i64>() {
        return FieldValue::Int(value);
    }
    // Nullable integer columns come back float-formatted ("25.0") from the
    // upstream export.
    match trimmed.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value.fract() == 0.0
                && value >= i64::MIN as f64
                && value <= i64::MAX as f64 =>
        {
            FieldValue::Int(value as i64)
        }
        _ => FieldValue::Absent,
    }
}
