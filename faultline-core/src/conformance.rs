//! JSON Schema export of field declarations and record validation.
//!
//! The exported document covers per-field constraints only; relation
//! constraints are not expressible in it.

use jsonschema::{draft202012, Validator};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::warn;

use crate::error::ConformanceError;
use crate::field::{Field, FieldKind, FieldMap, NumericBounds};
use crate::rng::float_value;
use crate::schema::Schema;

pub const DRAFT202012: &str = "https://json-schema.org/draft/2020-12/schema";

/// The draft 2020-12 document for a whole schema.
pub fn schema_document(schema: &Schema) -> JsonValue {
    let mut document = object_schema(schema.fields());
    if let JsonValue::Object(map) = &mut document {
        map.insert("$schema".to_string(), JsonValue::String(DRAFT202012.to_string()));
    }
    document
}

/// The JSON Schema fragment for one field, including nullability.
pub fn field_schema(field: &Field) -> JsonValue {
    let base = match field.kind() {
        FieldKind::Boolean => json!({"type": "boolean"}),
        FieldKind::Char(spec) => {
            let mut map = JsonMap::new();
            map.insert("type".to_string(), json!("string"));
            let min = spec.min_length.unwrap_or(0);
            let min = if spec.allow_blank { min } else { min.max(1) };
            if min > 0 {
                map.insert("minLength".to_string(), json!(min));
            }
            if let Some(max) = spec.max_length {
                map.insert("maxLength".to_string(), json!(max));
            }
            let sized = JsonValue::Object(map);
            if spec.allow_blank && min > 0 {
                json!({"anyOf": [{"const": ""}, sized]})
            } else {
                sized
            }
        }
        FieldKind::Integer(bounds) => {
            numeric_schema("integer", bounds, |value| json!(value))
        }
        FieldKind::Float(bounds) => numeric_schema("number", bounds, float_value),
        FieldKind::Choice(spec) => {
            let mut choices = spec.choices.clone();
            let blank = JsonValue::String(String::new());
            if spec.allow_blank && !choices.contains(&blank) {
                choices.push(blank);
            }
            json!({"enum": choices})
        }
        FieldKind::Dict(fields) => object_schema(fields),
        FieldKind::List(spec) => {
            let mut map = JsonMap::new();
            map.insert("type".to_string(), json!("array"));
            let items: Vec<JsonValue> = spec.items.iter().map(field_schema).collect();
            let items = match <[JsonValue; 1]>::try_from(items) {
                Ok([single]) => single,
                Err(items) => json!({"anyOf": items}),
            };
            map.insert("items".to_string(), items);
            if let Some(min) = spec.effective_min_length() {
                map.insert("minItems".to_string(), json!(min));
            }
            if let Some(max) = spec.effective_max_length() {
                map.insert("maxItems".to_string(), json!(max));
            }
            JsonValue::Object(map)
        }
    };
    if field.allows_null() {
        json!({"anyOf": [base, {"type": "null"}]})
    } else {
        base
    }
}

fn numeric_schema<T: Copy>(
    kind: &str,
    bounds: &NumericBounds<T>,
    to_json: impl Fn(T) -> JsonValue,
) -> JsonValue {
    let mut map = JsonMap::new();
    map.insert("type".to_string(), json!(kind));
    if let Some(min) = bounds.min_value {
        map.insert("minimum".to_string(), to_json(min));
    }
    if let Some(max) = bounds.max_value {
        map.insert("maximum".to_string(), to_json(max));
    }
    JsonValue::Object(map)
}

fn object_schema(fields: &FieldMap) -> JsonValue {
    let mut properties = JsonMap::new();
    let mut required = Vec::new();
    for (name, field) in fields.iter() {
        properties.insert(name.to_string(), field_schema(field));
        if field.is_required() {
            required.push(JsonValue::String(name.to_string()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Validates records against a schema's exported document.
pub struct ConformanceChecker {
    validator: Validator,
}

impl ConformanceChecker {
    pub fn new(schema: &Schema) -> Result<Self, ConformanceError> {
        let document = schema_document(schema);
        let validator = draft202012::new(&document)
            .map_err(|error| ConformanceError::InvalidSchema(error.to_string()))?;
        Ok(Self { validator })
    }

    pub fn conforms(&self, record: &JsonValue) -> bool {
        self.validator.is_valid(record)
    }

    /// One message per violated keyword.
    pub fn violations(&self, record: &JsonValue) -> Vec<String> {
        self.validator
            .iter_errors(record)
            .map(|error| error.to_string())
            .collect()
    }

    /// Logs a warning when the valid baseline does not conform.
    pub fn check_baseline(&self, record: &JsonValue) -> bool {
        let violations = self.violations(record);
        if violations.is_empty() {
            return true;
        }
        warn!(?violations, "valid record does not conform to exported schema");
        false
    }
}

impl std::fmt::Debug for ConformanceChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConformanceChecker").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/internal/conformance_unit_tests.rs"]
mod tests;
