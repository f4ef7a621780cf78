//! JSON schema lookup and data templates

use editron_pointer::Pointer;
use serde_json::{Map, Value};

/// Source of the sub-schema for a document location
pub trait SchemaSource {
    /// Sub-schema at `pointer`; `{}` when the schema says nothing about it
    fn get(&self, pointer: &Pointer) -> Value;
}

/// [`SchemaSource`] that walks `properties` and `items` of a root schema
#[derive(Debug, Clone, Default)]
pub struct JsonSchema {
    root: Value,
}

impl JsonSchema {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl SchemaSource for JsonSchema {
    fn get(&self, pointer: &Pointer) -> Value {
        let mut node = &self.root;
        for segment in pointer.segments() {
            match child_schema(node, &segment) {
                Some(next) => node = next,
                None => return Value::Object(Map::new()),
            }
        }
        node.clone()
    }
}

fn child_schema<'a>(schema: &'a Value, segment: &str) -> Option<&'a Value> {
    if let Some(property) = schema.get("properties").and_then(|p| p.get(segment)) {
        return Some(property);
    }
    match schema.get("items") {
        Some(Value::Array(tuple)) => {
            let index: usize = segment.parse().ok()?;
            tuple
                .get(index)
                .or_else(|| schema.get("additionalItems").filter(|s| s.is_object()))
        }
        Some(items @ Value::Object(_)) => Some(items),
        _ => schema.get("additionalProperties").filter(|s| s.is_object()),
    }
}

/// Primary `type` of a schema. The first entry wins for type lists.
pub fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(kind) => Some(kind.as_str()),
        Value::Array(kinds) => kinds.first().and_then(Value::as_str),
        _ => None,
    }
}

/// Initial data for a schema: its `default`, else its first `enum` value,
/// else an empty value of its type
pub fn template(schema: &Value) -> Value {
    if let Some(default) = schema.get("default") {
        return default.clone();
    }
    if let Some(first) = schema.get("enum").and_then(Value::as_array).and_then(|e| e.first()) {
        return first.clone();
    }
    let kind = schema_type(schema).or_else(|| {
        if schema.get("properties").is_some() {
            Some("object")
        } else if schema.get("items").is_some() {
            Some("array")
        } else {
            None
        }
    });
    match kind {
        Some("object") => {
            let properties: Map<String, Value> = schema
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| props.iter().map(|(key, sub)| (key.clone(), template(sub))).collect())
                .unwrap_or_default();
            Value::Object(properties)
        }
        Some("array") => {
            let min_items = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
            let items = (0..min_items)
                .map(|index| match schema.get("items") {
                    Some(Value::Array(tuple)) => tuple.get(index).map(template).unwrap_or(Value::Null),
                    Some(items) => template(items),
                    None => Value::Null,
                })
                .collect();
            Value::Array(items)
        }
        Some("string") => Value::String(String::new()),
        Some("number") | Some("integer") => Value::from(0),
        Some("boolean") => Value::Bool(false),
        _ => Value::Null,
    }
}
