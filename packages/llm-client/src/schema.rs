//! Schema generation for structured chat output.
//!
//! Uses `schemars` to derive JSON schemas from Rust types. Strict-mode
//! endpoints require `additionalProperties: false` on every object schema,
//! which `schemars` does not emit on its own.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Types usable as a structured chat output.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// JSON schema for this type, normalized for strict mode.
    fn output_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();
        deny_additional_properties(&mut value);
        value
    }

    /// Schema name used in logs.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Recursively set `additionalProperties: false` on object schemas.
fn deny_additional_properties(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if map.get("type") == Some(&serde_json::Value::String("object".to_string())) {
                map.insert(
                    "additionalProperties".to_string(),
                    serde_json::Value::Bool(false),
                );
            }
            for (_, v) in map.iter_mut() {
                deny_additional_properties(v);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                deny_additional_properties(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Heading {
        title: String,
        summary: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Plan {
        headings: Vec<Heading>,
    }

    #[test]
    fn test_schema_is_object() {
        let schema = Plan::output_schema();
        assert!(schema.is_object());
    }

    #[test]
    fn test_nested_objects_deny_additional_properties() {
        let schema = Plan::output_schema();
        let rendered = serde_json::to_string(&schema).unwrap();
        assert!(rendered.contains("\"additionalProperties\":false"));
    }
}
