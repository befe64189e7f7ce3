//! Dummy-input generation from version schemas
//!
//! Two schema dialects are accepted:
//!
//! 1. Wrapped style: `{"input": {"text": "str"}, "output": {"score": "float"}}`
//!    where leaf values are simple type names.
//! 2. JSON Schema style: `{"type": "object", "properties": {...}}` where each
//!    property may carry an `example` used verbatim.
//!
//! An output section is only returned for the wrapped style; it drives strict
//! output checks after the smoke run.

use serde_json::{json, Map, Value};

/// Simple type names the strict output checker understands
const SIMPLE_TYPES: [&str; 4] = ["float", "int", "str", "bool"];

fn value_from_simple_type(typ: &str) -> Value {
    match typ {
        "float" => json!(1.0),
        "int" => json!(42),
        "str" => json!("example"),
        "bool" => json!(true),
        "object" => json!({}),
        _ => Value::Null,
    }
}

fn build_from_custom_schema(schema: &Map<String, Value>) -> (Value, Option<Map<String, Value>>) {
    let input_schema = schema
        .get("input")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut dummy = Map::new();
    for (key, typ) in &input_schema {
        let value = match typ {
            Value::String(name) => value_from_simple_type(name),
            Value::Object(nested) => {
                let mut inner = Map::new();
                for (k2, t2) in nested {
                    let v2 = match t2 {
                        Value::String(name) => value_from_simple_type(name),
                        _ => Value::Null,
                    };
                    inner.insert(k2.clone(), v2);
                }
                Value::Object(inner)
            }
            _ => Value::Null,
        };
        dummy.insert(key.clone(), value);
    }

    let output = schema.get("output").and_then(Value::as_object).cloned();
    (Value::Object(dummy), output)
}

fn build_from_json_schema(schema: &Map<String, Value>) -> (Value, Option<Map<String, Value>>) {
    let props = schema
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut data = Map::new();
    for (name, prop) in &props {
        let Some(prop) = prop.as_object() else {
            data.insert(name.clone(), json!("example"));
            continue;
        };

        if let Some(example) = prop.get("example") {
            if !example.is_null() {
                data.insert(name.clone(), example.clone());
                continue;
            }
        }

        let value = match prop.get("type").and_then(Value::as_str) {
            Some("string") => json!("example text"),
            Some("number") => json!(1.0),
            Some("integer") => json!(1),
            Some("boolean") => json!(true),
            Some("object") => json!({}),
            Some("array") => json!([]),
            _ => json!("example"),
        };
        data.insert(name.clone(), value);
    }

    (Value::Object(data), None)
}

/// Build a dummy input (and, for the wrapped style, the output section)
/// from a parsed schema document.
pub fn dummy_input_from_schema(schema: &Value) -> (Value, Option<Map<String, Value>>) {
    let Some(obj) = schema.as_object() else {
        return (json!({}), None);
    };

    if let Some(input_schema) = obj.get("input") {
        // JSON Schema may be nested inside "input"
        if let Some(inner) = input_schema.as_object() {
            if inner.contains_key("properties") {
                return build_from_json_schema(inner);
            }
        }
        return build_from_custom_schema(obj);
    }

    if obj.contains_key("properties") || obj.get("type").and_then(Value::as_str) == Some("object") {
        return build_from_json_schema(obj);
    }

    (json!({}), None)
}

/// Strict output check against a wrapped-style output section. Only applies
/// when every declared value is a simple type name; otherwise the output is
/// accepted as-is.
pub fn check_output(result: &Map<String, Value>, output_schema: &Map<String, Value>) -> Result<(), String> {
    let strict = !output_schema.is_empty()
        && output_schema
            .values()
            .all(|v| v.as_str().is_some_and(|s| SIMPLE_TYPES.contains(&s)));
    if !strict {
        return Ok(());
    }

    for (key, typ) in output_schema {
        let Some(value) = result.get(key) else {
            return Err(format!("Missing key in output: {}", key));
        };
        let typ = typ.as_str().unwrap_or_default();
        let ok = match typ {
            // ints are acceptable where a float is declared
            "float" => value.is_number(),
            "int" => value.is_i64() || value.is_u64(),
            "str" => value.is_string(),
            "bool" => value.is_boolean(),
            _ => true,
        };
        if !ok {
            return Err(format!("Wrong type for '{}': expected {}", key, typ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_schema_builds_typed_dummy() {
        let schema = json!({
            "input": {"text": "str", "age": "int", "score": "float", "flag": "bool"},
            "output": {"prediction": "float"}
        });
        let (input, output) = dummy_input_from_schema(&schema);
        assert_eq!(input["text"], "example");
        assert_eq!(input["age"], 42);
        assert_eq!(input["score"], 1.0);
        assert_eq!(input["flag"], true);
        assert_eq!(output.unwrap()["prediction"], "float");
    }

    #[test]
    fn test_custom_schema_nested_object() {
        let schema = json!({"input": {"meta": {"lang": "str"}}});
        let (input, _) = dummy_input_from_schema(&schema);
        assert_eq!(input["meta"]["lang"], "example");
    }

    #[test]
    fn test_json_schema_prefers_example() {
        let schema = json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "example": "This is great!"},
                "count": {"type": "integer"}
            }
        });
        let (input, output) = dummy_input_from_schema(&schema);
        assert_eq!(input["text"], "This is great!");
        assert_eq!(input["count"], 1);
        assert!(output.is_none());
    }

    #[test]
    fn test_json_schema_nested_inside_input() {
        let schema = json!({
            "input": {
                "properties": {"text": {"type": "string"}}
            }
        });
        let (input, _) = dummy_input_from_schema(&schema);
        assert_eq!(input["text"], "example text");
    }

    #[test]
    fn test_unrecognized_schema_falls_back_to_empty() {
        let (input, output) = dummy_input_from_schema(&json!([1, 2, 3]));
        assert_eq!(input, json!({}));
        assert!(output.is_none());
    }

    #[test]
    fn test_check_output_strict_pass_and_fail() {
        let output_schema = json!({"prediction": "float", "label": "str"});
        let output_schema = output_schema.as_object().unwrap();

        let good = json!({"prediction": 0.93, "label": "positive"});
        assert!(check_output(good.as_object().unwrap(), output_schema).is_ok());

        let missing = json!({"prediction": 0.93});
        assert!(check_output(missing.as_object().unwrap(), output_schema).is_err());

        let wrong_type = json!({"prediction": "high", "label": "positive"});
        assert!(check_output(wrong_type.as_object().unwrap(), output_schema).is_err());
    }

    #[test]
    fn test_check_output_lenient_when_schema_not_simple() {
        let output_schema = json!({"prediction": {"type": "number"}});
        let result = json!({"anything": true});
        assert!(check_output(
            result.as_object().unwrap(),
            output_schema.as_object().unwrap()
        )
        .is_ok());
    }
}
