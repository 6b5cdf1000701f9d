//! Minimal JSON-Schema (draft-07 subset) validator for tool arguments.
//!
//! Covers `object`/`array`/`string`/`number`/`integer`/`boolean`, `properties`,
//! `required`, `enum`, and `items` — enough to validate the parameter schemas
//! tools declare in their [`ToolSpec`](crate::tool_source::ToolSpec). Not a
//! general-purpose validator: unknown keywords are ignored rather than
//! rejected, so schemas can carry `description` fields for the model without
//! tripping validation.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validates `value` against `schema`, collecting every violation rather than
/// stopping at the first one so a caller can report a complete error message.
pub fn validate(schema: &Value, value: &Value) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_node(schema, value, "$", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_node(schema: &Value, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(Value::Array(enum_values)) = schema.get("enum") {
        if !enum_values.contains(value) {
            errors.push(ValidationError {
                path: path.to_string(),
                message: "value is not one of the allowed enum values".to_string(),
            });
        }
    }

    let Some(Value::String(ty)) = schema.get("type") else {
        return;
    };

    match ty.as_str() {
        "object" => {
            let Some(obj) = value.as_object() else {
                errors.push(type_error(path, "object", value));
                return;
            };
            if let Some(Value::Array(required)) = schema.get("required") {
                for req in required {
                    if let Some(key) = req.as_str() {
                        if !obj.contains_key(key) {
                            errors.push(ValidationError {
                                path: format!("{path}.{key}"),
                                message: "missing required property".to_string(),
                            });
                        }
                    }
                }
            }
            if let Some(Value::Object(props)) = schema.get("properties") {
                for (key, prop_schema) in props {
                    if let Some(v) = obj.get(key) {
                        validate_node(prop_schema, v, &format!("{path}.{key}"), errors);
                    }
                }
            }
        }
        "array" => {
            let Some(items) = value.as_array() else {
                errors.push(type_error(path, "array", value));
                return;
            };
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    validate_node(item_schema, item, &format!("{path}[{i}]"), errors);
                }
            }
        }
        "string" => {
            if !value.is_string() {
                errors.push(type_error(path, "string", value));
            }
        }
        "number" => {
            if !value.is_number() {
                errors.push(type_error(path, "number", value));
            }
        }
        "integer" => {
            if !value.is_i64() && !value.is_u64() {
                errors.push(type_error(path, "integer", value));
            }
        }
        "boolean" => {
            if !value.is_boolean() {
                errors.push(type_error(path, "boolean", value));
            }
        }
        _ => {}
    }
}

fn type_error(path: &str, expected: &str, actual: &Value) -> ValidationError {
    ValidationError {
        path: path.to_string(),
        message: format!("expected {expected}, got {}", describe(actual)),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "count": {"type": "integer"},
                "mode": {"type": "string", "enum": ["fast", "slow"]}
            },
            "required": ["name"]
        })
    }

    #[test]
    fn accepts_valid_value() {
        let v = json!({"name": "a", "count": 3, "mode": "fast"});
        assert!(validate(&schema(), &v).is_ok());
    }

    #[test]
    fn rejects_missing_required() {
        let v = json!({"count": 3});
        let err = validate(&schema(), &v).unwrap_err();
        assert!(err.iter().any(|e| e.path.ends_with("name")));
    }

    #[test]
    fn rejects_wrong_type() {
        let v = json!({"name": "a", "count": "not a number"});
        let err = validate(&schema(), &v).unwrap_err();
        assert!(err.iter().any(|e| e.path.ends_with("count")));
    }

    #[test]
    fn rejects_enum_violation() {
        let v = json!({"name": "a", "mode": "turbo"});
        let err = validate(&schema(), &v).unwrap_err();
        assert!(err.iter().any(|e| e.path.ends_with("mode")));
    }

    #[test]
    fn nested_array_items_are_validated() {
        let schema = json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}}}
        });
        let v = json!({"tags": ["a", 1]});
        let err = validate(&schema, &v).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].path.contains("tags[1]"));
    }
}
