//! Argument Validation
//!
//! Checks tool arguments against the tool's `ParameterSchema` before the tool
//! runs. Schemas are advisory to the model and authoritative here.
//!
//! Only the subset of JSON Schema that `ParameterSchema` can express is
//! checked: object shape, required fields, primitive types, string enums, and
//! array items. Unknown extra properties are allowed.

use serde_json::Value;

use builder_agent_llm::ParameterSchema;

/// Validate `args` against `schema`, returning a message naming the first
/// offending path.
///
/// `null` arguments are treated as an empty object, since several providers
/// send nothing for tools without parameters.
pub fn validate_args(schema: &ParameterSchema, args: &Value) -> Result<(), String> {
    let empty = Value::Object(Default::default());
    let args = if args.is_null() { &empty } else { args };
    validate_value(schema, args, "arguments")
}

fn validate_value(schema: &ParameterSchema, value: &Value, path: &str) -> Result<(), String> {
    match schema.schema_type.as_str() {
        "object" => {
            let obj = value
                .as_object()
                .ok_or_else(|| format!("{} must be an object, got {}", path, type_name(value)))?;

            for field in schema.required.iter().flatten() {
                match obj.get(field) {
                    None | Some(Value::Null) => {
                        return Err(format!("missing required field '{}' in {}", field, path));
                    }
                    Some(_) => {}
                }
            }

            if let Some(props) = &schema.properties {
                for (key, val) in obj {
                    if val.is_null() {
                        continue;
                    }
                    if let Some(prop_schema) = props.get(key) {
                        validate_value(prop_schema, val, &format!("{}.{}", path, key))?;
                    }
                }
            }
            Ok(())
        }
        "array" => {
            let items = value
                .as_array()
                .ok_or_else(|| format!("{} must be an array, got {}", path, type_name(value)))?;
            if let Some(item_schema) = &schema.items {
                for (i, item) in items.iter().enumerate() {
                    validate_value(item_schema, item, &format!("{}[{}]", path, i))?;
                }
            }
            Ok(())
        }
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("{} must be a string, got {}", path, type_name(value)))?;
            if let Some(allowed) = &schema.enum_values {
                if !allowed.iter().any(|a| a == s) {
                    return Err(format!(
                        "{} must be one of [{}], got '{}'",
                        path,
                        allowed.join(", "),
                        s
                    ));
                }
            }
            Ok(())
        }
        "integer" => {
            if value.is_i64() || value.is_u64() {
                Ok(())
            } else {
                Err(format!("{} must be an integer, got {}", path, type_name(value)))
            }
        }
        "number" => {
            if value.is_number() {
                Ok(())
            } else {
                Err(format!("{} must be a number, got {}", path, type_name(value)))
            }
        }
        "boolean" => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(format!("{} must be a boolean, got {}", path, type_name(value)))
            }
        }
        // Unknown schema types are not checked.
        _ => Ok(()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
