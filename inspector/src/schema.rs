//! JSON Schema validation for tool inputs and outputs

use anyhow::{bail, Result};

/// Validate a JSON input against a schema
pub fn validate_input(input: &serde_json::Value, schema: &serde_json::Value) -> Result<()> {
    if schema.is_null() {
        return Ok(()); // No schema = no validation
    }

    let validator = jsonschema::validator_for(schema)
        .map_err(|e| anyhow::anyhow!("Invalid JSON schema: {e}"))?;

    if let Err(error) = validator.validate(input) {
        bail!("{}", error);
    }

    Ok(())
}

/// Parse JSON input bytes into a serde_json::Value
pub fn parse_input(input: &[u8]) -> Result<serde_json::Value> {
    if input.is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(input).map_err(|e| anyhow::anyhow!("Invalid JSON input: {e}"))
}

/// Serialize output to JSON bytes
pub fn serialize_output(output: &serde_json::Value) -> Result<Vec<u8>> {
    serde_json::to_vec(output).map_err(|e| anyhow::anyhow!("Failed to serialize output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn port_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "port": {"type": "integer", "minimum": 1, "maximum": 65535}
            },
            "required": ["port"]
        })
    }

    #[test]
    fn test_null_schema_accepts_anything() {
        assert!(validate_input(&json!({"anything": [1, 2]}), &serde_json::Value::Null).is_ok());
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(validate_input(&json!({"port": 8080}), &port_schema()).is_ok());
    }

    #[test]
    fn test_missing_required_field_fails() {
        let err = validate_input(&json!({}), &port_schema()).unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_out_of_range_fails() {
        assert!(validate_input(&json!({"port": 70000}), &port_schema()).is_err());
        assert!(validate_input(&json!({"port": 0}), &port_schema()).is_err());
    }

    #[test]
    fn test_parse_empty_input_is_empty_object() {
        let value = parse_input(b"").unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_input(b"{not json").is_err());
    }

    #[test]
    fn test_serialize_output() {
        let bytes = serialize_output(&json!({"open": true})).unwrap();
        assert_eq!(bytes, br#"{"open":true}"#.to_vec());
    }
}
