//! Tool schema validity tests.
//!
//! The generateImage tool schema must be a JSON object schema that lists
//! `prompt` as required and `imageBase64` as an optional string.

use serde_json::Value;

/// Validates that a JSON schema has the required structure.
fn validate_json_schema(schema: &Value) -> Result<(), String> {
    let obj = schema
        .as_object()
        .ok_or_else(|| "Schema must be an object".to_string())?;

    if let Some(type_val) = obj.get("type") {
        if type_val != "object" {
            return Err(format!("Expected type 'object', got {:?}", type_val));
        }
    }

    if let Some(properties) = obj.get("properties") {
        if !properties.is_object() {
            return Err("Properties must be an object".to_string());
        }
    }

    Ok(())
}

/// Names listed under `required`.
fn required_fields(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_task_mcp::server::GenerateImageToolParams;
    use schemars::schema_for;

    fn tool_schema() -> Value {
        serde_json::to_value(schema_for!(GenerateImageToolParams)).unwrap()
    }

    /// Test that JSON schema validation works correctly.
    #[test]
    fn test_json_schema_validation() {
        let valid_schema = serde_json::json!({
            "type": "object",
            "properties": { "prompt": { "type": "string" } },
            "required": ["prompt"]
        });
        assert!(validate_json_schema(&valid_schema).is_ok());

        let invalid_schema = serde_json::json!({ "type": "string" });
        assert!(validate_json_schema(&invalid_schema).is_err());
    }

    /// Test that the generateImage params produce a valid schema.
    #[test]
    fn test_generate_image_schema_validity() {
        let schema = tool_schema();
        assert!(validate_json_schema(&schema).is_ok());

        let properties = schema.get("properties").unwrap().as_object().unwrap();
        assert!(properties.contains_key("prompt"), "Schema should have 'prompt' property");
        assert!(
            properties.contains_key("imageBase64"),
            "Schema should expose the camelCase 'imageBase64' property"
        );
        assert!(!properties.contains_key("image_base64"));
    }

    /// Only the prompt is required.
    #[test]
    fn test_generate_image_required_fields() {
        assert_eq!(required_fields(&tool_schema()), vec!["prompt".to_string()]);
    }

    /// Every property carries a description for the client.
    #[test]
    fn test_generate_image_properties_are_described() {
        let schema = tool_schema();
        let properties = schema.get("properties").unwrap().as_object().unwrap();
        for (name, property) in properties {
            let description = property.get("description").and_then(Value::as_str);
            assert!(
                description.is_some_and(|d| !d.is_empty()),
                "Property '{}' should have a description",
                name
            );
        }
    }
}
