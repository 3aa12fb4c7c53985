//! Starter workflow template.
//!
//! A static workflow document with a device placeholder. Substitution walks
//! the parsed JSON and rewrites string values, so the result is always valid
//! JSON regardless of what the placeholder sits next to.

use serde_json::Value;

/// Token replaced by the device id.
pub const PLACEHOLDER: &str = "{{DEVICE_ID}}";

const TEMPLATE_SOURCE: &str = include_str!("template.json");

/// Parse the bundled template.
pub fn base_template() -> Result<Value, serde_json::Error> {
    serde_json::from_str(TEMPLATE_SOURCE)
}

/// Replace every placeholder occurrence in string values and object keys.
pub fn personalize(template: &Value, device_id: &str) -> Value {
    match template {
        Value::String(s) => Value::String(s.replace(PLACEHOLDER, device_id)),
        Value::Array(items) => Value::Array(items.iter().map(|v| personalize(v, device_id)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.replace(PLACEHOLDER, device_id), personalize(v, device_id)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The bundled template personalized for `device_id`.
pub fn workflow_template(device_id: &str) -> Result<Value, serde_json::Error> {
    Ok(personalize(&base_template()?, device_id))
}
