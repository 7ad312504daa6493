//! JSON Schema cleanup for Gemini function declarations

/// Keywords outside Gemini's OpenAPI Schema subset. Sending them yields
/// `INVALID_ARGUMENT`.
const UNSUPPORTED_KEYWORDS: &[&str] = &["default", "additionalProperties", "$schema", "$id", "examples"];

/// Recursively remove unsupported keywords from a schema.
///
/// Keys of a `properties` map are property names, not keywords, so a
/// property called `default` survives.
pub(crate) fn strip_unsupported_keywords(schema: &mut serde_json::Value) {
    match schema {
        serde_json::Value::Object(obj) => {
            for keyword in UNSUPPORTED_KEYWORDS {
                obj.remove(*keyword);
            }
            for (key, value) in obj.iter_mut() {
                if key == "properties" {
                    if let Some(properties) = value.as_object_mut() {
                        properties.values_mut().for_each(strip_unsupported_keywords);
                    }
                } else {
                    strip_unsupported_keywords(value);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_unsupported_keywords),
        _ => {}
    }
}
