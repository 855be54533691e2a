//! Recovery of the output image URL from a completed task's result payload.
//!
//! The API usually reports the output in `image_url`, but some completions
//! only mention it inside the free-form `text` field. When `image_url` is
//! unset, the first `http(s)` URL in `text` whose path ends in a known image
//! extension is copied into `image_url`. A field counts as unset when it is
//! absent, `null`, `false`, `0` or an empty string; any other value, even a
//! non-string one, is left alone.
//!
//! Pattern: `https?://` followed by characters other than whitespace, `"` and
//! `)`, ending in `.jpg`, `.jpeg`, `.png`, `.webp` or `.gif` (any case).

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Field carrying the output URL.
pub const IMAGE_URL_FIELD: &str = "image_url";

/// Free-text field that may embed the output URL.
pub const TEXT_FIELD: &str = "text";

fn image_url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)https?://[^\s")]+\.(?:jpg|jpeg|png|webp|gif)"#)
            .expect("must be valid regex")
    })
}

/// First image URL embedded in `text`, if any.
pub fn extract_image_url(text: &str) -> Option<&str> {
    image_url_pattern().find(text).map(|m| m.as_str())
}

/// Whether `value` carries anything: not `null`, `false`, zero or `""`.
pub fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The payload's `image_url` when it is a non-empty string.
pub fn image_url(payload: &Value) -> Option<&str> {
    payload
        .get(IMAGE_URL_FIELD)
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}

/// Backfill `image_url` from `text` in place.
///
/// Non-object payloads, payloads whose `image_url` is already set (whatever
/// its type) and payloads whose text holds no image URL are left untouched.
/// Never fails.
/// Applying it twice is the same as applying it once.
pub fn normalize_result(payload: &mut Value) {
    if payload.get(IMAGE_URL_FIELD).is_some_and(is_set) {
        return;
    }

    let Some(object) = payload.as_object_mut() else {
        return;
    };

    let extracted = object
        .get(TEXT_FIELD)
        .and_then(Value::as_str)
        .and_then(extract_image_url)
        .map(str::to_string);

    if let Some(url) = extracted {
        object.insert(IMAGE_URL_FIELD.to_string(), Value::String(url));
    }
}
