// Defensive recovery of structured data from annotation-service responses,
// which may arrive fenced, truncated, or wrapped in prose.
use serde_json::{Map, Value};

/// Ordered, total parse strategies, tried in sequence until one yields an
/// object. A fully malformed response degrades to an empty map, never to an
/// error.
pub fn safe_parse(text: &str) -> Map<String, Value> {
    let cleaned = strip_code_fences(text);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Map::new();
    }

    let attempts = [
        Some(cleaned.to_string()),
        Some(auto_close(cleaned)),
        brace_slice(cleaned).map(auto_close),
    ];

    for candidate in attempts.into_iter().flatten() {
        if let Some(map) = parse_object(&candidate) {
            return map;
        }
    }
    Map::new()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "")
}

/// Closes a response that was plausibly truncated mid-list.
fn auto_close(text: &str) -> String {
    if text.ends_with("]}") {
        text.to_string()
    } else {
        format!("{text} ]}}")
    }
}

/// Slices to the outermost `{` .. `}` span, discarding surrounding prose and
/// any trailing truncated fragment.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
