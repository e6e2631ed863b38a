//! Payload decoding.
//!
//! Backends on the other side of this stream emit a mix of well-formed JSON
//! objects, bare JSON strings, truncated JSON, and plain text, sometimes
//! with their own parser diagnostics leaked into the payload. The decoder
//! is an ordered list of total strategies; every input maps to
//! content-or-nothing and none of them can fail.
//!
//! Strategy order:
//! 1. structured decode with content-key probing
//! 2. quote-repair retry for a string opened with `"` but never closed
//! 3. diagnostic-noise suppression
//! 4. heuristic prefix/suffix trim

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Content-bearing keys probed on decoded objects, in priority order.
const CONTENT_KEYS: [&str; 4] = ["content", "result", "message", "text"];

/// Leaked parser diagnostics recognized as noise and suppressed.
static DIAGNOSTIC_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"SyntaxError: Unexpected (token|end of JSON input)").expect("valid noise pattern")
});

/// Decodes one payload into displayable content.
///
/// Returns `None` when the payload carries no content (empty after
/// cleanup, or recognized diagnostic noise). Deterministic and total: no
/// input raises.
pub fn decode_payload(payload: &str) -> Option<String> {
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    // 1. Structured decode.
    if let Ok(value) = serde_json::from_str::<Value>(payload) {
        return extract_content(&value);
    }

    // 2. A string the backend opened but never closed: repair and retry once.
    if payload.starts_with('"') && !payload.ends_with('"') {
        let repaired = format!("{payload}\"");
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            return extract_content(&value);
        }
    }

    // 3. Leaked parser diagnostics are noise, not content.
    if DIAGNOSTIC_NOISE.is_match(payload) {
        return None;
    }

    // 4. Plain text with JSON shrapnel around it.
    cleanup_text(payload)
}

/// Extracts content from a decoded JSON value.
///
/// Objects are probed with [`CONTENT_KEYS`]; the first non-empty string
/// wins. A `data` field is accepted as a string or re-probed as a nested
/// object. A non-empty object with no matching key serializes back to JSON
/// text so nothing the backend sent is silently lost.
///
/// Exposed for the single-shot request paths, which receive an already
/// decoded body instead of a raw payload.
pub fn extract_content(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s.clone()),
        Value::Object(map) => {
            for key in CONTENT_KEYS {
                if let Some(Value::String(s)) = map.get(key) {
                    if !s.is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            match map.get("data") {
                Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(Value::Object(nested)) => {
                    for key in CONTENT_KEYS {
                        if let Some(Value::String(s)) = nested.get(key) {
                            if !s.is_empty() {
                                return Some(s.clone());
                            }
                        }
                    }
                    if !nested.is_empty() {
                        return Some(Value::Object(nested.clone()).to_string());
                    }
                }
                _ => {}
            }
            if map.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        Value::Null => None,
        // Bare numbers, booleans and arrays surface as their JSON text.
        other => non_empty(other.to_string()),
    }
}

/// Strips the JSON fragments that surround plain-text payloads.
///
/// Leading `"`/`{`/whitespace and trailing `"`/`}`/`:`/`,`/whitespace are
/// removed; an empty remainder is no content.
fn cleanup_text(text: &str) -> Option<String> {
    let cleaned = text
        .trim_start_matches(|c: char| c == '"' || c == '{' || c.is_whitespace())
        .trim_end_matches(|c: char| matches!(c, '"' | '}' | ':' | ',') || c.is_whitespace());
    non_empty(cleaned.to_string())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
