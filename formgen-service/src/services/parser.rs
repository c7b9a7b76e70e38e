//! Turns raw LLM text into typed values.
//!
//! This is the only place untrusted model output becomes domain data. Content that
//! does not match the target shape is rejected, never coerced.

use serde::de::DeserializeOwned;

/// Apply the blunt normalization every reply goes through: every `'` becomes `"`,
/// then surrounding whitespace is trimmed.
///
/// Values that legitimately contain an apostrophe are broken by this; such replies
/// fail to decode and cost a retry.
pub fn normalize(raw: &str) -> String {
    raw.replace('\'', "\"").trim().to_string()
}

/// Decode a single reply into `T`.
///
/// The normalized text is tried as a whole first. If that fails, the first balanced
/// `{...}` or `[...]` span is tried, which covers markdown fences and chatter around
/// the JSON. The error from the whole-text attempt is returned when both fail.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let normalized = normalize(raw);

    match serde_json::from_str::<T>(&normalized) {
        Ok(value) => Ok(value),
        Err(whole_err) => match extract_json_span(&normalized) {
            Some(span) if span.len() < normalized.len() => {
                serde_json::from_str::<T>(span).map_err(|_| whole_err)
            }
            _ => Err(whole_err),
        },
    }
}

/// Return the first balanced object or array in `text`, skipping brackets inside
/// string literals.
fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
