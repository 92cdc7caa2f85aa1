//! Lenient decoding of backend replies.
//!
//! Backends are told to reply with one JSON object but often wrap it in
//! markdown fences or prose, or leave trailing commas behind. Decoding tries,
//! in order:
//!
//! 1. the trimmed text as-is
//! 2. the contents of the first markdown code block
//! 3. the outermost `{ ... }` span
//!
//! and each candidate again with trailing commas stripped. [`decode`] never
//! fails: it returns the caller's default and logs a warning. [`try_decode`]
//! exposes the failure for stages that treat it as a stage failure.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::DecodeError;

/// Longest raw excerpt kept in logs and absorbed into fallbacks.
pub const RAW_EXCERPT_CHARS: usize = 160;

/// A reply shape with an optional free-text field for undecodable output.
pub trait Decodable: DeserializeOwned {
    /// Keep whatever is useful from a reply that failed to decode.
    ///
    /// Called on the fallback value. The default discards the text.
    fn absorb_raw(&mut self, _raw: &str) {}
}

/// Decode `raw` into `T`, falling back to `default` on any failure.
pub fn decode<T: Decodable>(raw: &str, default: T) -> T {
    match try_decode(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                error = %e,
                raw = %excerpt(raw),
                "undecodable reply, using fallback"
            );
            let mut fallback = default;
            fallback.absorb_raw(raw.trim());
            fallback
        }
    }
}

/// Decode `raw` into `T` through the recovery chain.
///
/// # Errors
///
/// [`DecodeError::Empty`] for blank input, otherwise the last parser error.
pub fn try_decode<T: DeserializeOwned>(raw: &str) -> Result<T, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }

    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        extract_outermost_object(trimmed),
    ];

    let mut last_error = None;
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
        match serde_json::from_str(&strip_trailing_commas(candidate)) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(e) => Err(DecodeError::Shape(e)),
        None => Err(DecodeError::Empty),
    }
}

/// At most [`RAW_EXCERPT_CHARS`] characters of `raw`.
pub fn excerpt(raw: &str) -> &str {
    raw.char_indices()
        .nth(RAW_EXCERPT_CHARS)
        .and_then(|(end, _)| raw.get(..end))
        .unwrap_or(raw)
}

/// Contents of the first ```` ```json ```` or ```` ``` ```` block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = fence.checked_add(3)?;
    let rest = text.get(after_fence..)?;
    // Skip the info string (`json`, `JSON`, ...) up to the end of the line.
    let body_start = rest.find('\n').and_then(|nl| nl.checked_add(1)).unwrap_or(0);
    let body = rest.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn extract_outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Remove commas directly followed (ignoring whitespace) by `}` or `]`.
///
/// Commas inside string literals are left alone.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let rest = chars.clone().find(|n| !n.is_whitespace());
                if !matches!(rest, Some('}' | ']')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}
