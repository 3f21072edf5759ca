//! Tolerant JSON extraction from free-form model output.
//!
//! Models asked for JSON still wrap it in markdown fences or chatter.
//! [`extract_json`] tries, in order:
//!
//! 1. the body of the first fenced code block (```` ```json ```` or bare
//!    ```` ``` ````, tag matched case-insensitively), when the text has one;
//! 2. the first brace-balanced `{...}` span, honoring JSON strings and
//!    escapes;
//! 3. the widest span from the first `{` to the last `}`;
//!
//! and deserializes the first candidate that parses. Text with no `{` at
//! all is [`ExtractError::NoObject`].

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in model output")]
    NoObject,

    #[error("invalid JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

const FENCE: &str = "```";

pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let text = raw.trim();

    // Search inside the fence body when there is one, so prose before the
    // fence cannot shadow the payload.
    let scope = fenced_body(text).unwrap_or(text);

    let mut last_error = None;
    for candidate in candidates(scope) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    match last_error {
        Some(e) => Err(ExtractError::Invalid(e)),
        None => Err(ExtractError::NoObject),
    }
}

fn candidates(scope: &str) -> Vec<&str> {
    let mut spans = Vec::with_capacity(3);

    if scope.starts_with('{') || scope.starts_with('[') {
        spans.push(scope);
    }
    if let Some(span) = first_balanced_object(scope) {
        spans.push(span);
    }
    if let Some(span) = greedy_object(scope) {
        spans.push(span);
    }

    spans.dedup();
    spans
}

/// Body of the first fenced block, without the opener line's language tag.
/// An unterminated fence runs to the end of the text.
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];

    // Skip an info string such as `json` or `JSON` on the opener line.
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];

    let end = body.find(FENCE).unwrap_or(body.len());
    Some(body[..end].trim())
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
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
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn greedy_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
