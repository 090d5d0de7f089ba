//! Response decoding helpers.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

const PREVIEW_CHARS: usize = 200;

/// Return a user-friendly hint for common HTTP status codes.
///
/// # Example
/// ```rust
/// use terminus_api::response::status_error_message;
///
/// assert!(status_error_message(401).unwrap().contains("terminus auth:login"));
/// assert!(status_error_message(403).unwrap().contains("Forbidden"));
/// assert!(status_error_message(404).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: run `terminus auth:login` or set TERMINUS_SESSION".into()),
        403 => Some("Forbidden (403). Hint: check your site team or organization membership".into()),
        _ => None,
    }
}

/// Build the message carried by an [`crate::ApiError::Status`].
///
/// Prefers the server's own `message`/`error`/`reason` field, then the raw
/// body, and prepends the hint from [`status_error_message`] when one exists.
pub fn describe_error_response(status: StatusCode, body: &str) -> String {
    let server_message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value {
            Value::String(text) => Some(text),
            Value::Object(map) => ["message", "error", "reason"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str).map(str::to_string)),
            _ => None,
        })
        .unwrap_or_else(|| body_preview(body));

    match (status_error_message(status.as_u16()), server_message.is_empty()) {
        (Some(hint), true) => hint,
        (Some(hint), false) => format!("{hint}: {server_message}"),
        (None, true) => status.canonical_reason().unwrap_or("request failed").to_string(),
        (None, false) => server_message,
    }
}

/// Decode the body of a successful response to `path`.
pub fn decode_body(path: &str, status: StatusCode, text: &str) -> Result<Value, BodyDecodeError> {
    serde_json::from_str(text).map_err(|source| BodyDecodeError {
        path: path.to_string(),
        status: status.as_u16(),
        source,
        preview: body_preview(text),
    })
}

/// Whitespace-collapsed start of a response body, at most [`PREVIEW_CHARS`]
/// characters. Blank bodies yield an empty string.
fn body_preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &collapsed[..cut]),
        None => collapsed,
    }
}

/// A successful response whose body was not JSON, typically a proxy or
/// maintenance page served in place of the API.
#[derive(Debug, Error)]
#[error("response from {path} (HTTP {status}) is not JSON: {source}; body begins {preview:?}")]
pub struct BodyDecodeError {
    pub path: String,
    pub status: u16,
    #[source]
    source: serde_json::Error,
    preview: String,
}

impl BodyDecodeError {
    pub fn preview(&self) -> &str {
        &self.preview
    }
}
