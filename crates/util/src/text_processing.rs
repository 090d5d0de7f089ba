//! # Text Processing Utilities
//!
//! Redaction of credentials before request metadata reaches the logs.

use once_cell::sync::Lazy;
use regex::Regex;

const REPLACEMENT: &str = "[REDACTED]";

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(build_redact_patterns);

/// Redacts values that look like secrets in a string.
///
/// Authorization headers, bearer tokens, `*_TOKEN=`-style assignments and
/// JSON `"session"`/`"machine_token"` fields are replaced with `[REDACTED]`
/// while the surrounding key names are kept for debugging.
///
/// # Example
/// ```rust
/// use terminus_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("authorization: Bearer abc.def"), "authorization: [REDACTED]");
/// assert_eq!(redact_sensitive("TERMINUS_SESSION=abc123"), "TERMINUS_SESSION=[REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REPLACEMENT}{suffix}")
            })
            .to_string();
    }
    redacted
}

fn build_redact_patterns() -> Vec<Regex> {
    [
        r"(?i)(authorization:\s+)([^\r\n]+)()",
        r"(?i)(\bBearer\s+)([A-Za-z0-9\-._~+/:]+=*)()",
        r"(?i)(\b[A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD|SESSION)=)([^\s]+)()",
        r#"(?i)("(?:session|machine_token|token)"\s*:\s*")([^"]*)(")"#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_authorization_headers() {
        assert_eq!(redact_sensitive("Authorization: Bearer s3cr3t"), "Authorization: [REDACTED]");
    }

    #[test]
    fn redacts_inline_bearer_tokens() {
        assert_eq!(
            redact_sensitive("sent Bearer abc.def-123 to host"),
            "sent Bearer [REDACTED] to host"
        );
    }

    #[test]
    fn redacts_env_assignments() {
        assert_eq!(
            redact_sensitive("TERMINUS_SESSION=abc MACHINE_TOKEN=xyz HOST=api"),
            "TERMINUS_SESSION=[REDACTED] MACHINE_TOKEN=[REDACTED] HOST=api"
        );
    }

    #[test]
    fn redacts_json_session_fields() {
        assert_eq!(
            redact_sensitive(r#"{"session":"abc","user_uuid":"u-1"}"#),
            r#"{"session":"[REDACTED]","user_uuid":"u-1"}"#
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive("sites/S1/workflows/W1"), "sites/S1/workflows/W1");
    }
}
