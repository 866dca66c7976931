//! Sanitizing of error detail before it reaches a caller.
//!
//! Failed queries embed the underlying error in the answer text. Provider
//! error bodies can be long and may echo credentials back, so the detail is
//! scrubbed of anything that looks like an API key and capped in length.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Longest error detail handed back to a caller, in characters.
pub const MAX_DETAIL_CHARS: usize = 300;

const SECRET_PREFIXES: &[&str] = &["sk-", "sk_live_", "sk_test_", "AKIA", "hf_", "Bearer "];

static SECRET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = SECRET_PREFIXES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    // The leading group stands in for a word boundary so that "task-list"
    // does not match "sk-".
    let full = format!("(^|[^A-Za-z0-9_])(?:{pattern})[^\\s\"'`,;{{}}\\[\\]]*");
    Regex::new(&full).expect("secret redaction regex is valid")
});

/// Replace tokens that look like credentials with `[REDACTED]`.
#[must_use]
pub fn redact_secrets(text: &str) -> Cow<'_, str> {
    if !SECRET_PREFIXES.iter().any(|p| text.contains(p)) {
        return Cow::Borrowed(text);
    }
    SECRET_REGEX.replace_all(text, "${1}[REDACTED]")
}

/// Redact credentials and cap the detail at [`MAX_DETAIL_CHARS`].
pub fn sanitize_detail(text: &str) -> String {
    let redacted = redact_secrets(text);
    truncate_chars(redacted.trim(), MAX_DETAIL_CHARS)
}

/// Cut `text` to at most `max` characters, marking the cut with "...".
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
