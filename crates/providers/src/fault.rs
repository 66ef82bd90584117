//! Human-readable messages for provider faults.
//!
//! Adapters pull `error.message` out of structured error bodies when they
//! can. Anything else (transport errors, plain-text bodies, error strings
//! that embed a repr of the provider's error dict) goes through
//! [`extract_fault_message`].

use ar_domain::error::Error;

const MESSAGE_MARKER: &str = "'message': ";

/// Best-effort extraction of the message embedded in a fault string.
///
/// Looks for `'message': ` followed by a quoted value and returns the text
/// inside the quotes. Returns the whole input when the marker is absent.
pub fn extract_fault_message(raw: &str) -> String {
    let Some(pos) = raw.find(MESSAGE_MARKER) else {
        return raw.to_owned();
    };
    let rest = &raw[pos + MESSAGE_MARKER.len()..];

    match rest.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let body = &rest[q.len_utf8()..];
            match body.find(q) {
                Some(end) => body[..end].to_owned(),
                None => body.to_owned(),
            }
        }
        // Unquoted value: stop at the first delimiter.
        _ => rest
            .split(|c| matches!(c, ',' | '}' | '"' | '\''))
            .next()
            .unwrap_or_default()
            .trim()
            .to_owned(),
    }
}

/// The message reported to a callback when the provider fails mid-run.
pub fn describe_fault(err: &Error) -> String {
    match err {
        Error::Provider { message, .. } => extract_fault_message(message),
        Error::NotFound { message, .. } => extract_fault_message(message),
        Error::Timeout(message) => message.clone(),
        other => extract_fault_message(&other.to_string()),
    }
}
