//! Relay request and status payload shapes.
//!
//! The same [`StatusPayload`] is used for the synchronous acknowledgment,
//! synchronous errors, and the asynchronous callback body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request fields that are consumed by the relay and never passed through.
pub const CORE_FIELDS: [&str; 4] = ["question", "assistant_id", "callback_url", "thread_id"];

/// Payload keys owned by the relay; a passthrough field with one of these
/// names is dropped rather than allowed to overwrite the relay's value.
/// This is deliberately not an override-merge: callers cannot change the
/// reported status, message or thread.
const RESERVED_PAYLOAD_KEYS: [&str; 3] = ["status", "message", "thread_id"];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Body of `POST /threads` as received. Every core field is optional here
/// so that missing fields produce a relay error instead of a serde one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadRequestBody {
    #[serde(default, alias = "message")]
    pub question: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Caller fields outside the core schema.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("callback_url is not a valid http(s) URL: {0}")]
    InvalidCallbackUrl(String),
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ThreadRequest {
    pub question: String,
    pub assistant_id: String,
    pub callback_url: String,
    /// `None` when the caller wants a fresh thread.
    pub thread_id: Option<String>,
    pub passthrough: Map<String, Value>,
}

impl ThreadRequestBody {
    pub fn validate(self) -> Result<ThreadRequest, ValidationError> {
        let question = required(self.question, "question")?;
        let assistant_id = required(self.assistant_id, "assistant_id")?;
        let callback_url = required(self.callback_url, "callback_url")?;

        match url::Url::parse(&callback_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.has_host() => {}
            _ => return Err(ValidationError::InvalidCallbackUrl(callback_url)),
        }

        let thread_id = self
            .thread_id
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        let mut passthrough = self.extra;
        for key in CORE_FIELDS {
            passthrough.remove(key);
        }

        Ok(ThreadRequest {
            question,
            assistant_id,
            callback_url,
            thread_id,
            passthrough,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::Missing(field)),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Status payload
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayStatus {
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: RelayStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusPayload {
    fn new(status: RelayStatus, message: impl Into<String>, thread_id: Option<String>) -> Self {
        Self {
            status,
            message: message.into(),
            thread_id,
            extra: Map::new(),
        }
    }

    /// The immediate acknowledgment returned once a run is handed off.
    pub fn processing(thread_id: impl Into<String>) -> Self {
        Self::new(RelayStatus::Processing, "Run started", Some(thread_id.into()))
    }

    pub fn success(message: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self::new(RelayStatus::Success, message, Some(thread_id.into()))
    }

    pub fn error(message: impl Into<String>, thread_id: Option<String>) -> Self {
        Self::new(RelayStatus::Error, message, thread_id)
    }

    /// Merge caller passthrough fields. Relay-owned keys are never replaced.
    pub fn with_passthrough(mut self, passthrough: &Map<String, Value>) -> Self {
        for (key, value) in passthrough {
            if RESERVED_PAYLOAD_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.extra.insert(key.clone(), value.clone());
        }
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
