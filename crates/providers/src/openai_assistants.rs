//! OpenAI Assistants v2 adapter.
//!
//! Speaks the `/threads`, `/threads/{id}/messages` and `/threads/{id}/runs`
//! endpoints. Works with any endpoint that follows the same contract
//! (Azure-hosted or self-hosted proxies) as long as it accepts bearer-style
//! auth.

use crate::traits::AssistantProvider;
use crate::util::{from_reqwest, resolve_api_key};
use ar_domain::assistant::{ListPage, MessageRole, Run, Thread, ThreadMessage};
use ar_domain::config::AssistantsConfig;
use ar_domain::error::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An assistant provider backed by an OpenAI-compatible Assistants API.
///
/// Holds one pooled [`reqwest::Client`]; build it once at startup and share
/// it behind an `Arc`.
pub struct OpenAiAssistantsProvider {
    id: String,
    base_url: String,
    auth_header: String,
    auth_value: String,
    beta_header: Option<String>,
    client: reqwest::Client,
}

impl OpenAiAssistantsProvider {
    /// Create the provider from config, resolving the API key now.
    pub fn from_config(cfg: &AssistantsConfig) -> Result<Self> {
        let key = resolve_api_key(&cfg.auth)?;
        Self::with_api_key(cfg, key)
    }

    /// Create the provider with an already-resolved API key.
    pub fn with_api_key(cfg: &AssistantsConfig, api_key: String) -> Result<Self> {
        let auth_header = cfg
            .auth
            .header
            .clone()
            .unwrap_or_else(|| "Authorization".into());
        let auth_prefix = cfg.auth.prefix.clone().unwrap_or_else(|| "Bearer ".into());

        let beta_header = Some(cfg.beta_header.trim().to_owned()).filter(|b| !b.is_empty());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            auth_header,
            auth_value: format!("{auth_prefix}{api_key}"),
            beta_header,
            client,
        })
    }

    // ── Internal: build authenticated request builder ──────────────

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut rb = self
            .client
            .request(method, url)
            .header(&self.auth_header, &self.auth_value)
            .header("Content-Type", "application/json");
        if let Some(ref beta) = self.beta_header {
            rb = rb.header("OpenAI-Beta", beta);
        }
        rb
    }

    // ── Internal: send and decode ──────────────────────────────────

    /// Send the request and decode a success body. A 404 becomes
    /// [`Error::NotFound`] for `resource`; every other non-success status
    /// becomes [`Error::Provider`].
    async fn send<T: DeserializeOwned>(
        &self,
        rb: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T> {
        let resp = rb.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                resource: resource.into(),
                message: error_message(&resp_text),
            });
        }
        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                status: Some(status.as_u16()),
                message: error_message(&resp_text),
            });
        }

        Ok(serde_json::from_str(&resp_text)?)
    }
}

/// Reject ids that would escape their path segment. The provider never
/// issues such ids, so they are reported as missing.
fn segment<'a>(id: &'a str, resource: &str) -> Result<&'a str> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(id)
    } else {
        Err(Error::NotFound {
            resource: resource.into(),
            message: format!("malformed {resource} id '{id}'"),
        })
    }
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw
/// text when the body is not the expected JSON shape.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| crate::fault::extract_fault_message(body.trim()))
}

fn role_to_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl AssistantProvider for OpenAiAssistantsProvider {
    async fn create_thread(&self) -> Result<Thread> {
        tracing::debug!(provider = %self.id, "create thread");
        let rb = self
            .request(Method::POST, "/threads")
            .json(&serde_json::json!({}));
        self.send(rb, "thread").await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let thread_id = segment(thread_id, "thread")?;
        tracing::debug!(provider = %self.id, thread_id, "create message");
        let rb = self
            .request(Method::POST, &format!("/threads/{thread_id}/messages"))
            .json(&serde_json::json!({
                "role": role_to_str(role),
                "content": content,
            }));
        self.send(rb, "thread").await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let thread_id = segment(thread_id, "thread")?;
        tracing::debug!(provider = %self.id, thread_id, assistant_id, "create run");
        let rb = self
            .request(Method::POST, &format!("/threads/{thread_id}/runs"))
            .json(&serde_json::json!({ "assistant_id": assistant_id }));
        self.send(rb, "thread").await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let thread_id = segment(thread_id, "thread")?;
        let run_id = segment(run_id, "run")?;
        let rb = self.request(Method::GET, &format!("/threads/{thread_id}/runs/{run_id}"));
        self.send(rb, "run").await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let thread_id = segment(thread_id, "thread")?;
        let run_id = segment(run_id, "run")?;
        tracing::debug!(provider = %self.id, thread_id, run_id, "cancel run");
        let rb = self.request(
            Method::POST,
            &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
        );
        self.send(rb, "run").await
    }

    async fn list_runs(&self, thread_id: &str, limit: u32) -> Result<Vec<Run>> {
        let thread_id = segment(thread_id, "thread")?;
        let rb = self.request(
            Method::GET,
            &format!("/threads/{thread_id}/runs?limit={limit}&order=desc"),
        );
        let page: ListPage<Run> = self.send(rb, "thread").await?;
        Ok(page.data)
    }

    async fn list_messages(&self, thread_id: &str, limit: u32) -> Result<Vec<ThreadMessage>> {
        let thread_id = segment(thread_id, "thread")?;
        let rb = self.request(
            Method::GET,
            &format!("/threads/{thread_id}/messages?limit={limit}&order=desc"),
        );
        let page: ListPage<ThreadMessage> = self.send(rb, "thread").await?;
        Ok(page.data)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
