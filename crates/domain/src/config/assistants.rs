use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Assistant provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantsConfig {
    /// Provider id used in logs and error messages.
    #[serde(default = "d_openai")]
    pub id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Value of the `OpenAI-Beta` header. Empty disables the header.
    #[serde(default = "d_beta")]
    pub beta_header: String,
    /// Timeout for each individual provider HTTP call.
    #[serde(default = "d_60")]
    pub request_timeout_secs: u64,
    /// Delay between run status polls.
    #[serde(default = "d_1000")]
    pub poll_interval_ms: u64,
    /// Give up on a run after this long. `0` waits forever.
    #[serde(default = "d_600")]
    pub run_timeout_secs: u64,
}

impl Default for AssistantsConfig {
    fn default() -> Self {
        Self {
            id: d_openai(),
            base_url: d_base_url(),
            auth: AuthConfig::default(),
            beta_header: d_beta(),
            request_timeout_secs: 60,
            poll_interval_ms: 1000,
            run_timeout_secs: 600,
        }
    }
}

/// Where the provider API key comes from.
///
/// Precedence: `key` (plaintext, warned about) then `env`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default = "d_key_env")]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
    /// Header name (default "Authorization").
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (default "Bearer ").
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            env: d_key_env(),
            key: None,
            header: None,
            prefix: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_openai() -> String {
    "openai".into()
}
fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_beta() -> String {
    "assistants=v2".into()
}
fn d_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".into())
}
fn d_60() -> u64 {
    60
}
fn d_1000() -> u64 {
    1000
}
fn d_600() -> u64 {
    600
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
