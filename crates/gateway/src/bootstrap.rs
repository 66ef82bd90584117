//! AppState construction extracted from `main.rs`.

use std::sync::Arc;

use anyhow::Context;

use ar_domain::config::{Config, ConfigSeverity};
use ar_providers::{AssistantProvider, OpenAiAssistantsProvider};

use crate::state::AppState;

/// Validate config, build the provider and callback clients, and return a
/// fully-wired [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Assistant provider ───────────────────────────────────────────
    let provider = OpenAiAssistantsProvider::from_config(&config.assistants)
        .context("initializing assistant provider")?;
    tracing::info!(
        provider = %config.assistants.id,
        base_url = %config.assistants.base_url,
        "assistant provider ready"
    );
    let assistants: Arc<dyn AssistantProvider> = Arc::new(provider);

    // ── Shared state ─────────────────────────────────────────────────
    let state = AppState::new(config.clone(), assistants).context("building callback client")?;
    tracing::info!(
        verify_tls = config.callback.verify_tls,
        timeout_secs = config.callback.timeout_secs,
        "callback client ready"
    );

    Ok(state)
}
