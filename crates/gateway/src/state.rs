use std::sync::Arc;

use ar_domain::config::Config;
use ar_domain::error::Result;
use ar_providers::{AssistantProvider, PollOptions};
use tokio_util::task::TaskTracker;

use crate::runtime::callback::CallbackClient;
use crate::runtime::relays::RelayTracker;

/// Shared application state passed to all API handlers.
///
/// Everything here is built once at startup; requests never construct
/// their own provider or HTTP clients.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Assistant provider (threads, messages, runs).
    pub assistants: Arc<dyn AssistantProvider>,
    /// Outbound client for callback delivery.
    pub callbacks: Arc<CallbackClient>,
    /// In-flight relay lifecycles.
    pub relays: Arc<RelayTracker>,
    /// Detached run-completion tasks; drained on shutdown.
    pub background: TaskTracker,
    pub poll: PollOptions,
}

impl AppState {
    pub fn new(config: Arc<Config>, assistants: Arc<dyn AssistantProvider>) -> Result<Self> {
        let callbacks = Arc::new(CallbackClient::from_config(&config.callback)?);
        let poll = PollOptions::from_config(&config.assistants);
        Ok(Self {
            config,
            assistants,
            callbacks,
            relays: Arc::new(RelayTracker::new()),
            background: TaskTracker::new(),
            poll,
        })
    }
}
