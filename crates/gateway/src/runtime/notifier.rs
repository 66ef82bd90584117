//! Run completion notifier.
//!
//! Spawned once per accepted request after the user message is on the
//! thread. Creates the run, waits for it, turns the result into a
//! [`StatusPayload`] and POSTs it to the caller's callback URL. Nothing
//! here can fail the original request; every failure ends up in the
//! callback body or in the logs.

use ar_domain::assistant::RunStatus;
use ar_domain::error::Result;
use ar_domain::relay::StatusPayload;
use ar_providers::{create_and_poll, describe_fault, AssistantProvider, PollOptions};
use serde_json::{Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::runtime::callback::DeliveryOutcome;
use crate::runtime::relays::RelayPhase;
use crate::state::AppState;

pub const EMPTY_REPLY_MESSAGE: &str = "Run completed without a text reply";

/// Everything the notifier needs once the handler has returned.
#[derive(Debug, Clone)]
pub struct RelayJob {
    pub relay_id: Uuid,
    pub thread_id: String,
    pub assistant_id: String,
    pub callback_url: String,
    pub passthrough: Map<String, Value>,
}

/// How a run ended, from the relay's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run completed. `reply` is `None` when the newest message has no
    /// text content.
    Completed { reply: Option<String> },
    /// The run stopped in any other poll-terminal state.
    NotCompleted { status: RunStatus },
    /// The provider faulted (or the poll deadline passed).
    ProviderError { message: String },
}

impl RunOutcome {
    pub fn phase(&self) -> RelayPhase {
        match self {
            Self::Completed { .. } => RelayPhase::Completed,
            Self::NotCompleted { .. } => RelayPhase::Failed,
            Self::ProviderError { .. } => RelayPhase::ProviderError,
        }
    }

    pub fn payload(&self, thread_id: &str) -> StatusPayload {
        let thread_id = thread_id.to_owned();
        match self {
            Self::Completed { reply: Some(text) } => StatusPayload::success(text.clone(), thread_id),
            Self::Completed { reply: None } => {
                StatusPayload::error(EMPTY_REPLY_MESSAGE, Some(thread_id))
            }
            Self::NotCompleted { status } => {
                StatusPayload::error(format!("Run failed with status: {status}"), Some(thread_id))
            }
            Self::ProviderError { message } => StatusPayload::error(message.clone(), Some(thread_id)),
        }
    }
}

/// Schedule the notifier on the state's background tracker.
pub fn spawn_completion(state: &AppState, job: RelayJob) {
    let span = tracing::info_span!(
        "relay",
        relay_id = %job.relay_id,
        thread_id = %job.thread_id,
        assistant_id = %job.assistant_id,
    );
    let state = state.clone();
    state
        .background
        .clone()
        .spawn(async move { complete_run(&state, job).await }.instrument(span));
}

/// Drive the run to an outcome and deliver exactly one callback.
pub async fn complete_run(state: &AppState, job: RelayJob) -> DeliveryOutcome {
    state.relays.advance(&job.relay_id, RelayPhase::Polling);

    let outcome = match drive_run(
        state.assistants.as_ref(),
        &job.thread_id,
        &job.assistant_id,
        state.poll,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "provider fault during run");
            RunOutcome::ProviderError {
                message: describe_fault(&e),
            }
        }
    };
    state.relays.advance(&job.relay_id, outcome.phase());

    let payload = outcome.payload(&job.thread_id).with_passthrough(&job.passthrough);
    let delivery = state.callbacks.deliver(&job.callback_url, &payload).await;
    state.relays.advance(&job.relay_id, RelayPhase::CallbackAttempted);
    state.relays.finish(&job.relay_id);

    tracing::info!(
        status = ?payload.status,
        delivered = delivery.is_delivered(),
        "relay finished"
    );
    delivery
}

/// Create and poll a run, then read the reply when it completed.
pub async fn drive_run(
    provider: &dyn AssistantProvider,
    thread_id: &str,
    assistant_id: &str,
    opts: PollOptions,
) -> Result<RunOutcome> {
    let run = create_and_poll(provider, thread_id, assistant_id, opts).await?;
    tracing::debug!(run_id = %run.id, status = %run.status, "run stopped");

    if run.status != RunStatus::Completed {
        if let Some(err) = &run.last_error {
            tracing::info!(
                run_id = %run.id,
                code = %err.code,
                message = %err.message,
                "run reported an error"
            );
        }
        return Ok(RunOutcome::NotCompleted { status: run.status });
    }

    let messages = provider.list_messages(thread_id, 1).await?;
    let reply = messages
        .first()
        .and_then(|m| m.first_text())
        .map(str::to_owned);
    Ok(RunOutcome::Completed { reply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completed_reply_is_success() {
        let p = RunOutcome::Completed {
            reply: Some("Hello!".into()),
        }
        .payload("thread_1");
        assert_eq!(
            serde_json::to_value(p).unwrap(),
            json!({ "status": "success", "message": "Hello!", "thread_id": "thread_1" })
        );
    }

    #[test]
    fn completed_without_text_is_an_error() {
        let p = RunOutcome::Completed { reply: None }.payload("thread_1");
        assert_eq!(p.message, EMPTY_REPLY_MESSAGE);
        assert_eq!(p.thread_id.as_deref(), Some("thread_1"));
    }

    #[test]
    fn not_completed_names_the_status() {
        let p = RunOutcome::NotCompleted {
            status: RunStatus::Expired,
        }
        .payload("thread_1");
        assert_eq!(p.message, "Run failed with status: expired");

        let p = RunOutcome::NotCompleted {
            status: RunStatus::RequiresAction,
        }
        .payload("thread_1");
        assert_eq!(p.message, "Run failed with status: requires_action");

        let p = RunOutcome::NotCompleted {
            status: RunStatus::Unknown("paused_for_review".into()),
        }
        .payload("thread_1");
        assert_eq!(p.message, "Run failed with status: paused_for_review");
    }

    #[test]
    fn outcome_phases() {
        assert_eq!(
            RunOutcome::Completed { reply: None }.phase(),
            RelayPhase::Completed
        );
        assert_eq!(
            RunOutcome::NotCompleted {
                status: RunStatus::Failed
            }
            .phase(),
            RelayPhase::Failed
        );
        assert_eq!(
            RunOutcome::ProviderError {
                message: "x".into()
            }
            .phase(),
            RelayPhase::ProviderError
        );
    }
}
