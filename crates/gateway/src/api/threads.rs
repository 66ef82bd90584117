//! `POST /threads`: accept a question, hand the run off, acknowledge.
//!
//! Everything that can be decided before the run is created is answered
//! synchronously with a `{status:"error"}` body. Once the user message is on
//! the thread the notifier owns the outcome and the caller only ever hears
//! about it through the callback.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use uuid::Uuid;

use ar_domain::assistant::{MessageRole, RunStatus};
use ar_domain::error::Error;
use ar_domain::relay::{StatusPayload, ThreadRequestBody, ValidationError};
use ar_providers::describe_fault;

use crate::runtime::{spawn_completion, RelayJob};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Synchronous failures of `POST /threads`.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The body was not a JSON object of the expected shape.
    #[error("invalid request body: {message}")]
    Malformed { status: StatusCode, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "There is an active run on this thread (status: {status}). Please wait for it to complete."
    )]
    ActiveRun { thread_id: String, status: RunStatus },

    #[error("Invalid thread ID provided {thread_id}")]
    UnknownThread { thread_id: String },

    /// The provider faulted before the run was handed off.
    #[error("{message}")]
    Provider {
        message: String,
        thread_id: Option<String>,
    },
}

impl RelayError {
    fn provider(err: &Error, thread_id: Option<&str>) -> Self {
        Self::Provider {
            message: describe_fault(err),
            thread_id: thread_id.map(str::to_owned),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed { status, .. } => *status,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ActiveRun { .. } => StatusCode::CONFLICT,
            Self::UnknownThread { .. } => StatusCode::NOT_FOUND,
            Self::Provider { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn thread_id(&self) -> Option<String> {
        match self {
            Self::ActiveRun { thread_id, .. } | Self::UnknownThread { thread_id } => {
                Some(thread_id.clone())
            }
            Self::Provider { thread_id, .. } => thread_id.clone(),
            Self::Malformed { .. } | Self::Validation(_) => None,
        }
    }
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = StatusPayload::error(self.to_string(), self.thread_id());
        (self.status_code(), Json(body)).into_response()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /threads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<ThreadRequestBody>, JsonRejection>,
) -> Result<Json<StatusPayload>, RelayError> {
    let Json(body) = body?;
    accept(&state, body).await.map(Json)
}

/// Validate, resolve the thread, submit the question and spawn the
/// notifier. Returns the `processing` acknowledgment.
pub async fn accept(state: &AppState, body: ThreadRequestBody) -> Result<StatusPayload, RelayError> {
    let req = body.validate()?;
    let provider = state.assistants.as_ref();

    let supplied = req.thread_id.is_some();
    let thread_id = match req.thread_id {
        Some(thread_id) => {
            // Best-effort guard: a run started between this check and the
            // message submission below is not detected.
            match provider.list_runs(&thread_id, 1).await {
                Ok(runs) => {
                    if let Some(run) = runs.into_iter().next().filter(|r| r.status.is_active()) {
                        tracing::info!(
                            thread_id = %thread_id,
                            run_id = %run.id,
                            status = %run.status,
                            "rejecting request: active run on thread"
                        );
                        return Err(RelayError::ActiveRun {
                            thread_id,
                            status: run.status,
                        });
                    }
                }
                Err(e) if e.is_not_found() => return Err(RelayError::UnknownThread { thread_id }),
                Err(e) => {
                    tracing::warn!(thread_id = %thread_id, error = %e, "listing runs failed");
                    return Err(RelayError::provider(&e, Some(&thread_id)));
                }
            }
            thread_id
        }
        None => match provider.create_thread().await {
            Ok(thread) => {
                tracing::debug!(thread_id = %thread.id, "thread created");
                thread.id
            }
            Err(e) => {
                tracing::warn!(error = %e, "creating thread failed");
                return Err(RelayError::provider(&e, None));
            }
        },
    };

    if let Err(e) = provider
        .create_message(&thread_id, MessageRole::User, &req.question)
        .await
    {
        if supplied && e.is_not_found() {
            return Err(RelayError::UnknownThread { thread_id });
        }
        tracing::warn!(thread_id = %thread_id, error = %e, "submitting message failed");
        return Err(RelayError::provider(&e, Some(&thread_id)));
    }

    let relay_id = Uuid::new_v4();
    state.relays.register(relay_id, &thread_id, &req.assistant_id);
    tracing::info!(
        relay_id = %relay_id,
        thread_id = %thread_id,
        assistant_id = %req.assistant_id,
        "relay accepted"
    );

    spawn_completion(
        state,
        RelayJob {
            relay_id,
            thread_id: thread_id.clone(),
            assistant_id: req.assistant_id,
            callback_url: req.callback_url,
            passthrough: req.passthrough,
        },
    );

    Ok(StatusPayload::processing(thread_id))
}
