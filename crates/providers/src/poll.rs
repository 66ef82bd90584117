//! Create-and-poll: start a run and wait for it to stop moving.

use std::time::Duration;

use ar_domain::assistant::Run;
use ar_domain::config::AssistantsConfig;
use ar_domain::error::{Error, Result};
use tokio::time::Instant;

use crate::traits::AssistantProvider;

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Delay between status checks.
    pub interval: Duration,
    /// Overall bound on the wait. `None` waits as long as the provider
    /// keeps the run alive.
    pub deadline: Option<Duration>,
}

impl PollOptions {
    pub fn from_config(cfg: &AssistantsConfig) -> Self {
        Self {
            interval: Duration::from_millis(cfg.poll_interval_ms.max(1)),
            deadline: (cfg.run_timeout_secs > 0).then(|| Duration::from_secs(cfg.run_timeout_secs)),
        }
    }
}

/// Start a run and poll it until its status is poll-terminal
/// (see [`RunStatus::is_poll_terminal`]).
///
/// When the deadline passes first, the run is cancelled on a best-effort
/// basis and [`Error::Timeout`] is returned.
///
/// [`RunStatus::is_poll_terminal`]: ar_domain::assistant::RunStatus::is_poll_terminal
pub async fn create_and_poll(
    provider: &dyn AssistantProvider,
    thread_id: &str,
    assistant_id: &str,
    opts: PollOptions,
) -> Result<Run> {
    let started = Instant::now();
    let mut run = provider.create_run(thread_id, assistant_id).await?;
    tracing::debug!(thread_id, run_id = %run.id, status = %run.status, "run created");

    loop {
        if run.status.is_poll_terminal() {
            return Ok(run);
        }

        if let Some(limit) = opts.deadline {
            if started.elapsed() >= limit {
                if let Err(e) = provider.cancel_run(thread_id, &run.id).await {
                    tracing::warn!(thread_id, run_id = %run.id, error = %e, "cancel after deadline failed");
                }
                return Err(Error::Timeout(format!(
                    "Run did not finish within {}s (last status: {})",
                    limit.as_secs(),
                    run.status
                )));
            }
        }

        tokio::time::sleep(opts.interval).await;
        run = provider.retrieve_run(thread_id, &run.id).await?;
        tracing::trace!(thread_id, run_id = %run.id, status = %run.status, "polled run");
    }
}
