use ar_domain::assistant::{MessageRole, Run, Thread, ThreadMessage};
use ar_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The thread/run/message primitives the relay needs from an assistant
/// provider.
///
/// Every method distinguishes a missing resource ([`Error::NotFound`]) from
/// any other provider fault ([`Error::Provider`], transport errors).
///
/// [`Error::NotFound`]: ar_domain::error::Error::NotFound
/// [`Error::Provider`]: ar_domain::error::Error::Provider
#[async_trait::async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Create an empty thread.
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a message to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage>;

    /// Start a run of `assistant_id` on the thread. Returns immediately.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Runs on the thread, newest first.
    async fn list_runs(&self, thread_id: &str, limit: u32) -> Result<Vec<Run>>;

    /// Messages on the thread, newest first.
    async fn list_messages(&self, thread_id: &str, limit: u32) -> Result<Vec<ThreadMessage>>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}
