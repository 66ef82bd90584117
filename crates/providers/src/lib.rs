pub mod fault;
pub mod openai_assistants;
pub mod poll;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use fault::{describe_fault, extract_fault_message};
pub use openai_assistants::OpenAiAssistantsProvider;
pub use poll::{create_and_poll, PollOptions};
pub use traits::AssistantProvider;
pub use util::resolve_api_key;
