//! Background side of a relay: drive the run, then report it.

pub mod callback;
pub mod notifier;
pub mod relays;

pub use notifier::{spawn_completion, RelayJob, RunOutcome};
