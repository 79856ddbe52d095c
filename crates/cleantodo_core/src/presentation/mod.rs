//! Presentation state for consumers that render the task list.
//!
//! Consumers observe a read-only list and send intents back; they never
//! reach the repository or the store directly.

pub mod controller;
