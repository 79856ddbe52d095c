//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the business-level task value used above the repository.
//! - Keep the shape free of storage concerns.

pub mod task;
