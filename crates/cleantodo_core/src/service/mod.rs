//! Task use-case services.
//!
//! # Responsibility
//! - Turn user intents into single repository calls.
//! - Keep presentation code decoupled from storage details.

pub mod task_ops;

/// Trims a user-entered title and rejects blank input.
///
/// Task operations accept any title; consumers call this before `add`.
pub fn normalize_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
