//! Task domain model.
//!
//! # Invariants
//! - `id == 0` marks a task that has not been persisted yet.
//! - A `Task` is a value: edits build a new `Task` with the same `id`.

use serde::{Deserialize, Serialize};

/// Store-assigned task identity. `0` is reserved for unsaved tasks.
pub type TaskId = u64;

/// Id carried by tasks that have not been written to the store.
pub const UNSAVED_TASK_ID: TaskId = 0;

/// Business-level to-do item, independent of the storage shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub is_done: bool,
}

impl Task {
    /// Builds an unsaved, not-done task.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_TASK_ID,
            title: title.into(),
            description: description.into(),
            is_done: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_TASK_ID
    }

    /// Returns a copy with `is_done` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            is_done: !self.is_done,
            ..self.clone()
        }
    }

    /// Returns a copy with title and/or description replaced.
    ///
    /// `None` keeps the current value; it never clears a field.
    pub fn edited(&self, title: Option<String>, description: Option<String>) -> Self {
        Self {
            id: self.id,
            title: title.unwrap_or_else(|| self.title.clone()),
            description: description.unwrap_or_else(|| self.description.clone()),
            is_done: self.is_done,
        }
    }
}
