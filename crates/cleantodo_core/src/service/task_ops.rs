//! Task operations: add, toggle-done, edit, delete.
//!
//! # Invariants
//! - Every operation issues at most one repository mutation.
//! - No input validation happens here; callers own title policy.
//! - Edits use copy-with-changes on the task value the caller holds.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use futures::StreamExt;
use log::debug;
use std::sync::Arc;

/// Use-case facade over a task repository.
pub struct TaskOperations<R: TaskRepository> {
    repo: Arc<R>,
}

impl<R: TaskRepository> TaskOperations<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Looks `id` up in the store's current snapshot.
    ///
    /// The first stream item is the committed table state, so this never
    /// answers from a cached or stale list.
    pub async fn find_task(&self, id: TaskId) -> Option<Task> {
        self.repo
            .get_tasks()
            .next()
            .await?
            .into_iter()
            .find(|task| task.id == id)
    }

    /// Persists a new open task and returns the store-assigned id.
    pub async fn add_task(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> RepoResult<TaskId> {
        let id = self.repo.add_task(&Task::new(title, description)).await?;
        debug!("event=task_add module=service status=ok task_id={id}");
        Ok(id)
    }

    /// Flips `is_done` on the given task value.
    pub async fn toggle_done(&self, task: &Task) -> RepoResult<()> {
        self.repo.update_task(&task.toggled()).await?;
        debug!(
            "event=task_toggle module=service status=ok task_id={} is_done={}",
            task.id, !task.is_done
        );
        Ok(())
    }

    /// Replaces title and/or description; `None` keeps the current value.
    pub async fn edit_task(
        &self,
        task: &Task,
        new_title: Option<String>,
        new_description: Option<String>,
    ) -> RepoResult<()> {
        self.repo
            .update_task(&task.edited(new_title, new_description))
            .await?;
        debug!("event=task_edit module=service status=ok task_id={}", task.id);
        Ok(())
    }

    pub async fn delete_task(&self, task: &Task) -> RepoResult<()> {
        self.repo.delete_task(task).await?;
        debug!("event=task_delete module=service status=ok task_id={}", task.id);
        Ok(())
    }
}
