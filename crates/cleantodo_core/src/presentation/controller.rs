//! View-state controller for the task list screen.
//!
//! # Responsibility
//! - Hold the current ordered task list as observable state.
//! - Feed that state from the repository stream, shared by all observers.
//! - Dispatch user intents as fire-and-forget tasks.
//!
//! # Invariants
//! - State starts empty and is only replaced wholesale by stream emissions.
//! - Intents never write state; their effect arrives through the stream.
//! - Collection starts on first `observe` and ends when the controller drops,
//!   or when no observer re-attaches within the detach grace period.
//! - Intents resolve their target id against the store's current snapshot,
//!   never against the view state.
//! - Intents already dispatched keep running after the controller drops.
//!
//! # See also
//! - `service/task_ops.rs` for the operations each intent runs.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use crate::service::task_ops::TaskOperations;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Completion handle for one dispatched intent.
///
/// Dropping it detaches the intent; awaiting it yields the mutation result.
pub type IntentHandle<T = ()> = JoinHandle<RepoResult<T>>;

struct ViewState {
    tasks: watch::Sender<Vec<Task>>,
    observer_attached: Notify,
    collector: Mutex<Option<JoinHandle<()>>>,
}

impl ViewState {
    fn collector_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for an observer after the last one detached.
    ///
    /// Returns `false` when the grace period lapsed with nobody attached; the
    /// collector slot is cleared under the lock so a concurrent `observe`
    /// either keeps this collector alive or starts a fresh one.
    async fn linger(&self, grace: Duration) -> bool {
        if tokio::time::timeout(grace, self.observer_attached.notified())
            .await
            .is_ok()
        {
            return true;
        }

        let mut slot = self.collector_slot();
        if self.tasks.receiver_count() > 0 {
            return true;
        }
        *slot = None;
        false
    }
}

/// Observable task list plus the four user intents.
pub struct TaskListController<R: TaskRepository> {
    ops: Arc<TaskOperations<R>>,
    state: Arc<ViewState>,
    runtime: Handle,
    detach_grace: Duration,
}

impl<R: TaskRepository> TaskListController<R> {
    /// Builds a controller whose collector and intents run on `runtime`.
    pub fn new(repo: Arc<R>, runtime: Handle, detach_grace: Duration) -> Self {
        let (tasks, _) = watch::channel(Vec::new());
        Self {
            ops: Arc::new(TaskOperations::new(repo)),
            state: Arc::new(ViewState {
                tasks,
                observer_attached: Notify::new(),
                collector: Mutex::new(None),
            }),
            runtime,
            detach_grace,
        }
    }

    /// Attaches an observer to the task list.
    ///
    /// The first observer starts collection from the repository; later
    /// observers share it.
    pub fn observe(&self) -> watch::Receiver<Vec<Task>> {
        let receiver = self.state.tasks.subscribe();
        self.state.observer_attached.notify_one();
        self.ensure_collecting();
        receiver
    }

    /// Current list without attaching an observer.
    pub fn current(&self) -> Vec<Task> {
        self.state.tasks.borrow().clone()
    }

    pub fn is_collecting(&self) -> bool {
        self.state
            .collector_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn add(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> IntentHandle<TaskId> {
        let ops = Arc::clone(&self.ops);
        let title = title.into();
        let description = description.into();
        self.runtime.spawn(async move {
            let result = ops.add_task(title, description).await;
            report("add", &result);
            result
        })
    }

    /// Flips `is_done` on the stored task with `id`.
    pub fn toggle(&self, id: TaskId) -> IntentHandle {
        let ops = Arc::clone(&self.ops);
        self.runtime.spawn(async move {
            let Some(task) = ops.find_task(id).await else {
                return unknown_target("toggle", id);
            };
            let result = ops.toggle_done(&task).await;
            report("toggle", &result);
            result
        })
    }

    /// Replaces title and/or description; `None` keeps the stored value.
    pub fn edit(
        &self,
        id: TaskId,
        new_title: Option<String>,
        new_description: Option<String>,
    ) -> IntentHandle {
        let ops = Arc::clone(&self.ops);
        self.runtime.spawn(async move {
            let Some(task) = ops.find_task(id).await else {
                return unknown_target("edit", id);
            };
            let result = ops.edit_task(&task, new_title, new_description).await;
            report("edit", &result);
            result
        })
    }

    pub fn delete(&self, id: TaskId) -> IntentHandle {
        let ops = Arc::clone(&self.ops);
        self.runtime.spawn(async move {
            let Some(task) = ops.find_task(id).await else {
                return unknown_target("delete", id);
            };
            let result = ops.delete_task(&task).await;
            report("delete", &result);
            result
        })
    }

    fn ensure_collecting(&self) {
        let mut slot = self.state.collector_slot();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let updates = self.ops.repository().get_tasks();
        let handle = self.runtime.spawn(collect(
            Arc::clone(&self.state),
            updates,
            self.detach_grace,
        ));
        *slot = Some(handle);
        info!(
            "event=view_state_collect module=presentation status=start detach_grace_ms={}",
            self.detach_grace.as_millis()
        );
    }
}

impl<R: TaskRepository> Drop for TaskListController<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.state.collector_slot().take() {
            handle.abort();
            info!("event=view_state_collect module=presentation status=stop reason=controller_dropped");
        }
    }
}

async fn collect(
    state: Arc<ViewState>,
    mut updates: BoxStream<'static, Vec<Task>>,
    grace: Duration,
) {
    loop {
        tokio::select! {
            next = updates.next() => match next {
                Some(tasks) => {
                    debug!(
                        "event=view_state_update module=presentation status=ok rows={}",
                        tasks.len()
                    );
                    state.tasks.send_replace(tasks);
                }
                None => {
                    info!("event=view_state_collect module=presentation status=stop reason=stream_ended");
                    return;
                }
            },
            () = state.tasks.closed() => {
                if !state.linger(grace).await {
                    info!("event=view_state_collect module=presentation status=stop reason=no_observers");
                    return;
                }
            }
        }
    }
}

fn report<T>(intent: &'static str, result: &RepoResult<T>) {
    if let Err(err) = result {
        warn!("event=intent module=presentation status=error intent={intent} error={err}");
    }
}

fn unknown_target(intent: &'static str, id: TaskId) -> RepoResult<()> {
    debug!("event=intent module=presentation status=noop intent={intent} task_id={id}");
    Ok(())
}
