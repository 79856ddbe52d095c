//! Task repository contract and store-backed implementation.
//!
//! # Responsibility
//! - Offer async task CRUD to the service and presentation layers.
//! - Re-map every store snapshot into an ordered `Vec<Task>`.
//!
//! # Invariants
//! - Each mutating call performs exactly one store mutation and returns only
//!   after it has committed.
//! - `get_tasks` yields the current snapshot first, then one item per
//!   published change; intermediate snapshots may be skipped.
//!
//! # See also
//! - `store/sqlite_store.rs` for the blocking store and its snapshot channel.
//! - `presentation/controller.rs` for the shared collector over `get_tasks`.

use crate::db::DbError;
use crate::model::task::{Task, TaskId};
use crate::repo::mapper::{to_domain_all, to_entity};
use crate::store::record::TaskRecord;
use crate::store::sqlite_store::TaskStore;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::task::JoinError;
use tokio_stream::wrappers::WatchStream;

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure of a repository call.
#[derive(Debug)]
pub enum RepoError {
    /// Store failure, passed through as-is.
    Store(DbError),
    /// The blocking worker running the store call panicked or was cancelled.
    Worker(JoinError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Worker(err) => write!(f, "store worker failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Worker(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

impl From<JoinError> for RepoError {
    fn from(value: JoinError) -> Self {
        Self::Worker(value)
    }
}

/// Repository interface for task persistence.
#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    /// Stream of ordered task lists, one per store change.
    fn get_tasks(&self) -> BoxStream<'static, Vec<Task>>;
    /// Persists a task and returns its assigned id.
    async fn add_task(&self, task: &Task) -> RepoResult<TaskId>;
    async fn update_task(&self, task: &Task) -> RepoResult<()>;
    async fn delete_task(&self, task: &Task) -> RepoResult<()>;
}

/// Repository over any [`TaskStore`].
pub struct StoreTaskRepository<S: TaskStore> {
    store: Arc<S>,
}

impl<S: TaskStore> StoreTaskRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn run_blocking<T, F>(&self, task: &Task, op: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&S, &TaskRecord) -> Result<T, DbError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let record = to_entity(task);
        let value = tokio::task::spawn_blocking(move || op(store.as_ref(), &record)).await??;
        Ok(value)
    }
}

#[async_trait]
impl<S: TaskStore> TaskRepository for StoreTaskRepository<S> {
    fn get_tasks(&self) -> BoxStream<'static, Vec<Task>> {
        WatchStream::new(self.store.subscribe())
            .map(|records| to_domain_all(&records))
            .boxed()
    }

    async fn add_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.run_blocking(task, |store, record| store.create(record))
            .await
    }

    async fn update_task(&self, task: &Task) -> RepoResult<()> {
        self.run_blocking(task, |store, record| store.update(record))
            .await
    }

    async fn delete_task(&self, task: &Task) -> RepoResult<()> {
        self.run_blocking(task, |store, record| store.delete(record))
            .await
    }
}
