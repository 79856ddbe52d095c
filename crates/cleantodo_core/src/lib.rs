//! Core of the cleantodo task list.
//!
//! Layers, leaf first: `db` → `store` → `repo` → `service` →
//! `presentation`, wired together by `app`.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod presentation;
pub mod repo;
pub mod service;
pub mod store;

pub use app::{AppError, SqliteTaskRepository, TodoApp};
pub use config::{ConfigError, CoreConfig, DatabaseLocation, DEFAULT_DETACH_GRACE};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Task, TaskId, UNSAVED_TASK_ID};
pub use presentation::controller::{IntentHandle, TaskListController};
pub use repo::task_repo::{RepoError, RepoResult, StoreTaskRepository, TaskRepository};
pub use service::normalize_title;
pub use service::task_ops::TaskOperations;
pub use store::record::TaskRecord;
pub use store::sqlite_store::{SqliteTaskStore, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
