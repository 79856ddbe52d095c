//! Application root: builds store → repository → controller once.
//!
//! Consumers receive the constructed pieces by reference; nothing in core
//! looks them up through globals.

use crate::config::{ConfigError, CoreConfig, DatabaseLocation};
use crate::db::DbError;
use crate::logging::{init_logging, LoggingError};
use crate::presentation::controller::TaskListController;
use crate::repo::task_repo::StoreTaskRepository;
use crate::service::task_ops::TaskOperations;
use crate::store::sqlite_store::SqliteTaskStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::runtime::Handle;

pub type SqliteTaskRepository = StoreTaskRepository<SqliteTaskStore>;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for AppError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Fully wired task-list core.
pub struct TodoApp {
    repository: Arc<SqliteTaskRepository>,
    controller: TaskListController<SqliteTaskRepository>,
}

impl TodoApp {
    /// Validates `config`, starts logging when a directory is set, opens the
    /// store and wires the layers. Controller work runs on `runtime`.
    pub fn open(config: &CoreConfig, runtime: Handle) -> Result<Self, AppError> {
        config.validate()?;
        if let Some(log_dir) = &config.log_dir {
            init_logging(&config.log_level, log_dir)?;
        }

        let store = match &config.database {
            DatabaseLocation::File(path) => SqliteTaskStore::open(path)?,
            DatabaseLocation::InMemory => SqliteTaskStore::open_in_memory()?,
        };
        let repository = Arc::new(StoreTaskRepository::new(Arc::new(store)));
        let controller =
            TaskListController::new(Arc::clone(&repository), runtime, config.detach_grace);

        info!("event=app_open module=app status=ok");
        Ok(Self {
            repository,
            controller,
        })
    }

    pub fn repository(&self) -> &Arc<SqliteTaskRepository> {
        &self.repository
    }

    pub fn controller(&self) -> &TaskListController<SqliteTaskRepository> {
        &self.controller
    }

    /// Task operations bound to the same repository as the controller.
    pub fn operations(&self) -> TaskOperations<SqliteTaskRepository> {
        TaskOperations::new(Arc::clone(&self.repository))
    }
}
