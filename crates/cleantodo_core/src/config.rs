//! Core configuration.
//!
//! # Invariants
//! - `log_dir`, when set, is absolute.
//! - `detach_grace` is strictly positive.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// How long the view state keeps collecting after the last observer leaves.
pub const DEFAULT_DETACH_GRACE: Duration = Duration::from_secs(5);

pub const DEFAULT_DB_FILE_NAME: &str = "todos.db";

/// Where the task table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database: DatabaseLocation,
    pub log_level: String,
    /// Rolling log directory. `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
    pub detach_grace: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::File(PathBuf::from(DEFAULT_DB_FILE_NAME)),
            log_level: default_log_level().to_string(),
            log_dir: None,
            detach_grace: DEFAULT_DETACH_GRACE,
        }
    }
}

impl CoreConfig {
    /// Checks values that would otherwise fail late inside bootstrap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let DatabaseLocation::File(path) = &self.database {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyDatabasePath);
            }
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        if self.detach_grace.is_zero() {
            return Err(ConfigError::ZeroDetachGrace);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyDatabasePath,
    RelativeLogDir(PathBuf),
    ZeroDetachGrace,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDatabasePath => write!(f, "database path cannot be empty"),
            Self::RelativeLogDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{}`", dir.display())
            }
            Self::ZeroDetachGrace => write!(f, "detach grace period must be greater than zero"),
        }
    }
}

impl Error for ConfigError {}
