//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/delete/list over the `todos` table.
//! - Publish the post-commit table snapshot through a latest-value channel.
//!
//! # Invariants
//! - Mutation, snapshot re-read and publish run under one connection lock, so
//!   snapshots are published in commit order.
//! - Exactly one snapshot is published per committed mutation; no-op
//!   update/delete publish nothing.
//! - `create` with an explicit existing id replaces that row.
//! - A mutation that committed returns `Ok` even when the follow-up snapshot
//!   read fails; that failure is logged and the publish is skipped.
//!
//! # See also
//! - `repo/task_repo.rs` for the async repository over this store.
//! - `db/migrations/0001_init.sql` for the `todos` schema.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::store::record::TaskRecord;
use log::{debug, error};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::watch;

const TASK_TABLE: &str = "todos";

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    is_done
FROM todos
ORDER BY id ASC";

/// Durable task table with a change-notification stream.
///
/// Implementations are blocking; async callers go through the repository,
/// which moves each call onto the blocking pool.
pub trait TaskStore: Send + Sync + 'static {
    /// Inserts a row and returns its id. `record.id == 0` gets a fresh key.
    ///
    /// Every mutation reports its own outcome. Once it has committed, a
    /// failure to read back the new snapshot does not turn it into an error.
    fn create(&self, record: &TaskRecord) -> DbResult<u64>;
    /// Replaces the row with `record.id`. Missing ids are ignored.
    fn update(&self, record: &TaskRecord) -> DbResult<()>;
    /// Removes the row with `record.id`. Missing ids are ignored.
    fn delete(&self, record: &TaskRecord) -> DbResult<()>;
    /// Reads the current rows ordered by ascending id.
    fn list_all(&self) -> DbResult<Vec<TaskRecord>>;
    /// Returns a receiver holding the latest full snapshot.
    fn subscribe(&self) -> watch::Receiver<Vec<TaskRecord>>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
    snapshots: watch::Sender<Vec<TaskRecord>>,
}

impl SqliteTaskStore {
    /// Wraps a bootstrapped connection and seeds the snapshot channel.
    ///
    /// # Errors
    /// - `DbError::MissingTable` when the connection skipped schema bootstrap.
    pub fn new(conn: Connection) -> DbResult<Self> {
        ensure_task_table(&conn)?;
        let initial = select_all(&conn)?;
        debug!(
            "event=store_open module=store status=ok rows={}",
            initial.len()
        );
        let (snapshots, _) = watch::channel(initial);
        Ok(Self {
            conn: Mutex::new(conn),
            snapshots,
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::new(open_db(path)?)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    fn mutate<T>(
        &self,
        op: &'static str,
        apply: impl FnOnce(&Connection) -> DbResult<(T, bool)>,
    ) -> DbResult<T> {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        let (value, changed) = apply(&conn).map_err(|err| {
            error!("event=store_mutation module=store status=error op={op} error={err}");
            err
        })?;

        if !changed {
            debug!("event=store_mutation module=store status=noop op={op}");
            return Ok(value);
        }

        match select_all(&conn) {
            Ok(snapshot) => {
                debug!(
                    "event=store_publish module=store status=ok op={} rows={}",
                    op,
                    snapshot.len()
                );
                self.snapshots.send_replace(snapshot);
            }
            Err(err) => {
                error!("event=store_publish module=store status=error op={op} error={err}");
            }
        }
        Ok(value)
    }
}

impl TaskStore for SqliteTaskStore {
    fn create(&self, record: &TaskRecord) -> DbResult<u64> {
        self.mutate("create", |conn| {
            let explicit_id = match record.id {
                0 => None,
                id => Some(to_rowid(id)?),
            };
            conn.execute(
                "INSERT OR REPLACE INTO todos (id, title, description, is_done)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    explicit_id,
                    record.title.as_str(),
                    record.description.as_str(),
                    record.is_done,
                ],
            )?;
            let id = from_rowid(conn.last_insert_rowid())?;
            Ok((id, true))
        })
    }

    fn update(&self, record: &TaskRecord) -> DbResult<()> {
        self.mutate("update", |conn| {
            let Ok(rowid) = to_rowid(record.id) else {
                return Ok(((), false));
            };
            let changed = conn.execute(
                "UPDATE todos
                 SET
                    title = ?1,
                    description = ?2,
                    is_done = ?3
                 WHERE id = ?4;",
                params![
                    record.title.as_str(),
                    record.description.as_str(),
                    record.is_done,
                    rowid,
                ],
            )?;
            Ok(((), changed > 0))
        })
    }

    fn delete(&self, record: &TaskRecord) -> DbResult<()> {
        self.mutate("delete", |conn| {
            let Ok(rowid) = to_rowid(record.id) else {
                return Ok(((), false));
            };
            let changed = conn.execute("DELETE FROM todos WHERE id = ?1;", [rowid])?;
            Ok(((), changed > 0))
        })
    }

    fn list_all(&self) -> DbResult<Vec<TaskRecord>> {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        select_all(&conn)
    }

    fn subscribe(&self) -> watch::Receiver<Vec<TaskRecord>> {
        self.snapshots.subscribe()
    }
}

fn ensure_task_table(conn: &Connection) -> DbResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [TASK_TABLE],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(DbError::MissingTable(TASK_TABLE))
    }
}

fn select_all(conn: &Connection) -> DbResult<Vec<TaskRecord>> {
    let mut stmt = conn.prepare_cached(TASK_SELECT_SQL)?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_task_row(row)?);
    }
    Ok(records)
}

fn parse_task_row(row: &Row<'_>) -> DbResult<TaskRecord> {
    Ok(TaskRecord {
        id: from_rowid(row.get("id")?)?,
        title: row.get("title")?,
        description: row.get("description")?,
        is_done: row.get("is_done")?,
    })
}

fn to_rowid(id: u64) -> DbResult<i64> {
    i64::try_from(id).map_err(|_| DbError::IdOutOfRange(id))
}

fn from_rowid(rowid: i64) -> DbResult<u64> {
    u64::try_from(rowid)
        .map_err(|_| DbError::InvalidData(format!("negative id `{rowid}` in todos.id")))
}
