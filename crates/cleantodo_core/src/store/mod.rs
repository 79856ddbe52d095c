//! Record store: the durable task table and its change stream.
//!
//! # Responsibility
//! - Own the SQLite connection holding task rows.
//! - Publish a full ordered snapshot after every committed mutation.
//!
//! # Invariants
//! - Snapshots are ordered by ascending `id`.
//! - Update/delete of a missing id is a silent no-op.

pub mod record;
pub mod sqlite_store;
