//! Repository layer: the only path from domain code to the record store.
//!
//! # Responsibility
//! - Translate between `Task` and `TaskRecord` at the storage boundary.
//! - Expose the store's change stream as a stream of domain values.
//!
//! # Invariants
//! - Mutations never publish state themselves; observers see them through
//!   the store's snapshot stream.
//! - Store errors are carried upward untranslated.

pub mod mapper;
pub mod task_repo;
