//! Storage-native task row.

/// One row of the `todos` table.
///
/// `id == 0` asks the store to assign the next key on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub is_done: bool,
}
