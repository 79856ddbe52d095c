//! Lossless conversion between storage rows and domain tasks.

use crate::model::task::Task;
use crate::store::record::TaskRecord;

pub fn to_domain(record: &TaskRecord) -> Task {
    Task {
        id: record.id,
        title: record.title.clone(),
        description: record.description.clone(),
        is_done: record.is_done,
    }
}

pub fn to_domain_all(records: &[TaskRecord]) -> Vec<Task> {
    records.iter().map(to_domain).collect()
}

/// Converts a domain task into the row shape used for inserts and updates.
pub fn to_entity(task: &Task) -> TaskRecord {
    TaskRecord {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        is_done: task.is_done,
    }
}

pub fn to_entity_all(tasks: &[Task]) -> Vec<TaskRecord> {
    tasks.iter().map(to_entity).collect()
}
