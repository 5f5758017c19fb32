//! Task registry - id -> task mapping shared by the facade and the router

use crate::task::DownloadTask;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-flight tasks keyed by id.
///
/// Clones share the same map. Entries are added when a download starts or a
/// reconciliation rebuilds it, and removed when a completion or failure
/// event is routed.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, DownloadTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its id, returning the task it replaced
    pub fn insert(&self, task: DownloadTask) -> Option<DownloadTask> {
        self.tasks.write().insert(task.id().to_string(), task)
    }

    pub fn get(&self, id: &str) -> Option<DownloadTask> {
        self.tasks.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<DownloadTask> {
        self.tasks.write().remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Snapshot of every registered task, in no particular order
    pub fn tasks(&self) -> Vec<DownloadTask> {
        self.tasks.read().values().cloned().collect()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tasks = self.tasks.read();
        f.debug_struct("TaskRegistry")
            .field("ids", &tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}
