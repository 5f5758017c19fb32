//! Mapping native download status onto task state during reconciliation

use bgdl_types::{ExistingDownload, NativeConstants, TaskState};

/// What reconciliation does with one natively reported download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Register the task; `None` keeps the freshly built task's state
    Keep(Option<TaskState>),
    /// Issue a stop and leave the task out
    StopAndDrop,
    /// Leave the task out
    Drop,
}

/// Classify a reported download by its native status code
pub fn classify(info: &ExistingDownload, constants: &NativeConstants) -> Reconciliation {
    if info.state == constants.task_running {
        Reconciliation::Keep(Some(TaskState::Downloading))
    } else if info.state == constants.task_suspended {
        Reconciliation::Keep(Some(TaskState::Paused))
    } else if info.state == constants.task_canceling {
        Reconciliation::StopAndDrop
    } else if info.state == constants.task_completed {
        // The engine can report completion for a transfer that never finished
        if info.bytes_downloaded == info.bytes_total {
            Reconciliation::Keep(Some(TaskState::Done))
        } else {
            Reconciliation::Drop
        }
    } else {
        Reconciliation::Keep(None)
    }
}
