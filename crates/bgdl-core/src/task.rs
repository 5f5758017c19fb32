//! Download task handle
//!
//! A `DownloadTask` is a cheap, cloneable handle to one download. The registry
//! and the application share the same underlying task, so state changes made
//! by routed events are visible through every clone.
//!
//! `pause`, `resume` and `stop` update local state immediately and then tell
//! the native engine without waiting for it. Done and failed are only reached
//! through native events.

use crate::error::DownloaderError;
use crate::handler::{Handler, HandlerKind, HandlerSlots, HandlerValue};
use crate::native::NativeEngine;
use bgdl_types::{BeginInfo, DoneInfo, ErrorInfo, ExistingDownload, ProgressInfo, TaskState};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Handle to a single download
#[derive(Clone)]
pub struct DownloadTask {
    inner: Arc<TaskInner>,
}

struct TaskInner {
    id: String,
    metadata: serde_json::Value,
    progress: RwLock<TaskProgress>,
    handlers: RwLock<HandlerSlots>,
    engine: Arc<dyn NativeEngine>,
}

#[derive(Debug, Clone, Copy, Default)]
struct TaskProgress {
    state: TaskState,
    bytes_downloaded: u64,
    bytes_total: u64,
}

impl DownloadTask {
    /// Create a pending task for a freshly requested download
    pub(crate) fn new(id: String, metadata: serde_json::Value, engine: Arc<dyn NativeEngine>) -> Self {
        Self::build(id, metadata, TaskProgress::default(), HandlerSlots::default(), engine)
    }

    /// Rebuild a task from what the native engine reports, carrying over the
    /// handlers of the task previously registered under the same id.
    pub(crate) fn from_existing(
        info: &ExistingDownload,
        previous: Option<&DownloadTask>,
        engine: Arc<dyn NativeEngine>,
    ) -> Self {
        let progress = TaskProgress {
            state: TaskState::Pending,
            bytes_downloaded: info.bytes_downloaded,
            bytes_total: info.bytes_total,
        };

        let mut handlers = HandlerSlots::default();
        if let Some(previous) = previous {
            handlers.adopt(&previous.inner.handlers.read());
        }

        Self::build(info.id.clone(), parse_metadata(&info.metadata), progress, handlers, engine)
    }

    fn build(
        id: String,
        metadata: serde_json::Value,
        progress: TaskProgress,
        handlers: HandlerSlots,
        engine: Arc<dyn NativeEngine>,
    ) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                id,
                metadata,
                progress: RwLock::new(progress),
                handlers: RwLock::new(handlers),
                engine,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn state(&self) -> TaskState {
        self.inner.progress.read().state
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.inner.progress.read().bytes_downloaded
    }

    pub fn bytes_total(&self) -> u64 {
        self.inner.progress.read().bytes_total
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.inner.metadata
    }

    /// Whether two handles point at the same task
    pub fn ptr_eq(&self, other: &DownloadTask) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.inner.progress.write().state = state;
    }

    // ========================================================================
    // Chainable handler registration
    // ========================================================================

    pub fn begin<F>(&self, handler: F) -> &Self
    where
        F: Fn(&BeginInfo) + Send + Sync + 'static,
    {
        self.inner.handlers.write().begin = Some(Arc::new(handler));
        self
    }

    pub fn progress<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ProgressInfo) + Send + Sync + 'static,
    {
        self.inner.handlers.write().progress = Some(Arc::new(handler));
        self
    }

    pub fn done<F>(&self, handler: F) -> &Self
    where
        F: Fn(&DoneInfo) + Send + Sync + 'static,
    {
        self.inner.handlers.write().done = Some(Arc::new(handler));
        self
    }

    pub fn error<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ErrorInfo) + Send + Sync + 'static,
    {
        self.inner.handlers.write().error = Some(Arc::new(handler));
        self
    }

    // ========================================================================
    // Handler accessors
    // ========================================================================

    pub fn begin_handler(&self) -> Option<Handler<BeginInfo>> {
        self.inner.handlers.read().begin.clone()
    }

    pub fn set_begin_handler(
        &self,
        value: impl Into<HandlerValue<BeginInfo>>,
    ) -> Result<&Self, DownloaderError> {
        let slot = value.into().into_slot()?;
        self.inner.handlers.write().begin = slot;
        Ok(self)
    }

    pub fn progress_handler(&self) -> Option<Handler<ProgressInfo>> {
        self.inner.handlers.read().progress.clone()
    }

    pub fn set_progress_handler(
        &self,
        value: impl Into<HandlerValue<ProgressInfo>>,
    ) -> Result<&Self, DownloaderError> {
        let slot = value.into().into_slot()?;
        self.inner.handlers.write().progress = slot;
        Ok(self)
    }

    pub fn done_handler(&self) -> Option<Handler<DoneInfo>> {
        self.inner.handlers.read().done.clone()
    }

    pub fn set_done_handler(
        &self,
        value: impl Into<HandlerValue<DoneInfo>>,
    ) -> Result<&Self, DownloaderError> {
        let slot = value.into().into_slot()?;
        self.inner.handlers.write().done = slot;
        Ok(self)
    }

    pub fn error_handler(&self) -> Option<Handler<ErrorInfo>> {
        self.inner.handlers.read().error.clone()
    }

    pub fn set_error_handler(
        &self,
        value: impl Into<HandlerValue<ErrorInfo>>,
    ) -> Result<&Self, DownloaderError> {
        let slot = value.into().into_slot()?;
        self.inner.handlers.write().error = slot;
        Ok(self)
    }

    // Legacy `_xxxHandler` spellings

    pub fn legacy_begin_handler(&self) -> Option<Handler<BeginInfo>> {
        self.begin_handler()
    }

    pub fn set_legacy_begin_handler(
        &self,
        value: impl Into<HandlerValue<BeginInfo>>,
    ) -> Result<&Self, DownloaderError> {
        self.set_begin_handler(value)
    }

    pub fn legacy_progress_handler(&self) -> Option<Handler<ProgressInfo>> {
        self.progress_handler()
    }

    pub fn set_legacy_progress_handler(
        &self,
        value: impl Into<HandlerValue<ProgressInfo>>,
    ) -> Result<&Self, DownloaderError> {
        self.set_progress_handler(value)
    }

    pub fn legacy_done_handler(&self) -> Option<Handler<DoneInfo>> {
        self.done_handler()
    }

    pub fn set_legacy_done_handler(
        &self,
        value: impl Into<HandlerValue<DoneInfo>>,
    ) -> Result<&Self, DownloaderError> {
        self.set_done_handler(value)
    }

    pub fn legacy_error_handler(&self) -> Option<Handler<ErrorInfo>> {
        self.error_handler()
    }

    pub fn set_legacy_error_handler(
        &self,
        value: impl Into<HandlerValue<ErrorInfo>>,
    ) -> Result<&Self, DownloaderError> {
        self.set_error_handler(value)
    }

    pub fn has_handler(&self, kind: HandlerKind) -> bool {
        self.inner.handlers.read().is_set(kind)
    }

    /// Apply a plain-data write to a named handler property from a dynamic host.
    ///
    /// Null clears the slot; any other value is rejected. Returns `Ok(false)`
    /// when `name` is not a handler property.
    pub fn assign_property(&self, name: &str, value: serde_json::Value) -> Result<bool, DownloaderError> {
        let Some(kind) = HandlerKind::from_property(name) else {
            return Ok(false);
        };

        // Functions cannot travel as plain data, so only null is valid here.
        HandlerValue::<()>::from(value).into_slot()?;
        self.inner.handlers.write().clear(kind);
        Ok(true)
    }

    // ========================================================================
    // Native event entry points
    // ========================================================================

    pub fn on_begin(&self, info: BeginInfo) {
        self.set_state(TaskState::Downloading);

        let handler = self.begin_handler();
        if let Some(handler) = handler {
            handler(&info);
        }
    }

    /// Byte counts are absolute totals and replace the previous values
    pub fn on_progress(&self, info: ProgressInfo) {
        {
            let mut progress = self.inner.progress.write();
            progress.bytes_downloaded = info.bytes_downloaded;
            progress.bytes_total = info.bytes_total;
        }

        let handler = self.progress_handler();
        if let Some(handler) = handler {
            handler(&info);
        }
    }

    pub fn on_done(&self, info: DoneInfo) {
        {
            let mut progress = self.inner.progress.write();
            progress.state = TaskState::Done;
            progress.bytes_downloaded = info.bytes_downloaded;
            progress.bytes_total = info.bytes_total;
        }

        let handler = self.done_handler();
        if let Some(handler) = handler {
            handler(&info);
        }
    }

    /// Byte counts are left as they were
    pub fn on_error(&self, info: ErrorInfo) {
        self.set_state(TaskState::Failed);

        let handler = self.error_handler();
        if let Some(handler) = handler {
            handler(&info);
        }
    }

    // ========================================================================
    // Control
    // ========================================================================

    pub fn pause(&self) {
        self.set_state(TaskState::Paused);
        self.inner.engine.pause_task(&self.inner.id);
    }

    pub fn resume(&self) {
        self.set_state(TaskState::Downloading);
        self.inner.engine.resume_task(&self.inner.id);
    }

    /// Stopping does not unregister the task; that only happens when the
    /// engine reports completion or failure.
    pub fn stop(&self) {
        self.set_state(TaskState::Stopped);
        self.inner.engine.stop_task(&self.inner.id);
    }
}

impl fmt::Debug for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = *self.inner.progress.read();
        f.debug_struct("DownloadTask")
            .field("id", &self.inner.id)
            .field("state", &progress.state)
            .field("bytes_downloaded", &progress.bytes_downloaded)
            .field("bytes_total", &progress.bytes_total)
            .field("metadata", &self.inner.metadata)
            .finish()
    }
}

/// Parse metadata stored natively as a JSON string. Unparseable, missing or
/// falsy metadata (`null`, `false`, `0`, `""`) becomes an empty object.
pub(crate) fn parse_metadata(raw: &str) -> serde_json::Value {
    if raw.is_empty() {
        return empty_metadata();
    }

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) if is_falsy(&value) => empty_metadata(),
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse task metadata {:?}: {}", raw, e);
            empty_metadata()
        }
    }
}

fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}

pub(crate) fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
