//! Recording engine used by the unit tests

use crate::native::NativeEngine;
use bgdl_types::{ExistingDownload, LegacyConstants, NativeConstants, NativeDownloadRequest, NativeEvent};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

/// A native call as the mock saw it
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    Download(NativeDownloadRequest),
    Pause(String),
    Resume(String),
    Stop(String),
    CompleteHandler(String),
    CheckForExisting,
}

pub struct MockEngine {
    calls: Mutex<Vec<NativeCall>>,
    existing: Mutex<Result<Vec<ExistingDownload>, String>>,
    constants: Mutex<Result<Option<NativeConstants>, String>>,
    legacy: Mutex<LegacyConstants>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<NativeEvent>>>,
}

impl MockEngine {
    pub const RUNNING: i64 = 0;
    pub const SUSPENDED: i64 = 1;
    pub const CANCELING: i64 = 2;
    pub const COMPLETED: i64 = 3;

    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            existing: Mutex::new(Ok(Vec::new())),
            constants: Mutex::new(Ok(Some(Self::default_constants()))),
            legacy: Mutex::new(LegacyConstants::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn default_constants() -> NativeConstants {
        NativeConstants {
            documents: "/data/user/0/app/files".to_string(),
            task_running: Self::RUNNING,
            task_suspended: Self::SUSPENDED,
            task_canceling: Self::CANCELING,
            task_completed: Self::COMPLETED,
        }
    }

    pub fn set_constants(&self, constants: Result<Option<NativeConstants>, String>) {
        *self.constants.lock() = constants;
    }

    pub fn set_legacy_constants(&self, legacy: LegacyConstants) {
        *self.legacy.lock() = legacy;
    }

    pub fn set_existing(&self, existing: Result<Vec<ExistingDownload>, String>) {
        *self.existing.lock() = existing;
    }

    /// Deliver an event to every live subscriber
    pub fn emit(&self, event: NativeEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&NativeCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| matches(call)).count()
    }

    pub fn last_download(&self) -> Option<NativeDownloadRequest> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            NativeCall::Download(request) => Some(request.clone()),
            _ => None,
        })
    }

    fn record(&self, call: NativeCall) {
        self.calls.lock().push(call);
    }
}

impl NativeEngine for MockEngine {
    fn download(&self, request: NativeDownloadRequest) {
        self.record(NativeCall::Download(request));
    }

    fn pause_task(&self, id: &str) {
        self.record(NativeCall::Pause(id.to_string()));
    }

    fn resume_task(&self, id: &str) {
        self.record(NativeCall::Resume(id.to_string()));
    }

    fn stop_task(&self, id: &str) {
        self.record(NativeCall::Stop(id.to_string()));
    }

    fn complete_handler(&self, id: &str) {
        self.record(NativeCall::CompleteHandler(id.to_string()));
    }

    fn check_for_existing_downloads(&self) -> BoxFuture<'_, Result<Vec<ExistingDownload>, String>> {
        self.record(NativeCall::CheckForExisting);
        let existing = self.existing.lock().clone();
        Box::pin(async move { existing })
    }

    fn constants(&self) -> Result<Option<NativeConstants>, String> {
        self.constants.lock().clone()
    }

    fn legacy_constants(&self) -> LegacyConstants {
        self.legacy.lock().clone()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<NativeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }
}

/// In-memory sink for formatted log lines
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber scoped to the current thread and return what it logged
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
