//! Event router - forwards native events to registered tasks
//!
//! Routing is lookup-and-forward. Events for ids with no registered task are
//! dropped silently: native events can legitimately arrive before a task is
//! registered (re-entrant startup) or after it was removed.

use crate::config::SharedConfig;
use crate::registry::TaskRegistry;
use bgdl_types::{BeginEvent, CompleteEvent, FailedEvent, NativeEvent, ProgressEvent};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Dispatches native events into a [`TaskRegistry`]
#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: TaskRegistry,
    config: SharedConfig,
}

impl EventRouter {
    pub fn new(registry: TaskRegistry, config: SharedConfig) -> Self {
        Self { registry, config }
    }

    /// Route one event to its task(s)
    pub fn dispatch(&self, event: NativeEvent) {
        if self.config.logs_enabled() {
            debug!("{} received", event.channel());
        }

        match event {
            NativeEvent::DownloadBegin(event) => self.on_begin(event),
            NativeEvent::DownloadProgress(batch) => self.on_progress(batch),
            NativeEvent::DownloadComplete(event) => self.on_complete(event),
            NativeEvent::DownloadFailed(event) => self.on_failed(event),
        }
    }

    /// Consume the native event stream until the engine closes it
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<NativeEvent>) {
        while let Some(event) = rx.recv().await {
            self.dispatch(event);
        }

        info!("Native event stream closed, stopping router");
    }

    fn on_begin(&self, event: BeginEvent) {
        if self.config.logs_enabled() {
            debug!("downloadBegin {} expected_bytes={}", event.id, event.expected_bytes);
        }

        if let Some(task) = self.registry.get(&event.id) {
            task.on_begin(event.into());
        }
    }

    fn on_progress(&self, batch: Vec<ProgressEvent>) {
        if self.config.logs_enabled() {
            debug!("downloadProgress batch of {} (registered: {})", batch.len(), self.registry.len());
        }

        for event in &batch {
            let task = self.registry.get(&event.id);
            if self.config.logs_enabled() {
                debug!(
                    "downloadProgress {} {}/{} registered={}",
                    event.id,
                    event.bytes_downloaded,
                    event.bytes_total,
                    task.is_some()
                );
            }

            if let Some(task) = task {
                task.on_progress(event.into());
            }
        }
    }

    fn on_complete(&self, event: CompleteEvent) {
        if self.config.logs_enabled() {
            debug!(
                "downloadComplete {} {}/{}",
                event.id, event.bytes_downloaded, event.bytes_total
            );
        }

        if let Some(task) = self.registry.get(&event.id) {
            task.on_done((&event).into());
        }

        self.registry.remove(&event.id);
    }

    fn on_failed(&self, event: FailedEvent) {
        if self.config.logs_enabled() {
            debug!("downloadFailed {} code={} {}", event.id, event.error_code, event.error);
        }

        let id = event.id.clone();
        if let Some(task) = self.registry.get(&id) {
            task.on_error(event.into());
        }

        self.registry.remove(&id);
    }
}
