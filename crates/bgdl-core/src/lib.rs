//! bgdl Core - background download bridge
//!
//! This crate sits between application code and a platform background
//! download engine. It owns the task registry, routes native events to the
//! right task, and exposes the calls an application makes: start a
//! download, reconcile with downloads the engine already knows about,
//! re-kick stalled downloads and tweak settings.
//!
//! Transfers, retries and resumption all happen inside the engine.

mod config;
mod error;
mod handler;
mod native;
mod reconcile;
mod registry;
mod router;
mod task;

#[cfg(test)]
mod mock;

pub use config::*;
pub use error::*;
pub use handler::{Handler, HandlerKind, HandlerValue};
pub use native::*;
pub use reconcile::*;
pub use registry::*;
pub use router::*;
pub use task::DownloadTask;

use bgdl_types::{
    ConfigUpdate, Directories, DownloadOptions, DownloaderConfig, NativeConstants,
    NativeDownloadRequest,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The main bridge instance.
///
/// Clones share the registry, config and engine.
#[derive(Clone)]
pub struct BackgroundDownloader {
    engine: Arc<dyn NativeEngine>,
    registry: TaskRegistry,
    config: SharedConfig,
    router: EventRouter,
    constants: NativeConstants,
    listening: Arc<AtomicBool>,
}

impl BackgroundDownloader {
    /// Create a bridge with default settings.
    ///
    /// Fails if the engine cannot provide its status constants.
    pub fn new(engine: Arc<dyn NativeEngine>) -> Result<Self, DownloaderError> {
        Self::with_config(engine, DownloaderConfig::default())
    }

    pub fn with_config(
        engine: Arc<dyn NativeEngine>,
        config: DownloaderConfig,
    ) -> Result<Self, DownloaderError> {
        let constants = resolve_constants(engine.as_ref())?;
        let registry = TaskRegistry::new();
        let config = SharedConfig::new(config);
        let router = EventRouter::new(registry.clone(), config.clone());

        Ok(Self {
            engine,
            registry,
            config,
            router,
            constants,
            listening: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Spawn the event loop that feeds native events into the registry.
    ///
    /// Only one listener runs per bridge (clones included). While it is
    /// running, further calls log a warning and return `None`.
    pub fn listen(&self) -> Option<JoinHandle<()>> {
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!("Already listening for native download events");
            return None;
        }

        info!("Listening for native download events");
        let router = self.router.clone();
        let events = self.engine.subscribe();
        let listening = Arc::clone(&self.listening);

        Some(tokio::spawn(async move {
            router.run(events).await;
            listening.store(false, Ordering::SeqCst);
        }))
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn task(&self, id: &str) -> Option<DownloadTask> {
        self.registry.get(id)
    }

    pub fn tasks(&self) -> Vec<DownloadTask> {
        self.registry.tasks()
    }

    pub fn directories(&self) -> Directories {
        Directories {
            documents: self.constants.documents.clone(),
        }
    }

    fn logs_enabled(&self) -> bool {
        self.config.logs_enabled()
    }

    // ========================================================================
    // Download Operations
    // ========================================================================

    /// Start a download and return its task.
    ///
    /// The task is registered before the engine is called, so events for it
    /// are routed from the first one on. The engine call is not awaited.
    pub fn download(&self, options: DownloadOptions) -> Result<DownloadTask, DownloaderError> {
        if self.logs_enabled() {
            debug!("download {} {} -> {}", options.id, options.url, options.destination);
        }

        if options.id.is_empty() || options.url.is_empty() || options.destination.is_empty() {
            return Err(DownloaderError::MissingRequiredOptions);
        }

        // Caller headers win, including a null that blanks out a default
        let mut headers = self.config.headers();
        headers.extend(options.headers);

        let metadata = match options.metadata {
            Some(serde_json::Value::Object(map)) => serde_json::Value::Object(map),
            _ => task::empty_metadata(),
        };

        let request = NativeDownloadRequest {
            id: options.id,
            url: options.url,
            destination: options.destination.replacen("file://", "", 1),
            headers,
            metadata: serde_json::to_string(&metadata)?,
            is_allowed_over_roaming: options.is_allowed_over_roaming.unwrap_or(true),
            is_allowed_over_metered: options.is_allowed_over_metered.unwrap_or(true),
            is_notification_visible: options.is_notification_visible.unwrap_or(false),
            notification_title: options.notification_title,
            progress_interval: self.config.progress_interval(),
        };

        let task = DownloadTask::new(request.id.clone(), metadata, Arc::clone(&self.engine));
        if self.registry.insert(task.clone()).is_some() {
            warn!("Download {} replaced an already registered task", request.id);
        }

        self.engine.download(request);

        Ok(task)
    }

    /// Rebuild the registry from the downloads the engine currently tracks.
    ///
    /// Handlers registered on a previous task with the same id carry over to
    /// the rebuilt task. Canceling downloads are stopped and left out, as are
    /// downloads reported complete with mismatched byte counts.
    pub async fn check_for_existing_downloads(&self) -> Result<Vec<DownloadTask>, DownloaderError> {
        if self.logs_enabled() {
            debug!("checkForExistingDownloads");
        }

        let found = self
            .engine
            .check_for_existing_downloads()
            .await
            .map_err(DownloaderError::Engine)?;

        if self.logs_enabled() {
            debug!("checkForExistingDownloads found {} downloads", found.len());
        }

        let mut tasks = Vec::with_capacity(found.len());
        for info in &found {
            let previous = self.registry.get(&info.id);
            let task = DownloadTask::from_existing(info, previous.as_ref(), Arc::clone(&self.engine));
            let outcome = classify(info, &self.constants);

            if self.logs_enabled() {
                debug!("existing download {} state={} -> {:?}", info.id, info.state, outcome);
            }

            match outcome {
                Reconciliation::Keep(state) => {
                    if let Some(state) = state {
                        task.set_state(state);
                    }
                    self.registry.insert(task.clone());
                    tasks.push(task);
                }
                Reconciliation::StopAndDrop => {
                    task.stop();
                    self.registry.remove(&info.id);
                }
                Reconciliation::Drop => {
                    self.registry.remove(&info.id);
                }
            }
        }

        Ok(tasks)
    }

    /// Reconcile, then pause and immediately resume every downloading task
    /// to recover sessions that stalled across an app relaunch.
    pub async fn ensure_downloads_are_running(&self) -> Result<(), DownloaderError> {
        if self.logs_enabled() {
            debug!("ensureDownloadsAreRunning");
        }

        let tasks = self.check_for_existing_downloads().await?;
        for task in tasks
            .iter()
            .filter(|task| task.state() == bgdl_types::TaskState::Downloading)
        {
            task.pause();
            task.resume();
        }

        Ok(())
    }

    /// Tell the engine the app finished background processing for `id`
    pub fn complete_handler(&self, id: &str) {
        if id.is_empty() {
            warn!("completeHandler: jobId is empty");
            return;
        }

        self.engine.complete_handler(id);
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn set_config(&self, update: ConfigUpdate) {
        self.config.apply(update);
    }

    pub fn config(&self) -> DownloaderConfig {
        self.config.snapshot()
    }
}

impl std::fmt::Debug for BackgroundDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundDownloader")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("constants", &self.constants)
            .finish()
    }
}
