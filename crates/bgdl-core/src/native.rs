//! Boundary to the platform download engine
//!
//! The engine does the actual transfer work (sessions, resumption, disk I/O,
//! background execution). This layer only issues calls to it and listens to
//! the events it emits.

use crate::error::DownloaderError;
use bgdl_types::{ExistingDownload, LegacyConstants, NativeConstants, NativeDownloadRequest, NativeEvent};
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::warn;

/// A platform background download engine.
///
/// Control calls are fire-and-forget: nothing waits for the engine to
/// acknowledge them, so local task state can briefly run ahead of native state.
pub trait NativeEngine: Send + Sync {
    /// Start a download with a fully resolved option set
    fn download(&self, request: NativeDownloadRequest);

    fn pause_task(&self, id: &str);

    fn resume_task(&self, id: &str);

    fn stop_task(&self, id: &str);

    /// Signal that the app finished its background processing for `id`
    fn complete_handler(&self, id: &str);

    /// Every download the engine currently tracks
    fn check_for_existing_downloads(&self) -> BoxFuture<'_, Result<Vec<ExistingDownload>, String>>;

    /// Constants exported through `getConstants`. `Ok(None)` means the
    /// engine does not implement it.
    fn constants(&self) -> Result<Option<NativeConstants>, String>;

    /// Constants exported as individual properties by older engines
    fn legacy_constants(&self) -> LegacyConstants {
        LegacyConstants::default()
    }

    /// Stream of begin/progress/complete/failed events.
    ///
    /// Delivery must be lossless. A task only leaves the registry when its
    /// complete or failed event is routed.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<NativeEvent>;
}

/// Resolve the status constants, preferring `getConstants` and falling back
/// to the legacy per-property values.
pub fn resolve_constants(engine: &dyn NativeEngine) -> Result<NativeConstants, DownloaderError> {
    match engine.constants() {
        Ok(Some(constants)) => return Ok(constants),
        Ok(None) => {}
        Err(e) => warn!("Failed to load native constants: {}", e),
    }

    engine
        .legacy_constants()
        .complete()
        .ok_or(DownloaderError::ConstantsUnavailable)
}
