//! Process-wide downloader settings

use bgdl_types::{ConfigUpdate, DownloadHeaders, DownloaderConfig, MIN_PROGRESS_INTERVAL};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

/// Shared handle to the current [`DownloaderConfig`]
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<DownloaderConfig>>,
}

impl SharedConfig {
    pub fn new(config: DownloaderConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> DownloaderConfig {
        self.inner.read().clone()
    }

    pub fn logs_enabled(&self) -> bool {
        self.inner.read().is_logs_enabled
    }

    pub fn progress_interval(&self) -> u64 {
        self.inner.read().progress_interval
    }

    pub fn headers(&self) -> DownloadHeaders {
        self.inner.read().headers.clone()
    }

    /// Apply each present field. An interval below the floor is ignored with
    /// a warning and the previous interval stays in effect.
    pub fn apply(&self, update: ConfigUpdate) {
        let mut config = self.inner.write();

        if let Some(headers) = update.headers {
            config.headers = headers;
        }

        if let Some(interval) = update.progress_interval {
            match u64::try_from(interval) {
                Ok(interval) if interval >= MIN_PROGRESS_INTERVAL => {
                    config.progress_interval = interval;
                }
                _ => warn!(
                    "progressInterval must be a number >= {}. You passed {}",
                    MIN_PROGRESS_INTERVAL, interval
                ),
            }
        }

        if let Some(enabled) = update.is_logs_enabled {
            config.is_logs_enabled = enabled;
        }
    }
}
