//! Error types for bgdl core

use thiserror::Error;

/// Errors surfaced synchronously to the caller.
///
/// Failures of the download itself never show up here; they arrive as
/// `downloadFailed` events and reach the task's error handler.
#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("id, url and destination are required")]
    MissingRequiredOptions,

    #[error("expected argument to be a function, got: {got}")]
    InvalidHandler { got: &'static str },

    #[error("Native module constants are not available")]
    ConstantsUnavailable,

    #[error("Native engine error: {0}")]
    Engine(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
