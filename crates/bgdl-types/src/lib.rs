//! Shared types for bgdl
//!
//! This crate contains the data structures exchanged between the
//! application layer, the task registry and the native download engine.
//! Field names serialize in camelCase so they line up with the payloads
//! the native side emits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Request/response headers as a flat name -> value map.
///
/// A `None` value is sent as null, which lets a caller blank out a default
/// header configured through `set_config`.
pub type DownloadHeaders = HashMap<String, Option<String>>;

// ============================================================================
// Task Types
// ============================================================================

/// Lifecycle state of a download task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    Pending,
    Downloading,
    Paused,
    Done,
    Failed,
    Stopped,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Downloading => "DOWNLOADING",
            TaskState::Paused => "PAUSED",
            TaskState::Done => "DONE",
            TaskState::Failed => "FAILED",
            TaskState::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Download Request Types
// ============================================================================

/// Options accepted when starting a download
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOptions {
    pub id: String,
    pub url: String,
    pub destination: String,
    #[serde(default)]
    pub headers: DownloadHeaders,
    /// Caller data round-tripped through native storage. Only objects are kept.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub is_allowed_over_roaming: Option<bool>,
    #[serde(default)]
    pub is_allowed_over_metered: Option<bool>,
    #[serde(default)]
    pub is_notification_visible: Option<bool>,
    #[serde(default)]
    pub notification_title: Option<String>,
}

impl DownloadOptions {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            destination: destination.into(),
            ..Self::default()
        }
    }
}

/// The fully resolved option set handed to the native engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeDownloadRequest {
    pub id: String,
    pub url: String,
    pub destination: String,
    pub headers: DownloadHeaders,
    /// Metadata serialized as a JSON string
    pub metadata: String,
    pub is_allowed_over_roaming: bool,
    pub is_allowed_over_metered: bool,
    pub is_notification_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_title: Option<String>,
    /// Minimum milliseconds between progress batches
    pub progress_interval: u64,
}

/// A download the native engine reports as known to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingDownload {
    pub id: String,
    #[serde(default)]
    pub metadata: String,
    /// Native status code, compared against [`NativeConstants`]
    pub state: i64,
    #[serde(default)]
    pub bytes_downloaded: u64,
    #[serde(default)]
    pub bytes_total: u64,
}

// ============================================================================
// Native Constants
// ============================================================================

/// Values the native engine exports once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeConstants {
    pub documents: String,
    #[serde(rename = "TaskRunning")]
    pub task_running: i64,
    #[serde(rename = "TaskSuspended")]
    pub task_suspended: i64,
    #[serde(rename = "TaskCanceling")]
    pub task_canceling: i64,
    #[serde(rename = "TaskCompleted")]
    pub task_completed: i64,
}

/// Constants read one by one from engines without `getConstants`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyConstants {
    pub documents: Option<String>,
    #[serde(rename = "TaskRunning")]
    pub task_running: Option<i64>,
    #[serde(rename = "TaskSuspended")]
    pub task_suspended: Option<i64>,
    #[serde(rename = "TaskCanceling")]
    pub task_canceling: Option<i64>,
    #[serde(rename = "TaskCompleted")]
    pub task_completed: Option<i64>,
}

impl LegacyConstants {
    /// Returns the full constant set, or `None` if any value is missing
    pub fn complete(self) -> Option<NativeConstants> {
        Some(NativeConstants {
            documents: self.documents?,
            task_running: self.task_running?,
            task_suspended: self.task_suspended?,
            task_canceling: self.task_canceling?,
            task_completed: self.task_completed?,
        })
    }
}

/// Well-known directories exposed by the native engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directories {
    pub documents: String,
}

// ============================================================================
// Event Types
// ============================================================================

/// Payload of `downloadBegin`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginEvent {
    pub id: String,
    #[serde(default)]
    pub expected_bytes: u64,
    #[serde(default)]
    pub headers: DownloadHeaders,
}

/// One record of a `downloadProgress` batch. Byte counts are absolute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub id: String,
    pub bytes_downloaded: u64,
    pub bytes_total: u64,
}

/// Payload of `downloadComplete`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEvent {
    pub id: String,
    #[serde(default)]
    pub bytes_downloaded: u64,
    #[serde(default)]
    pub bytes_total: u64,
}

/// Payload of `downloadFailed`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEvent {
    pub id: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_code: i64,
}

/// Events emitted by the native engine, one variant per channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum NativeEvent {
    DownloadBegin(BeginEvent),
    /// Batched to amortize the cost of crossing the native boundary
    DownloadProgress(Vec<ProgressEvent>),
    DownloadComplete(CompleteEvent),
    DownloadFailed(FailedEvent),
}

impl NativeEvent {
    /// Channel name as the native side spells it
    pub fn channel(&self) -> &'static str {
        match self {
            NativeEvent::DownloadBegin(_) => "downloadBegin",
            NativeEvent::DownloadProgress(_) => "downloadProgress",
            NativeEvent::DownloadComplete(_) => "downloadComplete",
            NativeEvent::DownloadFailed(_) => "downloadFailed",
        }
    }
}

// ============================================================================
// Handler Payloads
// ============================================================================

/// What a begin handler receives: the begin event minus its routing id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginInfo {
    pub expected_bytes: u64,
    pub headers: DownloadHeaders,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    pub bytes_downloaded: u64,
    pub bytes_total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoneInfo {
    pub bytes_downloaded: u64,
    pub bytes_total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub error: String,
    pub error_code: i64,
}

impl From<BeginEvent> for BeginInfo {
    fn from(event: BeginEvent) -> Self {
        Self {
            expected_bytes: event.expected_bytes,
            headers: event.headers,
        }
    }
}

impl From<&ProgressEvent> for ProgressInfo {
    fn from(event: &ProgressEvent) -> Self {
        Self {
            bytes_downloaded: event.bytes_downloaded,
            bytes_total: event.bytes_total,
        }
    }
}

impl From<&CompleteEvent> for DoneInfo {
    fn from(event: &CompleteEvent) -> Self {
        Self {
            bytes_downloaded: event.bytes_downloaded,
            bytes_total: event.bytes_total,
        }
    }
}

impl From<FailedEvent> for ErrorInfo {
    fn from(event: FailedEvent) -> Self {
        Self {
            error: event.error,
            error_code: event.error_code,
        }
    }
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Smallest accepted progress interval, in milliseconds
pub const MIN_PROGRESS_INTERVAL: u64 = 250;

/// Progress interval used until configured otherwise, in milliseconds
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Process-wide settings read by every new download request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloaderConfig {
    /// Merged under the caller's headers; caller values win
    pub headers: DownloadHeaders,
    pub progress_interval: u64,
    pub is_logs_enabled: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            headers: DownloadHeaders::new(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            is_logs_enabled: false,
        }
    }
}

/// Partial update for [`DownloaderConfig`]; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default)]
    pub headers: Option<DownloadHeaders>,
    /// Signed so out-of-range host values reach validation instead of failing to parse
    #[serde(default)]
    pub progress_interval: Option<i64>,
    #[serde(default)]
    pub is_logs_enabled: Option<bool>,
}
