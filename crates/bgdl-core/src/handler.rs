//! Handler slots attached to a download task
//!
//! Each task carries four optional callbacks. They can be set through the
//! chainable task methods, through the canonical accessors, or through the
//! legacy underscore-prefixed accessors; all three write the same slot, and
//! the slot is read at dispatch time so late assignments still take effect.

use crate::error::DownloaderError;
use bgdl_types::{BeginInfo, DoneInfo, ErrorInfo, ProgressInfo};
use std::fmt;
use std::sync::Arc;

/// A single-argument callback
pub type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// A value assigned to a handler slot by a host.
///
/// Hosts without static types can hand over anything; only functions and
/// null are valid.
pub enum HandlerValue<P> {
    Function(Handler<P>),
    Unset,
    Other(serde_json::Value),
}

impl<P> HandlerValue<P> {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        HandlerValue::Function(Arc::new(f))
    }

    /// Validate into the slot contents. `Unset` clears the slot.
    pub fn into_slot(self) -> Result<Option<Handler<P>>, DownloaderError> {
        match self {
            HandlerValue::Function(handler) => Ok(Some(handler)),
            HandlerValue::Unset => Ok(None),
            HandlerValue::Other(value) => Err(DownloaderError::InvalidHandler {
                got: host_type_name(&value),
            }),
        }
    }
}

impl<P> From<Handler<P>> for HandlerValue<P> {
    fn from(handler: Handler<P>) -> Self {
        HandlerValue::Function(handler)
    }
}

impl<P> From<Option<Handler<P>>> for HandlerValue<P> {
    fn from(handler: Option<Handler<P>>) -> Self {
        match handler {
            Some(handler) => HandlerValue::Function(handler),
            None => HandlerValue::Unset,
        }
    }
}

impl<P> From<serde_json::Value> for HandlerValue<P> {
    fn from(value: serde_json::Value) -> Self {
        if value.is_null() {
            HandlerValue::Unset
        } else {
            HandlerValue::Other(value)
        }
    }
}

impl<P> fmt::Debug for HandlerValue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerValue::Function(_) => f.write_str("Function(..)"),
            HandlerValue::Unset => f.write_str("Unset"),
            HandlerValue::Other(value) => f.debug_tuple("Other").field(value).finish(),
        }
    }
}

/// Type name as the host's `typeof` reports it
fn host_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::String(_) => "string",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            "object"
        }
    }
}

/// Which of the four slots a handler lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Begin,
    Progress,
    Done,
    Error,
}

impl HandlerKind {
    /// Resolve host property names like `beginHandler` or `_doneHandler`.
    /// The underscore spelling is a legacy alias for the same slot.
    pub fn from_property(name: &str) -> Option<Self> {
        let name = name.strip_prefix('_').unwrap_or(name);
        match name {
            "beginHandler" => Some(HandlerKind::Begin),
            "progressHandler" => Some(HandlerKind::Progress),
            "doneHandler" => Some(HandlerKind::Done),
            "errorHandler" => Some(HandlerKind::Error),
            _ => None,
        }
    }
}

/// Canonical storage for the four slots
#[derive(Default, Clone)]
pub(crate) struct HandlerSlots {
    pub begin: Option<Handler<BeginInfo>>,
    pub progress: Option<Handler<ProgressInfo>>,
    pub done: Option<Handler<DoneInfo>>,
    pub error: Option<Handler<ErrorInfo>>,
}

impl HandlerSlots {
    /// Copy every set slot from `other`, leaving the rest untouched
    pub fn adopt(&mut self, other: &HandlerSlots) {
        if let Some(handler) = &other.begin {
            self.begin = Some(Arc::clone(handler));
        }
        if let Some(handler) = &other.progress {
            self.progress = Some(Arc::clone(handler));
        }
        if let Some(handler) = &other.done {
            self.done = Some(Arc::clone(handler));
        }
        if let Some(handler) = &other.error {
            self.error = Some(Arc::clone(handler));
        }
    }

    pub fn is_set(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Begin => self.begin.is_some(),
            HandlerKind::Progress => self.progress.is_some(),
            HandlerKind::Done => self.done.is_some(),
            HandlerKind::Error => self.error.is_some(),
        }
    }

    pub fn clear(&mut self, kind: HandlerKind) {
        match kind {
            HandlerKind::Begin => self.begin = None,
            HandlerKind::Progress => self.progress = None,
            HandlerKind::Done => self.done = None,
            HandlerKind::Error => self.error = None,
        }
    }
}
