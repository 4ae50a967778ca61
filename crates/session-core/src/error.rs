use thiserror::Error;

/// Failures surfaced by session operations.
///
/// None of these are fatal: the session logs them and keeps whatever state
/// the native stack left behind.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session configuration failed: {0}")]
    Configuration(#[source] NativeError),

    #[error("Failed to select input {device}: {source}")]
    InputSelection {
        device: String,
        #[source]
        source: NativeError,
    },

    #[error("Notification {name} is missing payload key {key}")]
    NotificationParse { name: String, key: &'static str },

    #[error("Shared audio session already in use by {owner}")]
    SessionInUse { owner: String },

    #[error("Device has no native port: {0}")]
    NoNativePort(String),
}

/// Error returned by a native audio-stack call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation}: {message}")]
pub struct NativeError {
    pub operation: &'static str,
    pub message: String,
}

impl NativeError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}
