/// Result alias that carries the custom [`VisemeSyncError`] type.
pub type Result<T> = std::result::Result<T, VisemeSyncError>;

/// Common error type for the core crate.
///
/// Only the edges of the engine return these: configuration loading, chunk
/// file parsing and media backends. The per-frame path never fails.
#[derive(Debug, thiserror::Error)]
pub enum VisemeSyncError {
    /// Free-form message for failures that do not deserve their own variant.
    #[error("{0}")]
    Message(String),
    /// A tuning value was rejected by [`crate::EngineConfig::validate`].
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The media backend cannot play the supplied payload.
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),
    /// Audio payload was not valid base64.
    #[error("audio payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Wrapper around JSON (de)serialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl VisemeSyncError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for VisemeSyncError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VisemeSyncError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
