/// Convenience result type used across thumbwatch.
pub type ThumbResult<T> = Result<T, ThumbError>;

/// Error taxonomy for conversion jobs, startup and the watcher.
///
/// `Decode` and `Encode` abort a single job before the source file is touched.
/// `Disposal` is reported after the output already exists. `Config` and `Watch`
/// are fatal for the process.
#[derive(thiserror::Error, Debug)]
pub enum ThumbError {
    /// Source file unreadable, unsupported or corrupt.
    #[error("decode error: {0}")]
    Decode(String),

    /// Rendering or writing the output PNG failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Deleting or archiving the original failed after a successful write.
    #[error("disposal error: {0}")]
    Disposal(String),

    /// Invalid configuration or required directories could not be created.
    #[error("config error: {0}")]
    Config(String),

    /// The change subscription failed or the watched directory went away.
    #[error("watch error: {0}")]
    Watch(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ThumbError {
    /// Build a [`ThumbError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ThumbError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ThumbError::Disposal`] value.
    pub fn disposal(msg: impl Into<String>) -> Self {
        Self::Disposal(msg.into())
    }

    /// Build a [`ThumbError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ThumbError::Watch`] value.
    pub fn watch(msg: impl Into<String>) -> Self {
        Self::Watch(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
