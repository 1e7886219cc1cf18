//! Worker error types.

use thiserror::Error;

use reels_media::MediaError;
use reels_models::ModelError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Remote audio or text service failure
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// External tool failure or malformed media
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// Overlay/composition failure
    #[error("Compose failed: {0}")]
    Compose(String),

    #[error("No background videos found: {0}")]
    NoBackground(String),

    #[error("A job is already running")]
    AlreadyRunning,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for WorkerError {
    fn from(e: ModelError) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

impl WorkerError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn transcode(msg: impl Into<String>) -> Self {
        Self::Transcode(msg.into())
    }

    pub fn compose(msg: impl Into<String>) -> Self {
        Self::Compose(msg.into())
    }

    pub fn no_background(msg: impl Into<String>) -> Self {
        Self::NoBackground(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short classification used for metrics labels and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Fetch(_) => "fetch",
            WorkerError::Transcode(_) | WorkerError::Media(_) => "transcode",
            WorkerError::Compose(_) => "compose",
            WorkerError::NoBackground(_) => "no_background",
            WorkerError::AlreadyRunning => "already_running",
            WorkerError::InvalidRequest(_) => "invalid_request",
            WorkerError::Config(_) => "config",
            WorkerError::Io(_) => "io",
            WorkerError::Internal(_) => "internal",
        }
    }

    /// Check if error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Fetch(_) | WorkerError::Transcode(_) | WorkerError::Io(_) => true,
            WorkerError::Media(e) => !matches!(
                e,
                MediaError::FfmpegNotFound | MediaError::FfprobeNotFound | MediaError::FileNotFound(_)
            ),
            _ => false,
        }
    }
}
