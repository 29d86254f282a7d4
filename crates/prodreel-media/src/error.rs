//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while retrieving or processing a video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("download failed with upstream status {status}")]
    Download { status: u16 },

    #[error("downloaded video is empty")]
    EmptyDownload,

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg failed: {stderr}")]
    FfmpegFailed { stderr: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
