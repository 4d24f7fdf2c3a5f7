//! Error types for message operations.

/// Result type alias for message operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid MIME type string.
    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),

    /// JSON payload could not be parsed or produced.
    #[error("JSON payload error: {0}")]
    Json(#[from] serde_json::Error),

    /// Message does not have the part layout a payload requires.
    #[error("Unexpected part layout: {0}")]
    PartLayout(String),

    /// Part content has not been downloaded yet.
    #[error("Part content not ready: {0}")]
    ContentNotReady(String),

    /// Image decode or encode error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Image input was empty.
    #[error("Image input is empty")]
    EmptyImage,
}
