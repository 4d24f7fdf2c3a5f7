//! Error types for the cell layer.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in cell operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Message model or payload error.
    #[error("Message error: {0}")]
    Message(#[from] atlas_message::Error),

    /// No part with the requested identifier.
    #[error("Message part not found: {0}")]
    PartNotFound(String),

    /// URI is not a `layer:` message part reference.
    #[error("Unsupported request URI: {0}")]
    UnsupportedUri(String),

    /// Part download did not finish in time.
    #[error("Download of {part} timed out after {timeout:?}")]
    DownloadTimeout {
        /// Part identifier.
        part: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// Part download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// A URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Image load failed.
    #[error("Image load failed: {0}")]
    ImageLoad(String),

    /// A scoped capability was used after its scope closed.
    #[error("{0} is no longer available")]
    Unavailable(&'static str),

    /// Location could not be determined.
    #[error("Location unavailable: {0}")]
    Location(String),

    /// Message could not be sent.
    #[error("Send failed: {0}")]
    Send(String),

    /// Refused to send blank text.
    #[error("No text to send")]
    EmptyText,

    /// No registered factory accepts the message.
    #[error("No cell factory for message {0}")]
    NoFactory(String),

    /// Holder was created for a different factory than the message needs.
    #[error("Holder view type does not match message {0}")]
    ViewTypeMismatch(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
