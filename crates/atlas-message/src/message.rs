//! Message and message part structures.
//!
//! Messages are owned by the messaging SDK. Atlas only reads them: the sole
//! mutable aspect is whether a part's payload has been downloaded yet.

use crate::error::{Error, Result};
use crate::mime_type::MimeType;
use bytes::Bytes;
use std::fmt;

const MESSAGE_URI_PREFIX: &str = "layer:///messages/";

/// Stable message identifier (`layer:///messages/<uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the identifier for a message UUID.
    #[must_use]
    pub fn from_uuid(uuid: &str) -> Self {
        Self(format!("{MESSAGE_URI_PREFIX}{uuid}"))
    }

    /// Returns the identifier for the part at `index`.
    #[must_use]
    pub fn part(&self, index: usize) -> PartId {
        PartId(format!("{}/parts/{index}", self.0))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable part identifier (`layer:///messages/<uuid>/parts/<n>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(String);

impl PartId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    /// Part identifier.
    pub id: PartId,
    /// Raw MIME type string as stored by the SDK.
    pub mime_type: String,
    /// Payload size in bytes (known even before download).
    pub size: u64,
    /// Payload, `None` until the content has been downloaded.
    pub data: Option<Bytes>,
}

impl MessagePart {
    /// Creates a part whose content is locally available.
    #[must_use]
    pub fn ready(id: PartId, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            id,
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data: Some(data),
        }
    }

    /// Creates a part whose content still has to be fetched.
    #[must_use]
    pub fn pending(id: PartId, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            id,
            mime_type: mime_type.into(),
            size,
            data: None,
        }
    }

    /// Returns `true` if the payload bytes are locally available.
    #[must_use]
    pub const fn is_content_ready(&self) -> bool {
        self.data.is_some()
    }

    /// Parses the MIME type.
    ///
    /// # Errors
    ///
    /// Returns an error if the MIME type string is invalid.
    pub fn mime(&self) -> Result<MimeType> {
        MimeType::parse(&self.mime_type)
    }

    /// Returns `true` if the MIME type is `image/*`.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime().is_ok_and(|mime| mime.is_image())
    }

    /// Returns the payload bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the content has not been downloaded.
    pub fn bytes(&self) -> Result<&Bytes> {
        self.data
            .as_ref()
            .ok_or_else(|| Error::ContentNotReady(self.id.to_string()))
    }

    /// Returns the payload as text, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the content has not been downloaded.
    pub fn text(&self) -> Result<String> {
        self.bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// A message as seen by the cell layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// Ordered message parts.
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// Creates a message.
    #[must_use]
    pub const fn new(id: MessageId, parts: Vec<MessagePart>) -> Self {
        Self { id, parts }
    }

    /// Returns the part at `index`.
    #[must_use]
    pub fn part(&self, index: usize) -> Option<&MessagePart> {
        self.parts.get(index)
    }

    /// Returns the MIME type of the first part.
    #[must_use]
    pub fn first_mime_type(&self) -> Option<&str> {
        self.parts.first().map(|part| part.mime_type.as_str())
    }

    /// Returns `true` if the first part's MIME type equals `mime_type`.
    #[must_use]
    pub fn first_part_is(&self, mime_type: &str) -> bool {
        self.first_mime_type() == Some(mime_type)
    }
}

/// A part of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPart {
    /// MIME type string.
    pub mime_type: String,
    /// Payload bytes.
    pub data: Bytes,
}

impl NewPart {
    /// Creates a new outgoing part.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// An outgoing message draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMessage {
    /// Ordered parts.
    pub parts: Vec<NewPart>,
    /// Push notification text shown to recipients.
    pub notification: Option<String>,
}

impl NewMessage {
    /// Creates a draft from parts.
    #[must_use]
    pub const fn new(parts: Vec<NewPart>) -> Self {
        Self {
            parts,
            notification: None,
        }
    }

    /// Sets the push notification text.
    #[must_use]
    pub fn with_notification(mut self, notification: impl Into<String>) -> Self {
        self.notification = Some(notification.into());
        self
    }

    /// Materializes the draft as a stored message with every part ready.
    #[must_use]
    pub fn into_message(self, id: MessageId) -> Message {
        let parts = self
            .parts
            .into_iter()
            .enumerate()
            .map(|(index, part)| MessagePart::ready(id.part(index), part.mime_type, part.data))
            .collect();
        Message::new(id, parts)
    }
}
