//! Three-part image sender.

use atlas_message::{NewMessage, PreviewConfig, compose_three_part};
use tracing::info;

use super::Conversation;
use crate::error::Result;

/// Sends images as three-part messages.
#[derive(Debug, Clone)]
pub struct ImageSender {
    sender_name: String,
    preview: PreviewConfig,
}

impl ImageSender {
    /// Creates a sender for `sender_name`.
    #[must_use]
    pub fn new(sender_name: impl Into<String>, preview: PreviewConfig) -> Self {
        Self {
            sender_name: sender_name.into(),
            preview,
        }
    }

    /// Builds the draft for encoded image `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded or the preview encoded.
    pub fn draft(&self, bytes: &[u8]) -> Result<NewMessage> {
        let draft = compose_three_part(bytes, &self.preview)?;
        Ok(draft.with_notification(format!("{} sent an image", self.sender_name)))
    }

    /// Sends the image to `conversation`.
    ///
    /// # Errors
    ///
    /// Returns an error if composing or sending fails.
    pub fn send(&self, bytes: &[u8], conversation: &dyn Conversation) -> Result<()> {
        let draft = self.draft(bytes)?;
        info!(bytes = bytes.len(), "Sending image");
        conversation.send(draft)
    }
}
