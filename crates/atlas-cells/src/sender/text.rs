//! Plain text sender.

use atlas_message::{NewMessage, NewPart, TEXT_PLAIN};

use super::Conversation;
use crate::error::{Error, Result};

/// Sends `text/plain` messages.
#[derive(Debug, Clone)]
pub struct TextSender {
    sender_name: String,
    notification_max_length: usize,
}

impl TextSender {
    /// Creates a sender for `sender_name`.
    #[must_use]
    pub fn new(sender_name: impl Into<String>, notification_max_length: usize) -> Self {
        Self {
            sender_name: sender_name.into(),
            notification_max_length,
        }
    }

    /// Push notification text: `"<name>: <text>"`, truncated with `…`.
    #[must_use]
    pub fn notification(&self, text: &str) -> String {
        let body = if text.chars().count() < self.notification_max_length {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(self.notification_max_length).collect();
            format!("{truncated}…")
        };
        format!("{}: {body}", self.sender_name)
    }

    /// Builds the draft for `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyText`] for blank text.
    pub fn draft(&self, text: &str) -> Result<NewMessage> {
        if text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        Ok(
            NewMessage::new(vec![NewPart::new(TEXT_PLAIN, text.to_string())])
                .with_notification(self.notification(text)),
        )
    }

    /// Sends `text` to `conversation`.
    ///
    /// # Errors
    ///
    /// Returns an error for blank text or if sending fails.
    pub fn send(&self, text: &str, conversation: &dyn Conversation) -> Result<()> {
        conversation.send(self.draft(text)?)
    }
}
