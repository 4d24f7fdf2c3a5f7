//! Outgoing message senders.
//!
//! Senders build drafts in the wire formats the cell factories read back and
//! hand them to a [`Conversation`]. The sender's display name is used for
//! push notification text.

mod image;
mod location;
mod text;

pub use image::ImageSender;
pub use location::{Coordinates, LocationProvider, LocationSender};
pub use text::TextSender;

use atlas_message::NewMessage;

use crate::error::Result;

/// Destination of outgoing messages.
pub trait Conversation: Send + Sync {
    /// Sends `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the messaging backend rejects the message.
    fn send(&self, message: NewMessage) -> Result<()>;
}
