//! Fallback cells that list the MIME types of every part.

use atlas_message::Message;

use super::{CellContent, CellFactory, CellHolder, CellHolderSpecs, CellTheme, mismatched_content};

/// Accepts every message. Register it last.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeCellFactory;

impl MimeCellFactory {
    /// Creates the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CellFactory for MimeCellFactory {
    fn name(&self) -> &'static str {
        "mime"
    }

    fn is_bindable(&self, _message: &Message) -> bool {
        true
    }

    fn create_holder(&self, is_me: bool, theme: &CellTheme) -> CellHolder {
        CellHolder::text(is_me, theme.bubble(is_me))
    }

    fn parse(&self, message: &Message) -> Option<CellContent> {
        let listing = message
            .parts
            .iter()
            .enumerate()
            .map(|(index, part)| format!("MIME Type [{index}]: {}", part.mime_type))
            .collect::<Vec<_>>()
            .join("\n");
        Some(CellContent::Mime(listing))
    }

    fn bind(
        &self,
        holder: &mut CellHolder,
        content: &CellContent,
        message: &Message,
        _specs: &CellHolderSpecs,
    ) {
        match content {
            CellContent::Mime(listing) => holder.set_text(listing.as_str()),
            _ => mismatched_content(self.name(), holder, message),
        }
    }

    fn preview_text(&self, message: &Message) -> String {
        let parts = message
            .parts
            .iter()
            .map(|part| format!("{}-byte {}", part.size, part.mime_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{parts}]")
    }
}
