//! Plain text cells.

use atlas_message::{Message, TEXT_PLAIN};

use super::{CellContent, CellFactory, CellHolder, CellHolderSpecs, CellTheme, mismatched_content};

/// Renders messages whose first part is `text/plain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCellFactory;

impl TextCellFactory {
    /// Creates the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CellFactory for TextCellFactory {
    fn name(&self) -> &'static str {
        "text"
    }

    fn is_bindable(&self, message: &Message) -> bool {
        message.first_part_is(TEXT_PLAIN)
    }

    fn create_holder(&self, is_me: bool, theme: &CellTheme) -> CellHolder {
        CellHolder::text(is_me, theme.bubble(is_me))
    }

    fn parse(&self, message: &Message) -> Option<CellContent> {
        message
            .part(0)
            .and_then(|part| part.text().ok())
            .map(CellContent::Text)
    }

    fn bind(
        &self,
        holder: &mut CellHolder,
        content: &CellContent,
        message: &Message,
        _specs: &CellHolderSpecs,
    ) {
        match content {
            CellContent::Text(text) => holder.set_text(text.as_str()),
            _ => mismatched_content(self.name(), holder, message),
        }
    }

    fn preview_text(&self, message: &Message) -> String {
        message
            .part(0)
            .and_then(|part| part.text().ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atlas_message::{MessageId, MessagePart};

    fn text_message(text: &str) -> Message {
        let id = MessageId::from_uuid("text");
        Message::new(
            id.clone(),
            vec![MessagePart::ready(id.part(0), TEXT_PLAIN, text.to_string())],
        )
    }

    #[test]
    fn test_bindable() {
        let factory = TextCellFactory::new();
        assert!(factory.is_bindable(&text_message("hi")));

        let id = MessageId::from_uuid("img");
        let image = Message::new(id.clone(), vec![MessagePart::ready(id.part(0), "image/png", "")]);
        assert!(!factory.is_bindable(&image));
        assert!(!factory.is_bindable(&Message::new(id, Vec::new())));
    }

    #[test]
    fn test_parse_and_bind() {
        let factory = TextCellFactory::new();
        let message = text_message("hello there");
        let content = factory.parse(&message).unwrap();
        assert_eq!(content, CellContent::Text("hello there".into()));

        let theme = CellTheme::default();
        let mut holder = factory.create_holder(true, &theme);
        factory.bind(&mut holder, &content, &message, &CellHolderSpecs::new(true, 0, 480, 800));

        let view = holder.text_view().unwrap();
        assert_eq!(view.text.as_deref(), Some("hello there"));
        assert_eq!(view.style, theme.me);
    }

    #[test]
    fn test_pending_text_not_parsed() {
        let id = MessageId::from_uuid("pending");
        let message = Message::new(id.clone(), vec![MessagePart::pending(id.part(0), TEXT_PLAIN, 10)]);
        assert!(TextCellFactory::new().parse(&message).is_none());
        assert_eq!(TextCellFactory::new().preview_text(&message), "");
    }

    #[test]
    fn test_preview_text() {
        assert_eq!(TextCellFactory::new().preview_text(&text_message("yo")), "yo");
    }
}
