//! Single-image cells for images without preview or size info.

use std::sync::Arc;

use atlas_message::{Message, MessagePart};

use super::{
    CellAction, CellContent, CellFactory, CellHolder, CellHolderSpecs, CellTheme, load_image,
    mismatched_content,
};
use crate::config::CellsConfig;
use crate::loader::{ImageLoader, ImageRequest, ImageSource, ScrollState};

const TAG: &str = "basic-image";

/// Renders messages carrying at least one `image/*` part.
///
/// No rotation is applied; the first image part is shown scaled down inside
/// the cell bounds.
pub struct BasicImageCellFactory {
    loader: Arc<dyn ImageLoader>,
    corner_radius: f32,
}

impl BasicImageCellFactory {
    /// Creates the factory.
    #[must_use]
    pub fn new(loader: Arc<dyn ImageLoader>, config: &CellsConfig) -> Self {
        Self {
            loader,
            corner_radius: config.corner_radius,
        }
    }
}

impl CellFactory for BasicImageCellFactory {
    fn name(&self) -> &'static str {
        TAG
    }

    fn is_bindable(&self, message: &Message) -> bool {
        message.parts.iter().any(MessagePart::is_image)
    }

    fn create_holder(&self, is_me: bool, _theme: &CellTheme) -> CellHolder {
        CellHolder::image(is_me)
    }

    fn parse(&self, message: &Message) -> Option<CellContent> {
        let index = message.parts.iter().position(MessagePart::is_image)?;
        let part_index = u32::try_from(index).ok()?;
        Some(CellContent::Image { part_index })
    }

    fn bind(
        &self,
        holder: &mut CellHolder,
        content: &CellContent,
        message: &Message,
        specs: &CellHolderSpecs,
    ) {
        let part = match content {
            CellContent::Image { part_index } => message.part(*part_index as usize),
            _ => None,
        };
        let (Some(part), Some(view)) = (part, holder.image_view().cloned()) else {
            mismatched_content(self.name(), holder, message);
            return;
        };

        let ticket = view.begin_bind(&message.id);
        holder.set_action(CellAction::OpenImage {
            preview: None,
            full: part.id.clone(),
            info: None,
        });

        let request = ImageRequest::new(ImageSource::Part(part.id.clone()), TAG)
            .placeholder(true)
            .center_inside_down_only()
            .resize(specs.max_size())
            .rounded(self.corner_radius);
        load_image(self.loader.as_ref(), &view, ticket, request);
    }

    fn preview_text(&self, _message: &Message) -> String {
        "Attachment: Image".to_string()
    }

    fn on_scroll_state_changed(&self, state: ScrollState) {
        state.apply(self.loader.as_ref(), TAG);
    }
}
