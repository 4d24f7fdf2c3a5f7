//! Three-part image cells with progressive preview/full loading.
//!
//! Binding walks `NoImage -> PreviewLoading -> PreviewShown -> FullLoading ->
//! FullShown`. When the full part is already local the preview is skipped.
//! A failed preview ends the bind in [`ImageStage::Failed`]; a failed full
//! image leaves the preview on screen.

use std::sync::Arc;

use atlas_message::{ImageInfo, Message, Size, ThreePartImage, scale_down_inside};
use tracing::{error, warn};

use super::{
    BindTicket, CellAction, CellContent, CellFactory, CellHolder, CellHolderSpecs, CellTheme,
    DisplayedImage, ImageStage, ImageView, load_image, mismatched_content,
};
use crate::config::CellsConfig;
use crate::loader::{ImageLoader, ImageRequest, ImageSource, ScrollState};

const TAG: &str = "three-part-image";
const TAG_FULL: &str = "three-part-image.full";

/// Sizing of a three-part image cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreePartLayout {
    /// Size the image is decoded to, before rotation.
    pub cell: Size,
    /// Size of the view, after rotation.
    pub layout: Size,
    /// Rotation to apply, in degrees.
    pub rotation: f32,
}

/// Computes the cell size, view layout and rotation for `info`.
///
/// Quarter-turn orientations fit the stored image inside the transposed
/// bounds and swap the layout axes.
#[must_use]
pub fn three_part_layout(info: &ImageInfo, specs: &CellHolderSpecs) -> ThreePartLayout {
    let stored = Size::new(info.width, info.height);
    let rotation = info.orientation.display_rotation();
    if info.orientation.swaps_axes() {
        let cell = scale_down_inside(stored, specs.max_size().transposed());
        ThreePartLayout {
            cell,
            layout: cell.transposed(),
            rotation,
        }
    } else {
        let cell = scale_down_inside(stored, specs.max_size());
        ThreePartLayout {
            cell,
            layout: cell,
            rotation,
        }
    }
}

/// Renders full/preview/info image messages.
pub struct ThreePartImageCellFactory {
    loader: Arc<dyn ImageLoader>,
    corner_radius: f32,
}

impl ThreePartImageCellFactory {
    /// Creates the factory.
    #[must_use]
    pub fn new(loader: Arc<dyn ImageLoader>, config: &CellsConfig) -> Self {
        Self {
            loader,
            corner_radius: config.corner_radius,
        }
    }

    fn request(&self, source: ImageSource, tag: &str, sizing: &ThreePartLayout) -> ImageRequest {
        ImageRequest::new(source, tag)
            .center_crop()
            .resize(sizing.cell)
            .rotate(sizing.rotation)
            .rounded(self.corner_radius)
    }

    fn load_preview_then_full(
        &self,
        view: &ImageView,
        ticket: BindTicket,
        preview: ImageRequest,
        full: ImageRequest,
    ) {
        view.update(&ticket, |state| {
            state.stage = ImageStage::PreviewLoading;
            state.placeholder = true;
        });

        let view = view.clone();
        let loader = Arc::clone(&self.loader);
        let source = preview.source.clone();
        let rotation = preview.rotation;
        self.loader.load(
            preview,
            Box::new(move |result| match result {
                Ok(()) => {
                    let shown = view.update(&ticket, |state| {
                        state.stage = ImageStage::PreviewShown;
                        state.displayed = Some(DisplayedImage { source, rotation });
                        state.placeholder = false;
                    });
                    if shown {
                        load_image(loader.as_ref(), &view, ticket, full);
                    }
                }
                Err(err) => {
                    let current = view.update(&ticket, |state| state.stage = ImageStage::Failed);
                    if current {
                        error!(message_id = %ticket.message(), error = %err, "Preview load failed");
                    }
                }
            }),
        );
    }
}

impl CellFactory for ThreePartImageCellFactory {
    fn name(&self) -> &'static str {
        TAG
    }

    fn is_bindable(&self, message: &Message) -> bool {
        ThreePartImage::from_message(message).is_some()
    }

    fn create_holder(&self, is_me: bool, _theme: &CellTheme) -> CellHolder {
        CellHolder::image(is_me)
    }

    fn parse(&self, message: &Message) -> Option<CellContent> {
        let image = ThreePartImage::from_message(message)?;
        match image.info() {
            Ok(info) => Some(CellContent::ThreePartImage(info)),
            Err(error) => {
                warn!(message_id = %message.id, %error, "Malformed image info");
                None
            }
        }
    }

    fn bind(
        &self,
        holder: &mut CellHolder,
        content: &CellContent,
        message: &Message,
        specs: &CellHolderSpecs,
    ) {
        let (CellContent::ThreePartImage(info), Some(image), Some(view)) = (
            content,
            ThreePartImage::from_message(message),
            holder.image_view().cloned(),
        ) else {
            mismatched_content(self.name(), holder, message);
            return;
        };

        let sizing = three_part_layout(info, specs);
        let ticket = view.begin_bind(&message.id);
        view.update(&ticket, |state| state.layout = Some(sizing.layout));

        let full_id = image.full().id.clone();
        let preview_id = image.preview().id.clone();
        holder.set_action(CellAction::OpenImage {
            preview: Some(preview_id.clone()),
            full: full_id.clone(),
            info: Some(*info),
        });

        let full = self.request(ImageSource::Part(full_id), TAG_FULL, &sizing);
        if image.full().is_content_ready() {
            load_image(self.loader.as_ref(), &view, ticket, full.placeholder(true));
        } else {
            let preview = self
                .request(ImageSource::Part(preview_id), TAG, &sizing)
                .placeholder(true);
            self.load_preview_then_full(&view, ticket, preview, full);
        }
    }

    fn preview_text(&self, _message: &Message) -> String {
        "Attachment: Image".to_string()
    }

    fn on_scroll_state_changed(&self, state: ScrollState) {
        match state {
            ScrollState::Dragging => {
                self.loader.pause_tag(TAG_FULL);
                self.loader.pause_tag(TAG);
            }
            ScrollState::Idle => {
                self.loader.resume_tag(TAG_FULL);
                self.loader.resume_tag(TAG);
            }
            ScrollState::Settling => self.loader.resume_tag(TAG),
        }
    }
}
