//! Cell holders, per-bind specs and bubble styling.
//!
//! A [`CellHolder`] is created once per recycled list slot and rebound to a
//! different message every time the slot scrolls back into view. Image views
//! are shared with asynchronous load callbacks, which must prove they still
//! belong to the current bind before touching the view.

use std::sync::Arc;

use atlas_message::{ImageInfo, MessageId, PartId, Size};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loader::ImageSource;

/// ARGB colors for one side of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleStyle {
    /// Bubble background color.
    pub background: u32,
    /// Text color.
    pub text: u32,
}

/// Bubble colors for own and received messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellTheme {
    /// Style of messages sent by the local user.
    pub me: BubbleStyle,
    /// Style of messages sent by anyone else.
    pub them: BubbleStyle,
}

impl Default for CellTheme {
    fn default() -> Self {
        Self {
            me: BubbleStyle {
                background: 0xFF_16_A8_F8,
                text: 0xFF_FF_FF_FF,
            },
            them: BubbleStyle {
                background: 0xFF_F0_F0_F0,
                text: 0xFF_00_00_00,
            },
        }
    }
}

impl CellTheme {
    /// Returns the style for own (`is_me`) or received messages.
    #[must_use]
    pub const fn bubble(&self, is_me: bool) -> BubbleStyle {
        if is_me { self.me } else { self.them }
    }
}

/// Per-bind layout constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHolderSpecs {
    /// The message was sent by the local user.
    pub is_me: bool,
    /// Adapter position of the cell.
    pub position: usize,
    /// Maximum content width in pixels.
    pub max_width: u32,
    /// Maximum content height in pixels.
    pub max_height: u32,
}

impl CellHolderSpecs {
    /// Creates specs.
    #[must_use]
    pub const fn new(is_me: bool, position: usize, max_width: u32, max_height: u32) -> Self {
        Self {
            is_me,
            position,
            max_width,
            max_height,
        }
    }

    /// Returns the maximum content size.
    #[must_use]
    pub const fn max_size(&self) -> Size {
        Size::new(self.max_width, self.max_height)
    }
}

/// What tapping a cell should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellAction {
    /// Open a map application at a `geo:` URI.
    OpenMap {
        /// `geo:0,0?q=...` URI.
        geo_uri: String,
    },
    /// Open a full-screen image viewer.
    OpenImage {
        /// Preview part, shown while the full image loads.
        preview: Option<PartId>,
        /// Full image part.
        full: PartId,
        /// Dimensions and orientation, when known.
        info: Option<ImageInfo>,
    },
}

/// Text content of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextView {
    /// Displayed text, `None` when showing the placeholder.
    pub text: Option<String>,
    /// Bubble colors.
    pub style: BubbleStyle,
}

/// Progress of an image bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageStage {
    /// Nothing requested yet.
    #[default]
    NoImage,
    /// Preview requested.
    PreviewLoading,
    /// Preview displayed.
    PreviewShown,
    /// Full image requested.
    FullLoading,
    /// Full image displayed.
    FullShown,
    /// Loading failed with nothing to show.
    Failed,
}

/// An image currently displayed by an [`ImageView`].
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedImage {
    /// Where the pixels came from.
    pub source: ImageSource,
    /// Rotation applied, in degrees.
    pub rotation: f32,
}

/// Observable state of an [`ImageView`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageViewState {
    /// Message this view is bound to.
    pub message: Option<MessageId>,
    /// Layout size, `None` to wrap content.
    pub layout: Option<Size>,
    /// Bind progress.
    pub stage: ImageStage,
    /// Currently displayed image.
    pub displayed: Option<DisplayedImage>,
    /// A placeholder is shown instead of an image.
    pub placeholder: bool,
    generation: u64,
}

/// Proof that a callback belongs to a particular bind.
///
/// Rebinding a view invalidates every ticket issued before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindTicket {
    message: MessageId,
    generation: u64,
}

impl BindTicket {
    /// Message the bind was for.
    #[must_use]
    pub const fn message(&self) -> &MessageId {
        &self.message
    }
}

/// Image target shared between a holder and pending load callbacks.
#[derive(Debug, Clone, Default)]
pub struct ImageView {
    state: Arc<Mutex<ImageViewState>>,
}

impl ImageView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new bind for `message`, resetting the view to [`ImageStage::NoImage`].
    pub fn begin_bind(&self, message: &MessageId) -> BindTicket {
        let mut state = self.state.lock();
        state.generation += 1;
        state.message = Some(message.clone());
        state.layout = None;
        state.stage = ImageStage::NoImage;
        state.displayed = None;
        state.placeholder = false;
        BindTicket {
            message: message.clone(),
            generation: state.generation,
        }
    }

    /// Returns `true` if `ticket` belongs to the current bind.
    #[must_use]
    pub fn is_current(&self, ticket: &BindTicket) -> bool {
        let state = self.state.lock();
        state.generation == ticket.generation && state.message.as_ref() == Some(&ticket.message)
    }

    /// Applies `update` if `ticket` is still current.
    ///
    /// Returns `false`, leaving the view untouched, for stale tickets.
    pub fn update<F>(&self, ticket: &BindTicket, update: F) -> bool
    where
        F: FnOnce(&mut ImageViewState),
    {
        let mut state = self.state.lock();
        let current =
            state.generation == ticket.generation && state.message.as_ref() == Some(&ticket.message);
        if current {
            update(&mut *state);
        } else {
            debug!(
                message_id = %ticket.message,
                bound = ?state.message,
                "Discarding stale image callback"
            );
        }
        current
    }

    /// Shows the placeholder and invalidates in-flight callbacks.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.message = None;
        state.layout = None;
        state.stage = ImageStage::NoImage;
        state.displayed = None;
        state.placeholder = true;
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ImageViewState {
        self.state.lock().clone()
    }
}

/// Rendering surface of a holder.
#[derive(Debug, Clone)]
pub enum CellView {
    /// A text bubble.
    Text(TextView),
    /// An image.
    Image(ImageView),
}

/// Reusable rendering context for one list slot.
#[derive(Debug, Clone)]
pub struct CellHolder {
    view_type: Option<ViewType>,
    is_me: bool,
    message: Option<MessageId>,
    view: CellView,
    action: Option<CellAction>,
}

/// Identifies which factory built a holder and for which side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewType {
    /// Index of the factory in its registry.
    pub factory: usize,
    /// Holder styled for own messages.
    pub is_me: bool,
}

impl CellHolder {
    /// Creates a holder with a text view.
    #[must_use]
    pub const fn text(is_me: bool, style: BubbleStyle) -> Self {
        Self::with_view(is_me, CellView::Text(TextView { text: None, style }))
    }

    /// Creates a holder with an image view.
    #[must_use]
    pub fn image(is_me: bool) -> Self {
        Self::with_view(is_me, CellView::Image(ImageView::new()))
    }

    const fn with_view(is_me: bool, view: CellView) -> Self {
        Self {
            view_type: None,
            is_me,
            message: None,
            view,
            action: None,
        }
    }

    /// Returns the view type assigned by the registry.
    #[must_use]
    pub const fn view_type(&self) -> Option<ViewType> {
        self.view_type
    }

    pub(crate) const fn set_view_type(&mut self, view_type: ViewType) {
        self.view_type = Some(view_type);
    }

    /// Returns `true` if styled for own messages.
    #[must_use]
    pub const fn is_me(&self) -> bool {
        self.is_me
    }

    /// Returns the currently bound message.
    #[must_use]
    pub const fn message(&self) -> Option<&MessageId> {
        self.message.as_ref()
    }

    /// Returns the rendering surface.
    #[must_use]
    pub const fn view(&self) -> &CellView {
        &self.view
    }

    /// Returns the text view, if this is a text holder.
    #[must_use]
    pub const fn text_view(&self) -> Option<&TextView> {
        match &self.view {
            CellView::Text(text) => Some(text),
            CellView::Image(_) => None,
        }
    }

    /// Returns the image view, if this is an image holder.
    #[must_use]
    pub const fn image_view(&self) -> Option<&ImageView> {
        match &self.view {
            CellView::Image(image) => Some(image),
            CellView::Text(_) => None,
        }
    }

    /// Returns the tap action recorded by the last bind.
    #[must_use]
    pub const fn action(&self) -> Option<&CellAction> {
        self.action.as_ref()
    }

    /// Records `message` as bound and clears the previous action.
    pub fn bind_message(&mut self, message: &MessageId) {
        self.message = Some(message.clone());
        self.action = None;
    }

    /// Sets the displayed text. No-op for image holders.
    pub fn set_text(&mut self, text: impl Into<String>) {
        if let CellView::Text(view) = &mut self.view {
            view.text = Some(text.into());
        }
    }

    /// Records the tap action.
    pub fn set_action(&mut self, action: CellAction) {
        self.action = Some(action);
    }

    /// Shows the placeholder for content that could not be parsed.
    pub fn show_placeholder(&mut self) {
        self.action = None;
        match &mut self.view {
            CellView::Text(view) => view.text = None,
            CellView::Image(view) => view.clear(),
        }
    }
}
