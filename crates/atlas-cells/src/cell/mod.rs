//! Cell factories.
//!
//! A [`CellFactory`] claims a family of messages, parses them into a
//! [`CellContent`] value and binds that value into a [`CellHolder`]. Caching is
//! not the factory's concern: [`CachedCellFactory`] composes any factory with
//! a [`SizedLruCache`] keyed by message identifier.
//!
//! # Example
//!
//! ```ignore
//! use atlas_cells::cell::{CachedCellFactory, CellHolderSpecs, TextCellFactory};
//!
//! let text = CachedCellFactory::new(TextCellFactory::new(), 2 * 1024 * 1024);
//! if text.is_bindable(&message) {
//!     let mut holder = text.create_holder(false, &theme);
//!     text.bind(&mut holder, &message, &CellHolderSpecs::new(false, 0, 480, 800));
//! }
//! ```

mod basic_image;
mod holder;
mod location;
mod mime;
mod text;
mod three_part_image;

pub use basic_image::BasicImageCellFactory;
pub use holder::{
    BindTicket, BubbleStyle, CellAction, CellHolder, CellHolderSpecs, CellTheme, CellView,
    DisplayedImage, ImageStage, ImageView, ImageViewState, TextView, ViewType,
};
pub use location::{LocationCellFactory, geo_uri, static_map_url};
pub use mime::MimeCellFactory;
pub use text::TextCellFactory;
pub use three_part_image::{ThreePartImageCellFactory, ThreePartLayout, three_part_layout};

use std::sync::Arc;

use atlas_message::{ImageInfo, LocationPayload, Message, MessageId};
use tracing::{debug, trace, warn};

use crate::cache::{Cacheable, SizedLruCache};
use crate::loader::{ImageLoader, ImageRequest, ScrollState};

/// Parsed, immutable content of one message.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// Text of a `text/plain` message.
    Text(String),
    /// A shared location.
    Location(LocationPayload),
    /// Index of the image part of a single-image message.
    Image {
        /// Part index.
        part_index: u32,
    },
    /// Metadata of a three-part image.
    ThreePartImage(ImageInfo),
    /// Listing of the part MIME types.
    Mime(String),
}

impl Cacheable for CellContent {
    fn size_of(&self) -> usize {
        match self {
            Self::Text(text) | Self::Mime(text) => text.len(),
            Self::Location(location) => {
                location.label.as_ref().map_or(0, String::len) + 2 * size_of::<f64>()
            }
            Self::Image { .. } => size_of::<u32>(),
            Self::ThreePartImage(_) => 3 * size_of::<u32>(),
        }
    }
}

/// A pluggable renderer for a family of message content types.
///
/// Implementations must be cheap to query: [`is_bindable`](Self::is_bindable)
/// runs for every message against every factory until one matches.
pub trait CellFactory: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if this factory can render `message`. Must be pure.
    fn is_bindable(&self, message: &Message) -> bool;

    /// Builds a holder for one list slot.
    ///
    /// Called once per recycled slot, so it must not depend on any message.
    fn create_holder(&self, is_me: bool, theme: &CellTheme) -> CellHolder;

    /// Parses `message`, returning `None` for malformed content.
    ///
    /// May run on any thread, concurrently for different messages.
    fn parse(&self, message: &Message) -> Option<CellContent>;

    /// Binds parsed `content` for `message` into `holder`.
    fn bind(
        &self,
        holder: &mut CellHolder,
        content: &CellContent,
        message: &Message,
        specs: &CellHolderSpecs,
    );

    /// One-line summary for conversation lists.
    fn preview_text(&self, message: &Message) -> String;

    /// Pauses or resumes background image work.
    fn on_scroll_state_changed(&self, _state: ScrollState) {}
}

/// A [`CellFactory`] composed with its content cache.
pub struct CachedCellFactory {
    factory: Box<dyn CellFactory>,
    cache: SizedLruCache<MessageId, CellContent>,
}

impl CachedCellFactory {
    /// Wraps `factory` with a cache of `cache_budget` bytes.
    #[must_use]
    pub fn new(factory: impl CellFactory + 'static, cache_budget: usize) -> Self {
        Self {
            factory: Box::new(factory),
            cache: SizedLruCache::new(cache_budget),
        }
    }

    /// Returns the wrapped factory.
    #[must_use]
    pub fn factory(&self) -> &dyn CellFactory {
        self.factory.as_ref()
    }

    /// Returns the content cache.
    #[must_use]
    pub const fn cache(&self) -> &SizedLruCache<MessageId, CellContent> {
        &self.cache
    }

    /// Returns the factory name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.factory.name()
    }

    /// See [`CellFactory::is_bindable`].
    #[must_use]
    pub fn is_bindable(&self, message: &Message) -> bool {
        self.factory.is_bindable(message)
    }

    /// See [`CellFactory::create_holder`].
    #[must_use]
    pub fn create_holder(&self, is_me: bool, theme: &CellTheme) -> CellHolder {
        self.factory.create_holder(is_me, theme)
    }

    /// Returns the cached content for `message`, parsing it on a miss.
    ///
    /// Malformed or not yet downloaded content yields `None` and is not cached.
    pub fn get_or_compute(&self, message: &Message) -> Option<Arc<CellContent>> {
        self.cache.get_or_insert_with(&message.id, || {
            trace!(factory = self.name(), message_id = %message.id, "Parsing cell content");
            let content = self.factory.parse(message);
            if content.is_none() {
                debug!(factory = self.name(), message_id = %message.id, "No cell content yet");
            }
            content
        })
    }

    /// Binds `message` into `holder`, showing the placeholder if it cannot be parsed.
    pub fn bind(&self, holder: &mut CellHolder, message: &Message, specs: &CellHolderSpecs) {
        holder.bind_message(&message.id);
        match self.get_or_compute(message) {
            Some(content) => self.factory.bind(holder, &content, message, specs),
            None => holder.show_placeholder(),
        }
    }

    /// See [`CellFactory::preview_text`].
    #[must_use]
    pub fn preview_text(&self, message: &Message) -> String {
        self.factory.preview_text(message)
    }

    /// See [`CellFactory::on_scroll_state_changed`].
    pub fn on_scroll_state_changed(&self, state: ScrollState) {
        self.factory.on_scroll_state_changed(state);
    }
}

impl std::fmt::Debug for CachedCellFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCellFactory")
            .field("name", &self.name())
            .field("cache", &self.cache)
            .finish()
    }
}

/// Starts a single-stage load of `request` into `view` for the bind of `ticket`.
///
/// On failure the view keeps any image it already shows.
pub(crate) fn load_image(
    loader: &dyn ImageLoader,
    view: &ImageView,
    ticket: BindTicket,
    request: ImageRequest,
) {
    let source = request.source.clone();
    let rotation = request.rotation;
    let placeholder = request.placeholder;
    view.update(&ticket, |state| {
        state.stage = ImageStage::FullLoading;
        state.placeholder = placeholder && state.displayed.is_none();
    });

    let view = view.clone();
    loader.load(
        request,
        Box::new(move |result| {
            view.update(&ticket, |state| match result {
                Ok(()) => {
                    state.stage = ImageStage::FullShown;
                    state.displayed = Some(DisplayedImage { source, rotation });
                    state.placeholder = false;
                }
                Err(error) => {
                    warn!(message_id = %ticket.message(), %source, %error, "Image load failed");
                    state.stage = if state.displayed.is_some() {
                        ImageStage::PreviewShown
                    } else {
                        ImageStage::Failed
                    };
                }
            });
        }),
    );
}

/// Logs a content variant that does not belong to `factory` and shows the placeholder.
pub(crate) fn mismatched_content(factory: &str, holder: &mut CellHolder, message: &Message) {
    warn!(factory, message_id = %message.id, "Unexpected content variant");
    holder.show_placeholder();
}
