//! Image loading boundary.
//!
//! The pixel pipeline (fetch, decode, resize, rotate) lives outside this crate.
//! Factories describe what they want as an [`ImageRequest`] and hand it to an
//! [`ImageLoader`], which reports completion through a [`LoadCallback`] on the
//! caller's UI thread.

mod part_handler;

pub use part_handler::{LoadedFrom, LoadedPart, MessagePartRequestHandler, PartStore};

use std::fmt;

use atlas_message::{PartId, Size};

use crate::error::Result;

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// Remote URL, such as a static map.
    Url(String),
    /// Message part, resolved by [`MessagePartRequestHandler`].
    Part(PartId),
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Part(id) => f.write_str(id.as_str()),
        }
    }
}

/// How the decoded image fills its resize box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Scale to the box as-is.
    #[default]
    Fit,
    /// Fill the box, cropping the overflow.
    CenterCrop,
    /// Fit inside the box, never enlarging.
    CenterInsideDownOnly,
}

/// A single image load.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    /// Image source.
    pub source: ImageSource,
    /// Tag used for pause/resume.
    pub tag: String,
    /// Target size.
    pub resize: Option<Size>,
    /// Scaling mode for `resize`.
    pub scale: ScaleMode,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Show a placeholder until loaded.
    pub placeholder: bool,
    /// Rounded-corner radius.
    pub corner_radius: Option<f32>,
}

impl ImageRequest {
    /// Creates a request for `source` with no transforms.
    #[must_use]
    pub fn new(source: ImageSource, tag: impl Into<String>) -> Self {
        Self {
            source,
            tag: tag.into(),
            resize: None,
            scale: ScaleMode::Fit,
            rotation: 0.0,
            placeholder: false,
            corner_radius: None,
        }
    }

    /// Resizes to `size`.
    #[must_use]
    pub const fn resize(mut self, size: Size) -> Self {
        self.resize = Some(size);
        self
    }

    /// Fills the resize box, cropping the overflow.
    #[must_use]
    pub const fn center_crop(mut self) -> Self {
        self.scale = ScaleMode::CenterCrop;
        self
    }

    /// Fits inside the resize box without enlarging.
    #[must_use]
    pub const fn center_inside_down_only(mut self) -> Self {
        self.scale = ScaleMode::CenterInsideDownOnly;
        self
    }

    /// Rotates by `degrees`.
    #[must_use]
    pub const fn rotate(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Shows a placeholder while loading.
    #[must_use]
    pub const fn placeholder(mut self, placeholder: bool) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Rounds the corners.
    #[must_use]
    pub const fn rounded(mut self, radius: f32) -> Self {
        self.corner_radius = Some(radius);
        self
    }
}

/// Completion callback for [`ImageLoader::load`].
pub type LoadCallback = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// External image pipeline.
pub trait ImageLoader: Send + Sync {
    /// Starts loading `request`. `on_complete` runs on the UI thread.
    fn load(&self, request: ImageRequest, on_complete: LoadCallback);

    /// Suspends new loads carrying `tag`.
    fn pause_tag(&self, tag: &str);

    /// Resumes loads carrying `tag`.
    fn resume_tag(&self, tag: &str);
}

/// Scroll state of the list hosting the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    /// Not scrolling.
    Idle,
    /// Scrolled by a touch in progress.
    Dragging,
    /// Flinging towards a final position.
    Settling,
}

impl ScrollState {
    /// Pauses or resumes `tag` for this state.
    ///
    /// Dragging pauses; settling and idle resume.
    pub fn apply(self, loader: &dyn ImageLoader, tag: &str) {
        match self {
            Self::Dragging => loader.pause_tag(tag),
            Self::Idle | Self::Settling => loader.resume_tag(tag),
        }
    }
}
