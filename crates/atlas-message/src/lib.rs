//! # atlas-message
//!
//! Message model and wire payloads for Atlas chat cells.
//!
//! ## Features
//!
//! - **Message model**: messages, parts, `layer:` identifiers and content readiness
//! - **MIME types**: `type/subtype+suffix` parsing used to classify parts
//! - **Location payloads**: the `location/coordinate` JSON format
//! - **Three-part images**: full image, JPEG preview and `application/json+imageSize` info
//!
//! ## Quick Start
//!
//! ### Sending a location
//!
//! ```ignore
//! use atlas_message::{LocationPayload, MessageId};
//!
//! let draft = LocationPayload::new(52.52, 13.405).with_label("Alex").to_new_message()?;
//! let echoed = draft.into_message(MessageId::from_uuid("local-1"));
//! assert_eq!(LocationPayload::from_message(&echoed)?.lat, 52.52);
//! ```
//!
//! ### Composing a three-part image
//!
//! ```ignore
//! use atlas_message::{PreviewConfig, compose_three_part};
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! let draft = compose_three_part(&bytes, &PreviewConfig::default())?;
//! assert_eq!(draft.parts.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod geometry;
mod image_info;
mod location;
mod message;
mod mime_type;
mod three_part;

pub use error::{Error, Result};
pub use geometry::{Size, scale_down_inside};
pub use image_info::{ImageInfo, Orientation};
pub use location::LocationPayload;
pub use message::{Message, MessageId, MessagePart, NewMessage, NewPart, PartId};
pub use mime_type::{
    IMAGE_SIZE_INFO, LOCATION_COORDINATE, MimeType, PREVIEW_SUFFIX, TEXT_PLAIN,
};
pub use three_part::{
    PART_INDEX_FULL, PART_INDEX_INFO, PART_INDEX_PREVIEW, PREVIEW_MIME_TYPE, PreviewConfig,
    ThreePartImage, compose_three_part,
};
