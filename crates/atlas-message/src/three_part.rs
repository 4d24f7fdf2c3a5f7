//! Three-part image messages.
//!
//! An image is sent as three ordered parts so receivers can show a small
//! preview before the full image has been downloaded:
//!
//! | Index | MIME type | Content |
//! |---|---|---|
//! | 0 | `image/<format>` | full image, untouched |
//! | 1 | `image/<format>+preview` | downscaled JPEG preview |
//! | 2 | `application/json+imageSize` | [`ImageInfo`] JSON |

use std::io::Cursor;

use exif::{In, Tag};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{Size, scale_down_inside};
use crate::image_info::{ImageInfo, Orientation};
use crate::message::{Message, MessagePart, NewMessage, NewPart};
use crate::mime_type::{IMAGE_SIZE_INFO, PREVIEW_SUFFIX};

/// Index of the full image part.
pub const PART_INDEX_FULL: usize = 0;
/// Index of the preview image part.
pub const PART_INDEX_PREVIEW: usize = 1;
/// Index of the info part.
pub const PART_INDEX_INFO: usize = 2;

/// MIME type written for generated previews.
pub const PREVIEW_MIME_TYPE: &str = "image/jpeg+preview";

/// Preview generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Maximum preview width.
    pub max_width: u32,
    /// Maximum preview height.
    pub max_height: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_width: 512,
            max_height: 512,
            quality: 50,
        }
    }
}

/// Borrowed view over a message with the three-part image layout.
#[derive(Debug, Clone, Copy)]
pub struct ThreePartImage<'a> {
    message: &'a Message,
}

impl<'a> ThreePartImage<'a> {
    /// Returns a view if `message` has the three-part layout.
    ///
    /// Accepts both `image/<format>+preview` and the older fixed
    /// `image/jpeg+preview` previews.
    #[must_use]
    pub fn from_message(message: &'a Message) -> Option<Self> {
        let [full, preview, info] = message.parts.as_slice() else {
            return None;
        };
        let preview_ok = preview
            .mime()
            .is_ok_and(|mime| mime.is_image() && mime.has_suffix(PREVIEW_SUFFIX));
        (full.is_image() && preview_ok && info.mime_type == IMAGE_SIZE_INFO)
            .then_some(Self { message })
    }

    /// Returns the underlying message.
    #[must_use]
    pub const fn message(&self) -> &'a Message {
        self.message
    }

    /// Returns the full image part.
    #[must_use]
    pub fn full(&self) -> &'a MessagePart {
        &self.message.parts[PART_INDEX_FULL]
    }

    /// Returns the preview image part.
    #[must_use]
    pub fn preview(&self) -> &'a MessagePart {
        &self.message.parts[PART_INDEX_PREVIEW]
    }

    /// Returns the info part.
    #[must_use]
    pub fn info_part(&self) -> &'a MessagePart {
        &self.message.parts[PART_INDEX_INFO]
    }

    /// Parses the info part.
    ///
    /// # Errors
    ///
    /// Returns an error if the info part is not ready or malformed.
    pub fn info(&self) -> Result<ImageInfo> {
        ImageInfo::from_json(self.info_part().bytes()?)
    }
}

/// Reads the EXIF orientation, defaulting to [`Orientation::Normal`].
fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map_or(Orientation::Normal, Orientation::from_exif),
        Err(error) => {
            debug!(%error, "No EXIF orientation");
            Orientation::Normal
        }
    }
}

fn encode_preview(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buf);
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
        encoder.encode_image(&rgb)?;
    }
    Ok(buf)
}

/// Composes a three-part image message from encoded image bytes.
///
/// The full image is attached untouched. The preview is scaled down inside
/// the configured bounds (never up) and re-encoded as JPEG.
///
/// # Errors
///
/// Returns an error if the input is empty or cannot be decoded.
pub fn compose_three_part(bytes: &[u8], config: &PreviewConfig) -> Result<NewMessage> {
    if bytes.is_empty() {
        return Err(Error::EmptyImage);
    }

    let format = image::guess_format(bytes)?;
    let orientation = read_orientation(bytes);
    let image = image::load_from_memory_with_format(bytes, format)?;
    let (width, height) = image.dimensions();

    let scaled = scale_down_inside(
        Size::new(width, height),
        Size::new(config.max_width, config.max_height),
    );
    // Extreme aspect ratios can round the short side to zero.
    let preview_size = Size::new(scaled.width.max(1), scaled.height.max(1));
    let preview_image = if preview_size == Size::new(width, height) {
        image
    } else {
        image.resize_exact(preview_size.width, preview_size.height, FilterType::Triangle)
    };
    let preview = encode_preview(&preview_image, config.quality)?;
    let info = ImageInfo::new(orientation, width, height).to_json()?;

    debug!(
        full_bytes = bytes.len(),
        preview_bytes = preview.len(),
        info_bytes = info.len(),
        %preview_size,
        "Composed three-part image"
    );

    Ok(NewMessage::new(vec![
        NewPart::new(format.to_mime_type(), bytes.to_vec()),
        NewPart::new(PREVIEW_MIME_TYPE, preview),
        NewPart::new(IMAGE_SIZE_INFO, info),
    ]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::MessageId;
    use image::{ImageBuffer, ImageFormat, Rgb};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb([200u8, 40, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_compose_layout() {
        let message = compose_three_part(&png(1024, 256), &PreviewConfig::default())
            .unwrap()
            .into_message(MessageId::from_uuid("img"));

        let view = ThreePartImage::from_message(&message).unwrap();
        assert_eq!(view.full().mime_type, "image/png");
        assert_eq!(view.preview().mime_type, PREVIEW_MIME_TYPE);
        assert_eq!(
            view.info().unwrap(),
            ImageInfo::new(Orientation::Normal, 1024, 256)
        );

        let preview = image::load_from_memory(view.preview().bytes().unwrap()).unwrap();
        assert_eq!(preview.dimensions(), (512, 128));
    }

    #[test]
    fn test_compose_small_image_not_upscaled() {
        let message = compose_three_part(&png(40, 30), &PreviewConfig::default())
            .unwrap()
            .into_message(MessageId::from_uuid("small"));
        let view = ThreePartImage::from_message(&message).unwrap();
        let preview = image::load_from_memory(view.preview().bytes().unwrap()).unwrap();
        assert_eq!(preview.dimensions(), (40, 30));
    }

    #[test]
    fn test_compose_thin_images_keep_one_pixel() {
        for (width, height, expected) in [(2000, 1, (512, 1)), (1, 2000, (1, 512))] {
            let message = compose_three_part(&png(width, height), &PreviewConfig::default())
                .unwrap()
                .into_message(MessageId::from_uuid("thin"));
            let view = ThreePartImage::from_message(&message).unwrap();
            let preview = image::load_from_memory(view.preview().bytes().unwrap()).unwrap();
            assert_eq!(preview.dimensions(), expected);
            assert_eq!(
                view.info().unwrap(),
                ImageInfo::new(Orientation::Normal, width, height)
            );
        }
    }

    #[test]
    fn test_compose_rejects_empty_and_garbage() {
        assert!(matches!(
            compose_three_part(&[], &PreviewConfig::default()),
            Err(Error::EmptyImage)
        ));
        assert!(compose_three_part(b"definitely not an image", &PreviewConfig::default()).is_err());
    }

    #[test]
    fn test_layout_detection() {
        let id = MessageId::from_uuid("x");
        let parts = |preview: &str, info: &str| {
            Message::new(
                id.clone(),
                vec![
                    MessagePart::ready(id.part(0), "image/png", ""),
                    MessagePart::ready(id.part(1), preview, ""),
                    MessagePart::ready(id.part(2), info, ""),
                ],
            )
        };

        assert!(ThreePartImage::from_message(&parts("image/png+preview", IMAGE_SIZE_INFO)).is_some());
        assert!(ThreePartImage::from_message(&parts("image/jpeg+preview", IMAGE_SIZE_INFO)).is_some());
        assert!(ThreePartImage::from_message(&parts("image/png", IMAGE_SIZE_INFO)).is_none());
        assert!(ThreePartImage::from_message(&parts("image/png+preview", "application/json")).is_none());

        let two_parts = Message::new(id.clone(), vec![MessagePart::ready(id.part(0), "image/png", "")]);
        assert!(ThreePartImage::from_message(&two_parts).is_none());
    }
}
