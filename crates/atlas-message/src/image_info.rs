//! `application/json+imageSize` payloads.
//!
//! Wire format: `{"orientation": 0|1|2|3, "width": <int>, "height": <int>}` where
//! `width`/`height` are the stored (unrotated) pixel dimensions of the full image.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Orientation of a stored image relative to how it should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Orientation {
    /// Displayed as stored (code 0).
    #[default]
    Normal,
    /// Upside down (code 1).
    Rotate180,
    /// Rotated a quarter turn, corrected by rotating +90° (code 2).
    Rotate270,
    /// Rotated a quarter turn, corrected by rotating -90° (code 3).
    Rotate90,
}

impl Orientation {
    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::Rotate180 => 1,
            Self::Rotate270 => 2,
            Self::Rotate90 => 3,
        }
    }

    /// Maps a wire code. Unknown codes take the quarter-turn (+90°) branch.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Normal,
            1 => Self::Rotate180,
            3 => Self::Rotate90,
            _ => Self::Rotate270,
        }
    }

    /// Maps an EXIF orientation tag value (1..=8). Mirrored variants collapse
    /// onto their rotation; unknown values are treated as normal.
    #[must_use]
    pub const fn from_exif(value: u32) -> Self {
        match value {
            3 | 4 => Self::Rotate180,
            5 | 6 => Self::Rotate270,
            7 | 8 => Self::Rotate90,
            _ => Self::Normal,
        }
    }

    /// Rotation in degrees to apply when displaying.
    #[must_use]
    pub const fn display_rotation(self) -> f32 {
        match self {
            Self::Normal => 0.0,
            Self::Rotate180 => 180.0,
            Self::Rotate270 => 90.0,
            Self::Rotate90 => -90.0,
        }
    }

    /// Returns `true` if displayed width and height are swapped.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

impl From<i64> for Orientation {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<Orientation> for i64 {
    fn from(orientation: Orientation) -> Self {
        orientation.code()
    }
}

/// Full-image dimensions and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Display orientation.
    pub orientation: Orientation,
    /// Stored width in pixels.
    pub width: u32,
    /// Stored height in pixels.
    pub height: u32,
}

impl ImageInfo {
    /// Creates image info.
    #[must_use]
    pub const fn new(orientation: Orientation, width: u32, height: u32) -> Self {
        Self {
            orientation,
            width,
            height,
        }
    }

    /// Parses the JSON payload. All three fields are required.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field is missing.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializes to the JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
