//! Pixel sizes and aspect-preserving scaling.

use std::fmt;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the size with width and height swapped.
    #[must_use]
    pub const fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Returns `true` if this size fits inside `max` on both axes.
    #[must_use]
    pub const fn fits_inside(self, max: Self) -> bool {
        self.width <= max.width && self.height <= max.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Scales `input` down to fit inside `max`, preserving aspect ratio.
///
/// Sizes that already fit are returned unchanged; this never scales up.
/// Otherwise the axis with the larger overflow ratio is pinned to its maximum
/// and the other axis is scaled and rounded.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn scale_down_inside(input: Size, max: Size) -> Size {
    if input.fits_inside(max) {
        return input;
    }
    if max.width == 0 || max.height == 0 {
        return Size::default();
    }

    let width_ratio = f64::from(input.width) / f64::from(max.width);
    let height_ratio = f64::from(input.height) / f64::from(max.height);
    if width_ratio > height_ratio {
        let height =
            (f64::from(max.width) * f64::from(input.height) / f64::from(input.width)).round();
        Size::new(max.width, height as u32)
    } else {
        let width =
            (f64::from(max.height) * f64::from(input.width) / f64::from(input.height)).round();
        Size::new(width as u32, max.height)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fits_unchanged() {
        let size = Size::new(300, 200);
        assert_eq!(scale_down_inside(size, Size::new(480, 800)), size);
    }

    #[test]
    fn test_width_bound() {
        assert_eq!(
            scale_down_inside(Size::new(1200, 800), Size::new(480, 800)),
            Size::new(480, 320)
        );
    }

    #[test]
    fn test_height_bound() {
        assert_eq!(
            scale_down_inside(Size::new(1200, 800), Size::new(800, 480)),
            Size::new(720, 480)
        );
    }

    #[test]
    fn test_zero_max() {
        assert_eq!(
            scale_down_inside(Size::new(10, 10), Size::new(0, 5)),
            Size::default()
        );
    }

    #[test]
    fn test_transposed() {
        assert_eq!(Size::new(3, 4).transposed(), Size::new(4, 3));
        assert_eq!(Size::new(3, 4).to_string(), "3x4");
    }

    proptest! {
        #[test]
        fn scaled_size_fits_and_never_grows(
            width in 1u32..10_000,
            height in 1u32..10_000,
            max_width in 1u32..4_000,
            max_height in 1u32..4_000,
        ) {
            let input = Size::new(width, height);
            let max = Size::new(max_width, max_height);
            let scaled = scale_down_inside(input, max);
            prop_assert!(scaled.fits_inside(max));
            prop_assert!(scaled.width <= width);
            prop_assert!(scaled.height <= height);
            prop_assert!(scaled.width == max_width || scaled.height == max_height || scaled == input);
        }
    }
}
