//! Derives the arena's image shape and state payload length from the shared
//! `HarnessConfig` (SPEC_FULL.md §6 `capture.images`), so producer and
//! consumer processes size their mapping identically without hand-copying
//! numbers between configuration and call sites.

use harness_config::CaptureConfig;
use harness_types::{ImageShape, PixelLayout, StateSchema};

pub fn pixel_layout_from_image_format(image_format: &str) -> PixelLayout {
    match image_format.to_ascii_lowercase().as_str() {
        "bgr" => PixelLayout::Bgr,
        "rgb" => PixelLayout::Rgb,
        _ => PixelLayout::Bgrx,
    }
}

pub fn image_shape_from_config(capture: &CaptureConfig) -> ImageShape {
    ImageShape {
        width: capture.images.width,
        height: capture.images.height,
        layout: pixel_layout_from_image_format(&capture.images.image_format),
    }
}

pub fn arena_sizes(capture: &CaptureConfig, schema: &StateSchema) -> (usize, usize) {
    (image_shape_from_config(capture).byte_len(), schema.payload_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_image_format_defaults_to_bgrx() {
        assert_eq!(pixel_layout_from_image_format("whatever"), PixelLayout::Bgrx);
        assert_eq!(pixel_layout_from_image_format("RGB"), PixelLayout::Rgb);
    }
}
