//! Pixel layout conversion between a source frame's native layout and the
//! configured target layout (SPEC_FULL.md §4.4, §6). Grounded on
//! `original_source`'s `_get_image_from_frame` (slicing the padded 4th
//! channel off a 32-bit-aligned BGRX frame).

use harness_types::PixelLayout;

pub fn convert_layout(
    src: PixelLayout,
    dst: PixelLayout,
    width: u32,
    height: u32,
    data: &[u8],
) -> Vec<u8> {
    if src == dst {
        return data.to_vec();
    }

    let pixel_count = (width as usize) * (height as usize);
    let src_channels = src.channel_count();
    let mut out = Vec::with_capacity(pixel_count * dst.channel_count());

    for i in 0..pixel_count {
        let px = &data[i * src_channels..i * src_channels + src_channels];
        // Every layout here carries B,G,R in that channel order (plus an
        // ignored 4th byte for Bgrx); only Rgb reorders to R,G,B.
        let (b, g, r) = (px[0], px[1], px[2]);
        match dst {
            PixelLayout::Bgrx => out.extend_from_slice(&[b, g, r, 0]),
            PixelLayout::Bgr => out.extend_from_slice(&[b, g, r]),
            PixelLayout::Rgb => out.extend_from_slice(&[r, g, b]),
        }
    }

    out
}
