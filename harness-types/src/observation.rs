//! The observation shape handed to agents and recorders (SPEC_FULL.md §3, §6).

use serde::{Deserialize, Serialize};

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    Bgrx,
    Bgr,
    Rgb,
}

impl PixelLayout {
    pub fn channel_count(self) -> usize {
        match self {
            PixelLayout::Bgrx => 4,
            PixelLayout::Bgr | PixelLayout::Rgb => 3,
        }
    }
}

/// The dimensions and pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
}

impl ImageShape {
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.layout.channel_count()
    }
}

/// One merged observation: an image buffer and raw state bytes that share a
/// single freshness bit at the point they were copied out of the
/// capture-aggregator's shared-memory arena.
///
/// `image_is_stale` distinguishes "this tick carried a new decoded frame"
/// from "no new frame arrived, this is the same image bytes as last time"
/// (SPEC_FULL.md §3 FrameCache, §8 invariant 2).
#[derive(Debug, Clone)]
pub struct Observation {
    pub image: Vec<u8>,
    pub shape: ImageShape,
    pub state: Vec<u8>,
    pub image_is_stale: bool,
}

impl Observation {
    pub fn new(image: Vec<u8>, shape: ImageShape, state: Vec<u8>, image_is_stale: bool) -> Self {
        debug_assert_eq!(image.len(), shape.byte_len());
        Self {
            image,
            shape,
            state,
            image_is_stale,
        }
    }
}
