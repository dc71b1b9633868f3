//! FrameStream configuration (SPEC_FULL.md §4.4, §6 `capture.images`/`capture.ffmpeg`).

use harness_types::PixelLayout;
use std::collections::HashMap;

/// Identifies the simulator's window to the capture backend (a title, a
/// handle string, or whatever the concrete [`crate::FrameSource`] expects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowId(pub String);

/// Free-form codec options threaded through to the capture backend, mirroring
/// the original `ffmpeg.yaml` key/value options dict.
#[derive(Debug, Clone, Default)]
pub struct CodecOptions(pub HashMap<String, String>);

#[derive(Debug, Clone)]
pub struct FrameStreamConfig {
    pub window: WindowId,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub pixel_layout: PixelLayout,
    pub codec: CodecOptions,
}
