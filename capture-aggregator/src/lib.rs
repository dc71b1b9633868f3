//! CaptureAggregator (SPEC_FULL.md §4.5): merges FrameStream and StateClient
//! output into a shared observation arena, owning the freshness handshake
//! between one producer tick loop and any number of consumer processes.
//! Grounded almost line-for-line on `GameCapture` in
//! `original_source/src/aci/game_capture/inference.py`.

mod arena;
mod consumer;
mod error;
mod postprocess;
mod producer;
mod sizing;

pub use arena::ObservationArena;
pub use consumer::{Capture, CaptureAggregator};
pub use error::{Error, Result};
pub use postprocess::{StatePayload, StatePostProcessor};
pub use producer::run as run_producer_loop;
pub use sizing::{arena_sizes, image_shape_from_config, pixel_layout_from_image_format};
