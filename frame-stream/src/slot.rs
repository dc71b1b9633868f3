//! The single-slot, freshness-gated image store FrameStream publishes into
//! and CaptureAggregator's producer loop reads from (SPEC_FULL.md §4.4, §5).

use harness_types::ImageShape;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

pub struct FrameSlot {
    image: RwLock<Option<(ImageShape, Vec<u8>)>>,
    fresh: AtomicBool,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            image: RwLock::new(None),
            fresh: AtomicBool::new(false),
        }
    }

    pub(crate) fn publish(&self, shape: ImageShape, data: Vec<u8>) {
        *self.image.write().unwrap() = Some((shape, data));
        self.fresh.store(true, Ordering::Release);
    }

    /// The most recently published frame, whether or not it has already been
    /// consumed. `None` only before the first frame arrives.
    pub fn latest(&self) -> Option<(ImageShape, Vec<u8>)> {
        self.image.read().unwrap().clone()
    }

    /// True if `latest()` would return a frame that has not yet been marked
    /// consumed.
    pub fn is_fresh(&self) -> bool {
        self.fresh.load(Ordering::Acquire)
    }

    /// Marks the current image as consumed. The image remains readable via
    /// [`FrameSlot::latest`] (FrameCache semantics, §3) until a new one
    /// arrives.
    pub fn mark_consumed(&self) {
        self.fresh.store(false, Ordering::Release);
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}
