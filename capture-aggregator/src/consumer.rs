//! The blocking `capture()` consumer path (SPEC_FULL.md §4.5).

use crate::arena::ObservationArena;
use crate::postprocess::{StatePayload, StatePostProcessor};
use harness_types::ImageShape;
use std::time::{Duration, Instant};

/// One merged, post-processed observation handed back by [`CaptureAggregator::capture`].
#[derive(Debug, Clone)]
pub struct Capture {
    pub image: Vec<u8>,
    pub shape: ImageShape,
    pub state: StatePayload,
    pub image_is_stale: bool,
}

const POLL_INTERVAL: Duration = Duration::from_micros(200);

/// The consumer-facing handle onto a shared observation arena: an agent,
/// Recorder, or DatabaseWriter process opens one of these against the same
/// arena file CaptureAggregator's producer loop is writing to.
pub struct CaptureAggregator {
    arena: ObservationArena,
    shape: ImageShape,
    post_processor: StatePostProcessor,
    last_capture: Option<Instant>,
}

impl CaptureAggregator {
    pub fn new(arena: ObservationArena, shape: ImageShape, post_processor: StatePostProcessor) -> Self {
        Self {
            arena,
            shape,
            post_processor,
            last_capture: None,
        }
    }

    /// Blocks until the producer has published a fresh observation, then
    /// copies it out and runs the configured state post-processor.
    pub fn capture(&mut self) -> harness_types::Result<Capture> {
        while self.arena.observation_is_stale() {
            std::thread::sleep(POLL_INTERVAL);
        }

        let (image, state_bytes, image_is_stale) = self.arena.take();

        let now = Instant::now();
        let dt_seconds = self
            .last_capture
            .map(|prev| now.duration_since(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_capture = Some(now);

        let state = self.post_processor.apply(&state_bytes, dt_seconds)?;

        Ok(Capture {
            image,
            shape: self.shape,
            state,
            image_is_stale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_types::{physics_graphics_schema, PixelLayout};

    #[test]
    fn capture_blocks_until_a_tick_is_published() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observation.arena");
        let schema = physics_graphics_schema();
        let image_len = 4usize;
        let state_len = schema.payload_len();

        let mut producer = ObservationArena::create(&path, image_len, state_len).unwrap();
        let shape = ImageShape {
            width: 2,
            height: 1,
            layout: PixelLayout::Bgrx,
        };

        let consumer_arena = ObservationArena::open(&path, image_len, state_len).unwrap();
        let mut aggregator = CaptureAggregator::new(
            consumer_arena,
            shape,
            StatePostProcessor::identity(schema.clone()),
        );

        producer.write_image(&[1, 2, 3, 4]);
        producer.write_state(&vec![0u8; state_len]);
        producer.publish();

        let capture = aggregator.capture().unwrap();
        assert_eq!(capture.image, vec![1, 2, 3, 4]);
        assert!(!capture.image_is_stale);
        match capture.state {
            StatePayload::Raw(bytes) => assert_eq!(bytes.len(), state_len),
            _ => panic!("identity mode should not decode"),
        }
    }
}
