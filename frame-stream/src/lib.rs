//! FrameStream (SPEC_FULL.md §4.4): drives a screen-capture demuxer/decoder
//! against the simulator's window region and exposes the latest decoded
//! frame through a single-slot, freshness-gated store.
//!
//! The capture backend itself (which demuxer/decoder talks to the host
//! display server) is platform glue outside this repository's scope (§1);
//! [`FrameSource`] is the collaborator seam a concrete backend plugs into,
//! generalised from `ci2`'s `Camera`/`CameraModule` hardware-abstraction
//! trait shape to a screen-capture source. Frame pull/de-duplication is
//! grounded on `original_source`'s `ImageStream.__iter__`/`_get_image_from_frame`
//! (`pyav_capture.py`).

mod config;
mod convert;
mod error;
mod slot;

pub use config::{CodecOptions, FrameStreamConfig, WindowId};
pub use error::{Error, Result};
pub use slot::FrameSlot;

use harness_types::{ImageShape, PixelLayout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One frame pulled from the capture backend, still in its native layout.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Decoder-assigned timestamp; frames whose timestamp repeats the last
    /// observed one are duplicates and are dropped (§4.4).
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

/// A pluggable capture backend: anything that can be polled for the next
/// decoded frame. A concrete implementation wraps the host's screen-capture
/// demuxer; this crate ships none (§1 Non-goals), only the driving loop.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<DecodedFrame>;
}

/// Owns the background capture task and the single-slot freshness-gated
/// image store consumers (CaptureAggregator's producer loop) read from.
pub struct FrameStream {
    slot: Arc<FrameSlot>,
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl FrameStream {
    /// Spawns the background capture task, which runs until [`FrameStream::stop`]
    /// is called or the source returns a fatal error.
    pub fn spawn(mut source: impl FrameSource + 'static, config: FrameStreamConfig) -> Self {
        let slot = Arc::new(FrameSlot::new());
        let running = Arc::new(AtomicBool::new(true));

        let task_slot = slot.clone();
        let task_running = running.clone();
        let handle = std::thread::spawn(move || {
            info!(window = %config.window.0, "frame-stream capture task starting");
            let mut last_timestamp: Option<i64> = None;
            let mut frames_seen = 0u64;
            while task_running.load(Ordering::Relaxed) {
                let frame = match source.next_frame() {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!("frame-stream decode error, dropping this tick: {err}");
                        continue;
                    }
                };

                if last_timestamp == Some(frame.timestamp) {
                    continue;
                }
                last_timestamp = Some(frame.timestamp);
                frames_seen += 1;
                if frames_seen % 300 == 0 {
                    debug!(frames_seen, "frame-stream iteration rate checkpoint");
                }

                let shape = ImageShape {
                    width: frame.width,
                    height: frame.height,
                    layout: config.pixel_layout,
                };
                let converted = convert::convert_layout(
                    frame.layout,
                    config.pixel_layout,
                    frame.width,
                    frame.height,
                    &frame.data,
                );
                task_slot.publish(shape, converted);
            }
            info!("frame-stream capture task stopped");
        });

        Self {
            slot,
            running,
            handle: Some(handle),
        }
    }

    /// The shared store CaptureAggregator's producer loop reads from.
    pub fn slot(&self) -> Arc<FrameSlot> {
        self.slot.clone()
    }

    /// Stops the background task cleanly; subsequent `slot()` reads return
    /// the last published frame forever (no further updates).
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct ScriptedSource {
        frames: std::vec::IntoIter<DecodedFrame>,
        exhausted_signal: mpsc::Sender<()>,
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<DecodedFrame> {
            match self.frames.next() {
                Some(frame) => Ok(frame),
                None => {
                    let _ = self.exhausted_signal.send(());
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    Err(Error::SourceExhausted)
                }
            }
        }
    }

    fn frame(timestamp: i64, fill: u8) -> DecodedFrame {
        DecodedFrame {
            timestamp,
            width: 2,
            height: 2,
            layout: PixelLayout::Bgr,
            data: vec![fill; 2 * 2 * 3],
        }
    }

    #[test]
    fn drops_duplicate_timestamps_and_publishes_the_rest() {
        let (tx, rx) = mpsc::channel();
        let source = ScriptedSource {
            frames: vec![frame(1, 10), frame(1, 10), frame(2, 20)].into_iter(),
            exhausted_signal: tx,
        };
        let config = FrameStreamConfig {
            window: WindowId("sim".to_string()),
            width: 2,
            height: 2,
            framerate: 30,
            pixel_layout: PixelLayout::Bgr,
            codec: CodecOptions::default(),
        };

        let mut stream = FrameStream::spawn(source, config);
        rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap();

        let slot = stream.slot();
        assert!(slot.is_fresh());
        let (_, bytes) = slot.latest().unwrap();
        assert_eq!(bytes[0], 20, "should have skipped the duplicate and published frame 2");

        stream.stop();
    }

    #[test]
    fn consumer_clears_freshness_after_reading() {
        let (tx, rx) = mpsc::channel();
        let source = ScriptedSource {
            frames: vec![frame(1, 5)].into_iter(),
            exhausted_signal: tx,
        };
        let config = FrameStreamConfig {
            window: WindowId("sim".to_string()),
            width: 2,
            height: 2,
            framerate: 30,
            pixel_layout: PixelLayout::Bgr,
            codec: CodecOptions::default(),
        };
        let mut stream = FrameStream::spawn(source, config);
        rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap();

        let slot = stream.slot();
        assert!(slot.is_fresh());
        slot.mark_consumed();
        assert!(!slot.is_fresh());
        // Carried-over image is still readable even once marked consumed.
        assert!(slot.latest().is_some());

        stream.stop();
    }
}
