//! The shared-memory observation arena (SPEC_FULL.md §3 Observation, §4.5).
//!
//! Sized once at startup from the image shape and the state payload length,
//! then mapped by both the producer (this process) and any number of
//! consumer processes that open the same backing file. Layout, from offset
//! zero: `[observation_is_stale: u8][image_is_stale: u8][padding][image
//! bytes][state bytes]`. The two flags are plain bytes read/written through
//! an atomic view of the mapping so producer and consumer processes
//! observe them without an OS-level lock, mirroring the original
//! `multiprocessing.Value`/shared-array handshake in
//! `__setup_shared_image_buffer`/`__setup_shared_state_buffer`.

use crate::error::{Error, Result};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

const FLAGS_LEN: usize = 8; // room for the two flags plus alignment padding.
const OBSERVATION_STALE_OFFSET: usize = 0;
const IMAGE_STALE_OFFSET: usize = 1;

/// A mapped observation arena. The same type serves both the producer
/// (CaptureAggregator's own tick loop) and consumers (Recorder, DatabaseWriter,
/// an agent) depending on which methods are called.
pub struct ObservationArena {
    mmap: MmapMut,
    image_len: usize,
    state_len: usize,
    path: PathBuf,
}

impl ObservationArena {
    /// Creates (or truncates) the backing file and maps it, sized to hold
    /// exactly one image buffer and one state buffer alongside the flags.
    pub fn create(path: impl AsRef<Path>, image_len: usize, state_len: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let total_len = FLAGS_LEN + image_len + state_len;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| Error::ArenaAlloc {
                path: path.clone(),
                source,
            })?;
        file.set_len(total_len as u64)
            .map_err(|source| Error::ArenaAlloc {
                path: path.clone(),
                source,
            })?;
        let mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|source| Error::ArenaMap {
            path: path.clone(),
            source,
        })?;

        let arena = Self {
            mmap,
            image_len,
            state_len,
            path,
        };
        arena.observation_flag().store(1, Ordering::Release);
        arena.image_flag().store(1, Ordering::Release);
        Ok(arena)
    }

    /// Opens an arena a producer has already created, for a consumer process.
    pub fn open(path: impl AsRef<Path>, image_len: usize, state_len: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| Error::ArenaAlloc {
                path: path.clone(),
                source,
            })?;
        let mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(|source| Error::ArenaMap {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            mmap,
            image_len,
            state_len,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flag(&self, offset: usize) -> &AtomicU8 {
        // SAFETY: the mapping is at least FLAGS_LEN bytes, AtomicU8 has the
        // same size and alignment as u8, and every handle to this arena
        // (producer or any number of consumers) only ever touches the flag
        // bytes through this atomic view.
        unsafe { &*(self.mmap.as_ptr().add(offset) as *const AtomicU8) }
    }

    fn observation_flag(&self) -> &AtomicU8 {
        self.flag(OBSERVATION_STALE_OFFSET)
    }

    fn image_flag(&self) -> &AtomicU8 {
        self.flag(IMAGE_STALE_OFFSET)
    }

    fn image_range(&self) -> std::ops::Range<usize> {
        FLAGS_LEN..FLAGS_LEN + self.image_len
    }

    fn state_range(&self) -> std::ops::Range<usize> {
        let start = FLAGS_LEN + self.image_len;
        start..start + self.state_len
    }

    pub fn observation_is_stale(&self) -> bool {
        self.observation_flag().load(Ordering::Acquire) != 0
    }

    pub fn image_is_stale(&self) -> bool {
        self.image_flag().load(Ordering::Acquire) != 0
    }

    /// Producer side: copies a freshly decoded frame into the image region
    /// and clears `image_is_stale`. Only called when FrameStream actually
    /// produced a new frame this tick.
    pub fn write_image(&mut self, data: &[u8]) {
        debug_assert_eq!(data.len(), self.image_len);
        let range = self.image_range();
        self.mmap[range].copy_from_slice(data);
        self.image_flag().store(0, Ordering::Release);
    }

    /// Producer side: copies the latest state payload, unconditionally.
    pub fn write_state(&mut self, data: &[u8]) {
        debug_assert_eq!(data.len(), self.state_len);
        let range = self.state_range();
        self.mmap[range].copy_from_slice(data);
    }

    /// Producer side: marks the observation as fresh after a tick's copy.
    pub fn publish(&self) {
        self.observation_flag().store(0, Ordering::Release);
    }

    /// Consumer side: copies both buffers out, then marks the observation
    /// stale and clears the local-to-the-caller `image_is_stale` reading.
    /// Returns `(image, state, image_is_stale)`.
    pub fn take(&self) -> (Vec<u8>, Vec<u8>, bool) {
        let image = self.mmap[self.image_range()].to_vec();
        let state = self.mmap[self.state_range()].to_vec();
        self.observation_flag().store(1, Ordering::Release);
        let image_is_stale = self.image_flag().swap(1, Ordering::AcqRel) != 0;
        (image, state, image_is_stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_then_consumer_round_trips_a_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observation.arena");
        let mut producer = ObservationArena::create(&path, 4, 2).unwrap();
        assert!(producer.observation_is_stale());

        producer.write_image(&[1, 2, 3, 4]);
        producer.write_state(&[9, 9]);
        producer.publish();
        assert!(!producer.observation_is_stale());
        assert!(!producer.image_is_stale());

        let (image, state, image_is_stale) = producer.take();
        assert_eq!(image, vec![1, 2, 3, 4]);
        assert_eq!(state, vec![9, 9]);
        assert!(!image_is_stale, "image was written this tick");
        assert!(producer.observation_is_stale());
        assert!(producer.image_is_stale());
    }

    #[test]
    fn state_only_tick_marks_carried_over_image_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observation.arena");
        let mut producer = ObservationArena::create(&path, 4, 2).unwrap();
        producer.write_image(&[1, 2, 3, 4]);
        producer.write_state(&[1, 1]);
        producer.publish();
        let _ = producer.take();

        // Next tick carries no new frame: only state changes.
        producer.write_state(&[2, 2]);
        producer.publish();
        let (image, state, image_is_stale) = producer.take();
        assert_eq!(image, vec![1, 2, 3, 4], "image carried over unchanged");
        assert_eq!(state, vec![2, 2]);
        assert!(image_is_stale, "no new frame arrived this tick");
    }

    #[test]
    fn consumer_opens_arena_a_producer_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observation.arena");
        let mut producer = ObservationArena::create(&path, 2, 2).unwrap();
        producer.write_image(&[7, 7]);
        producer.write_state(&[8, 8]);
        producer.publish();

        let consumer = ObservationArena::open(&path, 2, 2).unwrap();
        let (image, state, _) = consumer.take();
        assert_eq!(image, vec![7, 7]);
        assert_eq!(state, vec![8, 8]);
    }
}
