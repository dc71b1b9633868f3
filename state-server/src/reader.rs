//! StateReader (SPEC_FULL.md §4.1): snapshots the physics and graphics
//! shared-memory blocks the simulator exports, each prefixed by a 4-byte
//! little-endian packet sequence id.
//!
//! Grounded on `AssettoCorsaData`/`PhysicsSharedMemory`/`GraphicsSharedMemory`
//! in the original `shared_memory.py`/`scraper.py`.

use crate::error::{Error, Result};
use harness_types::StateSnapshot;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

const HEADER_LEN: usize = 4;

struct ShmRegion {
    path: PathBuf,
    mmap: Mmap,
    payload_len: usize,
}

impl ShmRegion {
    fn open(path: &Path, payload_len: usize) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::SharedMemoryUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| Error::SharedMemoryUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        if mmap.len() < HEADER_LEN + payload_len {
            return Err(Error::RegionTooSmall {
                path: path.to_path_buf(),
                expected: HEADER_LEN + payload_len,
                got: mmap.len(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            payload_len,
        })
    }

    /// Reads the packet id and payload as they stand right now. A torn read
    /// across the simulator's own write is tolerated: the packet id is the
    /// freshness guard downstream consumers compare against, not this read.
    fn snapshot(&self) -> (u32, &[u8]) {
        let packet_id = u32::from_le_bytes(self.mmap[0..HEADER_LEN].try_into().unwrap());
        let payload = &self.mmap[HEADER_LEN..HEADER_LEN + self.payload_len];
        (packet_id, payload)
    }

    #[allow(dead_code)]
    fn path(&self) -> &Path {
        &self.path
    }
}

/// Reads both shared-memory blocks and builds a combined [`StateSnapshot`]
/// (graphics payload then physics payload, per SPEC_FULL.md §3).
pub struct StateReader {
    physics: ShmRegion,
    graphics: ShmRegion,
}

impl StateReader {
    pub fn open(
        physics_path: &Path,
        physics_payload_len: usize,
        graphics_path: &Path,
        graphics_payload_len: usize,
    ) -> Result<Self> {
        Ok(Self {
            physics: ShmRegion::open(physics_path, physics_payload_len)?,
            graphics: ShmRegion::open(graphics_path, graphics_payload_len)?,
        })
    }

    pub fn read_snapshot(&self) -> StateSnapshot {
        let (physics_packet_id, physics_payload) = self.physics.snapshot();
        let (graphics_packet_id, graphics_payload) = self.graphics.snapshot();
        let mut payload = Vec::with_capacity(graphics_payload.len() + physics_payload.len());
        payload.extend_from_slice(graphics_payload);
        payload.extend_from_slice(physics_payload);
        StateSnapshot::new(physics_packet_id, graphics_packet_id, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_region(path: &Path, packet_id: u32, payload: &[u8]) {
        let mut f = File::create(path).unwrap();
        f.write_all(&packet_id.to_le_bytes()).unwrap();
        f.write_all(payload).unwrap();
    }

    #[test]
    fn combines_graphics_then_physics_payload() {
        let dir = tempfile::tempdir().unwrap();
        let physics_path = dir.path().join("physics");
        let graphics_path = dir.path().join("graphics");
        write_region(&physics_path, 11, &[1, 2, 3, 4]);
        write_region(&graphics_path, 7, &[9, 9]);

        let reader = StateReader::open(&physics_path, 4, &graphics_path, 2).unwrap();
        let snap = reader.read_snapshot();
        assert_eq!(snap.physics_packet_id, 11);
        assert_eq!(snap.graphics_packet_id, 7);
        assert_eq!(&*snap.payload, &[9, 9, 1, 2, 3, 4]);
    }

    #[test]
    fn errors_when_region_is_too_small() {
        let dir = tempfile::tempdir().unwrap();
        let physics_path = dir.path().join("physics");
        let graphics_path = dir.path().join("graphics");
        write_region(&physics_path, 1, &[1, 2]);
        write_region(&graphics_path, 1, &[9, 9]);

        let err = StateReader::open(&physics_path, 100, &graphics_path, 2).unwrap_err();
        assert!(matches!(err, Error::RegionTooSmall { .. }));
    }
}
