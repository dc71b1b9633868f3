//! RayCaster worker (SPEC_FULL.md §4.11, §4.13): reads one recorded sample,
//! derives its camera pose, casts one ray per pixel against the collision
//! mesh, and hands the result to the generation queue. Grounded on
//! `original_source/src/tools/data_generation/ray_caster.py`'s `RayCaster`
//! worker loop, reshaped onto channellib's close-on-drop teardown instead of
//! the original's explicit `is_done` flag (DESIGN.md).

use crate::camera::CameraPose;
use crate::collision_mesh::CollisionMesh;
use crate::error::{Error, Result};
use channellib::Sender;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use crossbeam_ok::CrossbeamOk;
use harness_types::{physics_graphics_schema, IntersectionPayload, StateDecoder};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const QUEUE_POLL_TIMEOUT: Duration = Duration::from_millis(200);

pub struct RayCasterConfig {
    pub recording_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fov_v_degrees: f64,
    pub want_depth: bool,
}

fn read_sample(recording_dir: &Path, record_id: u64) -> Result<Vec<u8>> {
    let path = recording_dir.join(format!("{record_id}.bin"));
    std::fs::read(&path).map_err(|source| Error::ReadSample { path, source })
}

/// Casts every pixel's ray for one sample and packages the result. Kept free
/// of I/O so it is directly unit-testable.
fn cast_sample(
    record_id: u64,
    raw_state: &[u8],
    mesh: &CollisionMesh,
    cfg: &RayCasterConfig,
) -> Result<IntersectionPayload> {
    let schema = physics_graphics_schema();
    let state = StateDecoder::decode(&schema, raw_state)?;
    let pose = CameraPose::from_state(&state, cfg.width, cfg.height, cfg.fov_v_degrees);
    let rays = pose.pixel_rays();

    if !cfg.want_depth {
        let triangles = rays
            .iter()
            .map(|ray| mesh.cast(ray).map(|hit| hit.triangle as i64).unwrap_or(-1))
            .collect();
        return Ok(IntersectionPayload::FirstHit {
            record_id: record_id.to_string(),
            triangles,
        });
    }

    let mut triangles = Vec::new();
    let mut locations = Vec::new();
    let mut pixel_map = Vec::new();
    let mut ray_origins = Vec::with_capacity(rays.len());
    let mut ray_dirs = Vec::with_capacity(rays.len());

    for (pixel, ray) in rays.iter().enumerate() {
        ray_origins.push([ray.origin.x, ray.origin.y, ray.origin.z]);
        ray_dirs.push([ray.dir.x, ray.dir.y, ray.dir.z]);
        if let Some(hit) = mesh.cast(ray) {
            triangles.push(hit.triangle as i64);
            locations.push([hit.location.x, hit.location.y, hit.location.z]);
            pixel_map.push(pixel as u32);
        }
    }

    Ok(IntersectionPayload::AllHits {
        record_id: record_id.to_string(),
        triangles,
        locations,
        pixel_map,
        ray_origins,
        ray_dirs,
    })
}

/// Runs one ray-casting worker to completion: pulls record ids off `work`
/// until it disconnects (the orchestrator drops its sender once every id has
/// been posted), casting each against `mesh` and forwarding the payload to
/// `out`. `completed` is incremented after every sample for progress
/// reporting.
pub fn run_worker(
    work: Receiver<u64>,
    out: Sender<IntersectionPayload>,
    mesh: Arc<CollisionMesh>,
    cfg: Arc<RayCasterConfig>,
    completed: Arc<AtomicU64>,
) {
    loop {
        let record_id = match work.recv_timeout(QUEUE_POLL_TIMEOUT) {
            Ok(id) => id,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        };

        match read_sample(&cfg.recording_dir, record_id)
            .and_then(|raw| cast_sample(record_id, &raw, &mesh, &cfg))
        {
            Ok(payload) => {
                out.send(payload).cb_ok();
            }
            Err(err) => {
                tracing::warn!(record_id, error = %err, "skipping sample: ray cast failed");
            }
        }
        completed.fetch_add(1, Ordering::Relaxed);
    }
}
