//! Per-sample ray-casting output handed from RayCaster workers to
//! DataGenerator workers (SPEC_FULL.md §3 IntersectionPayload, §4.11).

/// The intersection result for one recorded sample. Which variant a worker
/// produces is driven entirely by whether depth output was requested for
/// this run (SPEC_FULL.md §4.11): depth needs per-pixel ray geometry to
/// recover hit distance, first-hit mode does not.
#[derive(Debug, Clone)]
pub enum IntersectionPayload {
    /// Depth/normals not requested: one triangle index per pixel, row-major
    /// over the frame, `-1` for background.
    FirstHit {
        record_id: String,
        triangles: Vec<i64>,
    },
    /// Depth requested: only the `K` hit pixels are carried, alongside the
    /// `P` rays cast for every pixel (needed downstream to recover
    /// per-pixel origin/direction for depth and normal rasters).
    AllHits {
        record_id: String,
        /// Triangle index per hit, length `K`, `-1` for a ray with no hit.
        triangles: Vec<i64>,
        /// World-space hit location per hit, length `K`.
        locations: Vec<[f64; 3]>,
        /// Pixel index (row-major) each hit in `triangles`/`locations`
        /// belongs to, length `K`.
        pixel_map: Vec<u32>,
        /// Ray origin per pixel, length `P` (`P = width * height`).
        ray_origins: Vec<[f64; 3]>,
        /// Ray direction per pixel, length `P`.
        ray_dirs: Vec<[f64; 3]>,
    },
}

impl IntersectionPayload {
    pub fn record_id(&self) -> &str {
        match self {
            IntersectionPayload::FirstHit { record_id, .. } => record_id,
            IntersectionPayload::AllHits { record_id, .. } => record_id,
        }
    }
}
