//! DataGenerator worker (SPEC_FULL.md §4.11, §4.13): turns one sample's
//! [`IntersectionPayload`] into the requested ground-truth rasters and
//! copies the source frame alongside them. Grounded on
//! `original_source/src/tools/data_generation/data_generator.py`'s
//! `DataGenerator` worker and `utils.py`'s
//! `get_semantic_training_data`/`get_visualised_semantics`/`calculate_depth`/
//! `noramlise_values`/`convert_to_uint8`.

use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use harness_types::{IntersectionPayload, TrackDataDescriptor, TrackMeshData};
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const QUEUE_POLL_TIMEOUT: Duration = Duration::from_millis(200);

pub struct DataGeneratorConfig {
    pub recording_dir: PathBuf,
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub want_depth: bool,
    pub want_normals: bool,
    pub want_segmentation_visuals: bool,
    pub want_segmentation_data: bool,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| Error::CreateOutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn save_gray(path: &Path, width: u32, height: u32, buf: Vec<u8>) -> Result<()> {
    let image = GrayImage::from_raw(width, height, buf)
        .expect("buffer length matches width*height by construction");
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| Error::SaveRaster {
            path: path.to_path_buf(),
            source,
        })
}

fn save_rgb(path: &Path, width: u32, height: u32, buf: Vec<u8>) -> Result<()> {
    let image = RgbImage::from_raw(width, height, buf)
        .expect("buffer length matches width*height*3 by construction");
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| Error::SaveRaster {
            path: path.to_path_buf(),
            source,
        })
}

/// Normalises `values` into `[0, 1]` by min-max, inverts (so the nearest
/// point becomes brightest, matching `reverse_sign_of_values` following
/// `noramlise_values`), then scales to `u8`. A flat field normalises to 0.
fn normalize_invert_to_u8(values: &[f64]) -> Vec<u8> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|&v| {
            let normalised = if range > 1e-12 { (v - min) / range } else { 0.0 };
            let inverted = 1.0 - normalised;
            (inverted * 255.0).round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

fn semantic_raster(
    triangles: &[i64],
    track: &TrackMeshData,
    descriptor: &TrackDataDescriptor,
) -> (Vec<u8>, Vec<u8>) {
    let mut data = Vec::with_capacity(triangles.len());
    let mut visuals = Vec::with_capacity(triangles.len() * 3);
    for &triangle in triangles {
        let semantic_id = track.semantic_id_of_triangle(descriptor, triangle);
        data.push(if semantic_id < 0 { 255 } else { semantic_id as u8 });
        let [r, g, b] = descriptor.colour_for_semantic_id(semantic_id);
        visuals.extend_from_slice(&[r, g, b]);
    }
    (data, visuals)
}

fn copy_frame(recording_dir: &Path, output_dir: &Path, record_id: &str) -> Result<()> {
    let src = recording_dir.join(format!("{record_id}.jpeg"));
    let dst = output_dir.join(format!("{record_id}.jpeg"));
    std::fs::copy(&src, &dst).map_err(|source| Error::CopyFrame { path: src, source })?;
    Ok(())
}

/// Builds a full `width*height` canvas defaulting to `-1` (background),
/// scattering `triangles[i]` at `pixel_map[i]` for the sparse hit set
/// [`IntersectionPayload::AllHits`] carries.
fn scatter_triangles(width: u32, height: u32, triangles: &[i64], pixel_map: &[u32]) -> Vec<i64> {
    let mut canvas = vec![-1i64; (width * height) as usize];
    for (&triangle, &pixel) in triangles.iter().zip(pixel_map) {
        canvas[pixel as usize] = triangle;
    }
    canvas
}

fn process_first_hit(
    record_id: &str,
    triangles: &[i64],
    track: &TrackMeshData,
    descriptor: &TrackDataDescriptor,
    cfg: &DataGeneratorConfig,
) -> Result<()> {
    if cfg.want_segmentation_data || cfg.want_segmentation_visuals {
        let (data, visuals) = semantic_raster(triangles, track, descriptor);
        if cfg.want_segmentation_data {
            let dir = cfg.output_dir.join("semantic_data");
            ensure_dir(&dir)?;
            save_gray(&dir.join(format!("{record_id}.png")), cfg.width, cfg.height, data)?;
        }
        if cfg.want_segmentation_visuals {
            let dir = cfg.output_dir.join("semantic_visuals");
            ensure_dir(&dir)?;
            save_rgb(&dir.join(format!("{record_id}.png")), cfg.width, cfg.height, visuals)?;
        }
    }
    let images_dir = cfg.output_dir.join("images");
    ensure_dir(&images_dir)?;
    copy_frame(&cfg.recording_dir, &images_dir, record_id)
}

#[allow(clippy::too_many_arguments)]
fn process_all_hits(
    record_id: &str,
    triangles: &[i64],
    locations: &[[f64; 3]],
    pixel_map: &[u32],
    ray_origins: &[[f64; 3]],
    track: &TrackMeshData,
    descriptor: &TrackDataDescriptor,
    cfg: &DataGeneratorConfig,
) -> Result<()> {
    let pixel_count = (cfg.width * cfg.height) as usize;
    let canvas_triangles = scatter_triangles(cfg.width, cfg.height, triangles, pixel_map);
    process_first_hit(record_id, &canvas_triangles, track, descriptor, cfg)?;

    if cfg.want_depth {
        let mut depth = vec![0.0f64; pixel_count];
        for ((&triangle, &location), &pixel) in triangles.iter().zip(locations).zip(pixel_map) {
            if triangle < 0 {
                continue;
            }
            let origin = ray_origins[pixel as usize];
            let dx = location[0] - origin[0];
            let dy = location[1] - origin[1];
            let dz = location[2] - origin[2];
            depth[pixel as usize] = (dx * dx + dy * dy + dz * dz).sqrt();
        }
        let raster = normalize_invert_to_u8(&depth);
        let dir = cfg.output_dir.join("depth");
        ensure_dir(&dir)?;
        save_gray(&dir.join(format!("{record_id}.png")), cfg.width, cfg.height, raster)?;
    }

    if cfg.want_normals {
        let mut normals = vec![[0.0f64; 3]; pixel_count];
        for (&triangle, &pixel) in triangles.iter().zip(pixel_map) {
            if triangle < 0 {
                continue;
            }
            if let Some(normal) = track.normal_of(triangle as usize) {
                normals[pixel as usize] = normal;
            }
        }
        let per_component: Vec<f64> = normals.iter().flat_map(|n| n.iter().copied()).collect();
        let scaled = normalize_invert_to_u8(&per_component);
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        for chunk in scaled.chunks_exact(3) {
            rgb.extend_from_slice(chunk);
        }
        let dir = cfg.output_dir.join("normals");
        ensure_dir(&dir)?;
        save_rgb(&dir.join(format!("{record_id}.png")), cfg.width, cfg.height, rgb)?;
    }

    Ok(())
}

fn process_payload(
    payload: IntersectionPayload,
    track: &TrackMeshData,
    descriptor: &TrackDataDescriptor,
    cfg: &DataGeneratorConfig,
) -> Result<()> {
    match payload {
        IntersectionPayload::FirstHit { record_id, triangles } => {
            process_first_hit(&record_id, &triangles, track, descriptor, cfg)
        }
        IntersectionPayload::AllHits {
            record_id,
            triangles,
            locations,
            pixel_map,
            ray_origins,
            ..
        } => process_all_hits(
            &record_id,
            &triangles,
            &locations,
            &pixel_map,
            &ray_origins,
            track,
            descriptor,
            cfg,
        ),
    }
}

/// Runs one generation worker to completion: pulls payloads off `queue`
/// until every RayCaster worker's sender side has been dropped, rendering
/// each to disk. `completed` mirrors the ray-caster's progress counter.
pub fn run_worker(
    queue: Receiver<IntersectionPayload>,
    track: Arc<TrackMeshData>,
    descriptor: Arc<TrackDataDescriptor>,
    cfg: Arc<DataGeneratorConfig>,
    completed: Arc<AtomicU64>,
) {
    loop {
        let payload = match queue.recv_timeout(QUEUE_POLL_TIMEOUT) {
            Ok(payload) => payload,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        };
        let record_id = payload.record_id().to_string();
        if let Err(err) = process_payload(payload, &track, &descriptor, &cfg) {
            tracing::warn!(record_id, error = %err, "skipping sample: raster generation failed");
        }
        completed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_types::MaterialId;
    use std::collections::HashMap;

    fn descriptor() -> TrackDataDescriptor {
        let mut material_to_semantic_id = HashMap::new();
        material_to_semantic_id.insert("road".to_string(), 0);
        TrackDataDescriptor {
            geometries_to_remove: Vec::new(),
            vertex_groups_to_modify: Vec::new(),
            material_to_semantic_id,
            colour_list: vec![[255, 0, 0], [0, 0, 0]],
        }
    }

    fn track() -> TrackMeshData {
        TrackMeshData {
            material_names: vec!["road".to_string()],
            triangle_to_material: vec![MaterialId(0)],
            triangle_to_normal: vec![[0.0, 1.0, 0.0]],
        }
    }

    #[test]
    fn semantic_raster_maps_hit_and_background_pixels() {
        let (data, visuals) = semantic_raster(&[0, -1], &track(), &descriptor());
        assert_eq!(data, vec![0, 255]);
        assert_eq!(visuals, vec![255, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn normalize_invert_to_u8_maps_nearest_value_to_the_brightest_byte() {
        let out = normalize_invert_to_u8(&[1.0, 5.0, 10.0]);
        assert_eq!(out[0], 255); // nearest (smallest depth) -> brightest
        assert_eq!(out[2], 0); // farthest -> darkest
    }

    #[test]
    fn scatter_triangles_defaults_to_background_outside_the_hit_set() {
        let canvas = scatter_triangles(2, 2, &[7], &[3]);
        assert_eq!(canvas, vec![-1, -1, -1, 7]);
    }
}
