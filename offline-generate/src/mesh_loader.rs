//! Track collision-mesh loading (SPEC_FULL.md §3 TrackMesh, §4.11). Grounded
//! on `original_source/src/tools/data_generation/utils.py`'s
//! `load_track_mesh`/`preprocess_track_mesh`/`get_triangle_to_normal_mapping`/
//! `get_triangle_to_semantic_id_mapping`, and on `simple-obj-parse`'s use of
//! the `obj`/`genmesh` crates for OBJ triangulation.

use crate::collision_mesh::CollisionMesh;
use crate::error::{Error, Result};
use genmesh::EmitTriangles;
use harness_types::{MaterialId, TrackDataDescriptor, TrackMeshData};
use nalgebra::Point3;
use std::collections::HashMap;
use std::path::Path;

/// Rewrites `usemtl` directives inside vertex groups named in
/// `descriptor.vertex_groups_to_modify` to `usemtl physics`, mirroring
/// `preprocess_track_mesh`'s line-based pass. A new `g ` line always ends the
/// effect of the previous match.
fn retag_vertex_groups(source: &str, descriptor: &TrackDataDescriptor) -> String {
    let mut is_modifying = false;
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        if line.starts_with("g ") {
            is_modifying = false;
        }
        if descriptor.is_vertex_group_to_modify(line) {
            is_modifying = true;
        }
        if is_modifying && line.starts_with("usemtl") {
            out.push_str("usemtl physics");
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// One material name per `f` line, in file order, tracking the
/// most recently seen `usemtl` directive. Used to assign a material to each
/// polygon without depending on the OBJ parser's own material bookkeeping.
fn face_materials(source: &str) -> Vec<String> {
    let mut current = String::new();
    let mut materials = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("usemtl") {
            current = name.trim().to_string();
        } else if line.starts_with("f ") {
            materials.push(current.clone());
        }
    }
    materials
}

fn triangle_normal(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> [f64; 3] {
    let normal = (v1 - v0).cross(&(v2 - v0));
    if normal.norm() < 1e-12 {
        return [0.0, 0.0, 0.0];
    }
    let n = normal.normalize();
    [n.x, n.y, n.z]
}

/// The loaded mesh ready for ray-casting: an accelerated BVH over every
/// collision triangle, and the parallel material/normal lookup tables that
/// let a triangle index resolve to a semantic id.
pub struct LoadedTrackMesh {
    pub collision_mesh: CollisionMesh,
    pub data: TrackMeshData,
}

/// Loads `path`, retags vertex groups, drops geometries named in
/// `descriptor.geometries_to_remove`, and builds the concatenated collision
/// mesh plus its material/normal lookup tables. Triangle indices in the
/// returned [`TrackMeshData`] line up with [`CollisionMesh`]'s triangle list:
/// both are built from one pass over the same iteration order (SPEC_FULL.md
/// §3 "triangle indexes align").
pub fn load_track_mesh(path: &Path, descriptor: &TrackDataDescriptor) -> Result<LoadedTrackMesh> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::ReadMesh {
        path: path.to_path_buf(),
        source,
    })?;
    let retagged = retag_vertex_groups(&source, descriptor);
    let materials_by_face = face_materials(&retagged);

    let mut reader = std::io::BufReader::new(retagged.as_bytes());
    let obj = obj::ObjData::load_buf(&mut reader).map_err(|source| Error::ParseMesh {
        path: path.to_path_buf(),
        source,
    })?;

    let mut triangles: Vec<[Point3<f64>; 3]> = Vec::new();
    let mut triangle_to_material = Vec::new();
    let mut triangle_to_normal = Vec::new();
    let mut material_ids: HashMap<String, MaterialId> = HashMap::new();
    let mut material_names = Vec::new();
    let mut face_index = 0usize;

    for object in &obj.objects {
        let skip_object = descriptor
            .geometries_to_remove
            .iter()
            .any(|name| name == &object.name);

        for group in &object.groups {
            for poly in &group.polys {
                let material_name = materials_by_face
                    .get(face_index)
                    .cloned()
                    .unwrap_or_default();
                face_index += 1;

                if skip_object || material_name == "physics" {
                    continue;
                }

                let material_id = *material_ids.entry(material_name.clone()).or_insert_with(|| {
                    let id = MaterialId(material_names.len() as u32);
                    material_names.push(material_name.clone());
                    id
                });

                let mesh: genmesh::Polygon<_> = match poly.clone().try_into() {
                    Ok(mesh) => mesh,
                    Err(_) => continue,
                };
                mesh.emit_triangles(|tri| {
                    let genmesh::Triangle { x, y, z } = tri;
                    let to_point = |idx: obj::IndexTuple| {
                        let p = obj.position[idx.0];
                        Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)
                    };
                    let v0 = to_point(x);
                    let v1 = to_point(y);
                    let v2 = to_point(z);
                    triangles.push([v0, v1, v2]);
                    triangle_to_material.push(material_id);
                    triangle_to_normal.push(triangle_normal(v0, v1, v2));
                });
            }
        }
    }

    let collision_mesh = CollisionMesh::build(&triangles);
    let data = TrackMeshData {
        material_names,
        triangle_to_material,
        triangle_to_normal,
    };

    Ok(LoadedTrackMesh { collision_mesh, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_OBJ: &str = "\
o ground
g ground_group
usemtl tarmac
f 1 2 3
f 1 3 4

o barrier_01
g fence
usemtl metal
f 1 2 3
";

    fn descriptor() -> TrackDataDescriptor {
        TrackDataDescriptor {
            geometries_to_remove: vec!["barrier_01".to_string()],
            vertex_groups_to_modify: vec!["fence".to_string()],
            material_to_semantic_id: HashMap::new(),
            colour_list: Vec::new(),
        }
    }

    #[test]
    fn retagging_only_touches_the_named_vertex_group() {
        let out = retag_vertex_groups(CUBE_OBJ, &descriptor());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], "usemtl tarmac");
        assert_eq!(lines[7], "usemtl physics");
    }

    #[test]
    fn face_materials_tracks_the_active_usemtl_directive() {
        let materials = face_materials(CUBE_OBJ);
        assert_eq!(materials, vec!["tarmac", "tarmac", "metal"]);
    }

    #[test]
    fn loading_drops_removed_geometries_and_retagged_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.obj");
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n".to_string() + CUBE_OBJ,
        )
        .unwrap();

        let loaded = load_track_mesh(&path, &descriptor()).unwrap();
        // Only the two ground triangles remain: barrier_01 is removed by
        // name, and its fence group was retagged to "physics" anyway.
        assert_eq!(loaded.data.triangle_to_material.len(), 2);
        assert_eq!(loaded.data.material_names, vec!["tarmac".to_string()]);
    }
}
