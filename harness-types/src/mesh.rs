//! Data-only track-mesh descriptors shared between configuration loading and
//! the mesh-loading/ray-casting code in `offline-generate` (SPEC_FULL.md §3
//! TrackMesh, §6 offline inputs).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The class id a triangle's material maps to. `-1` is background/unassigned.
pub type SemanticId = i32;

/// The per-track data table that parameterises offline ground-truth
/// generation: which geometries to drop, which vertex groups are re-tagged
/// to the "physics" material before indexing, and the material→semantic
/// mapping used to build [`crate::mesh::SemanticId`] rasters.
///
/// Grounded on `tracks.monza`'s `GEOMETRIES_TO_REMOVE`, `MESH_NAME_TO_ID`,
/// `VERTEX_GROUPS_TO_MODIFY`, `COLOUR_LIST` constants in the original
/// ground-truth generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackDataDescriptor {
    pub geometries_to_remove: Vec<String>,
    pub vertex_groups_to_modify: Vec<String>,
    pub material_to_semantic_id: HashMap<String, SemanticId>,
    /// RGB colour per semantic class, indexed by id; the last entry is the
    /// background colour used for unassigned (`-1`) pixels.
    pub colour_list: Vec<[u8; 3]>,
}

impl TrackDataDescriptor {
    pub fn semantic_id_for_material(&self, material: &str) -> SemanticId {
        self.material_to_semantic_id
            .get(material)
            .copied()
            .unwrap_or(-1)
    }

    pub fn colour_for_semantic_id(&self, id: SemanticId) -> [u8; 3] {
        if id < 0 {
            return *self.colour_list.last().unwrap_or(&[0, 0, 0]);
        }
        self.colour_list
            .get(id as usize)
            .copied()
            .unwrap_or([0, 0, 0])
    }

    pub fn is_vertex_group_to_modify(&self, group_name: &str) -> bool {
        self.vertex_groups_to_modify
            .iter()
            .any(|g| group_name.contains(g.as_str()))
    }
}

/// Stable identifier of one interned material name, used to key
/// [`TrackMeshData`]'s per-triangle lookup table without repeating the name
/// string for every triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Per-triangle material and normal lookup tables for the concatenated
/// collision mesh (SPEC_FULL.md §3 TrackMesh). Triangle indices are stable:
/// they index into whatever geometry buffer the ray-caster's collision shape
/// holds, built in the same iteration order as this table.
#[derive(Debug, Clone, Default)]
pub struct TrackMeshData {
    /// Interned material names, indexed by [`MaterialId`].
    pub material_names: Vec<String>,
    pub triangle_to_material: Vec<MaterialId>,
    pub triangle_to_normal: Vec<[f64; 3]>,
}

impl TrackMeshData {
    pub fn material_name(&self, id: MaterialId) -> &str {
        self.material_names
            .get(id.0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn normal_of(&self, triangle: usize) -> Option<[f64; 3]> {
        self.triangle_to_normal.get(triangle).copied()
    }

    /// Resolves a triangle to its semantic id via `descriptor`, or `-1` for
    /// an out-of-range (background) triangle index.
    pub fn semantic_id_of_triangle(&self, descriptor: &TrackDataDescriptor, triangle: i64) -> SemanticId {
        if triangle < 0 {
            return -1;
        }
        match self.triangle_to_material.get(triangle as usize) {
            Some(id) => descriptor.semantic_id_for_material(self.material_name(*id)),
            None => -1,
        }
    }
}

#[cfg(test)]
mod mesh_data_tests {
    use super::*;

    #[test]
    fn unknown_triangle_and_negative_index_are_background() {
        let data = TrackMeshData {
            material_names: vec!["road".to_string()],
            triangle_to_material: vec![MaterialId(0)],
            triangle_to_normal: vec![[0.0, 1.0, 0.0]],
        };
        let mut descriptor = TrackDataDescriptor::default();
        descriptor.material_to_semantic_id.insert("road".to_string(), 0);

        assert_eq!(data.semantic_id_of_triangle(&descriptor, 0), 0);
        assert_eq!(data.semantic_id_of_triangle(&descriptor, 1), -1);
        assert_eq!(data.semantic_id_of_triangle(&descriptor, -1), -1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_material_is_background() {
        let d = TrackDataDescriptor::default();
        assert_eq!(d.semantic_id_for_material("tarmac"), -1);
    }

    #[test]
    fn background_uses_last_colour_entry() {
        let mut d = TrackDataDescriptor::default();
        d.colour_list = vec![[1, 1, 1], [2, 2, 2], [9, 9, 9]];
        assert_eq!(d.colour_for_semantic_id(-1), [9, 9, 9]);
        assert_eq!(d.colour_for_semantic_id(1), [2, 2, 2]);
    }
}
