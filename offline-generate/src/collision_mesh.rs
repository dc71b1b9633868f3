//! An accelerated ray-mesh intersector over the concatenated collision mesh
//! (SPEC_FULL.md §4.11 "accelerated ray-mesh intersector"): a simple
//! median-split bounding-volume hierarchy over triangles, queried with a
//! Möller–Trumbore ray-triangle test. Triangle indices returned by a query
//! are indices into the same triangle list [`crate::mesh_loader`] built,
//! so they key directly into [`harness_types::TrackMeshData`].

use nalgebra::{Point3, Vector3};
use parry3d_f64::query::Ray;

const LEAF_SIZE: usize = 4;
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    fn of_triangle(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self {
            min: Point3::new(
                v0.x.min(v1.x).min(v2.x),
                v0.y.min(v1.y).min(v2.y),
                v0.z.min(v1.z).min(v2.z),
            ),
            max: Point3::new(
                v0.x.max(v1.x).max(v2.x),
                v0.y.max(v1.y).max(v2.y),
                v0.z.max(v1.z).max(v2.z),
            ),
        }
    }

    fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    fn longest_axis(&self) -> usize {
        let extent = self.max - self.min;
        if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        }
    }

    /// Slab test; returns the ray's entry distance if it hits this box at
    /// all within `[0, max_t]`.
    fn ray_entry(&self, origin: &Point3<f64>, inv_dir: &Vector3<f64>, max_t: f64) -> Option<f64> {
        let mut t_min = 0.0f64;
        let mut t_max = max_t;
        for axis in 0..3 {
            let o = origin[axis];
            let d = inv_dir[axis];
            let mut t0 = (self.min[axis] - o) * d;
            let mut t1 = (self.max[axis] - o) * d;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return None;
            }
        }
        Some(t_min)
    }
}

#[derive(Debug, Clone, Copy)]
struct TriangleGeom {
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
    index: u32,
}

enum Node {
    Leaf { aabb: Aabb, triangles: Vec<TriangleGeom> },
    Split { aabb: Aabb, left: Box<Node>, right: Box<Node> },
}

impl Node {
    fn aabb(&self) -> &Aabb {
        match self {
            Node::Leaf { aabb, .. } => aabb,
            Node::Split { aabb, .. } => aabb,
        }
    }
}

fn build(mut triangles: Vec<TriangleGeom>) -> Node {
    let aabb = triangles
        .iter()
        .map(|t| Aabb::of_triangle(t.v0, t.v1, t.v2))
        .reduce(|a, b| a.union(&b))
        .expect("build is never called with zero triangles");

    if triangles.len() <= LEAF_SIZE {
        return Node::Leaf { aabb, triangles };
    }

    let axis = aabb.longest_axis();
    triangles.sort_by(|a, b| {
        let ca = (a.v0[axis] + a.v1[axis] + a.v2[axis]) / 3.0;
        let cb = (b.v0[axis] + b.v1[axis] + b.v2[axis]) / 3.0;
        ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
    });
    let mid = triangles.len() / 2;
    let right_half = triangles.split_off(mid);

    Node::Split {
        aabb,
        left: Box::new(build(triangles)),
        right: Box::new(build(right_half)),
    }
}

/// Möller–Trumbore ray-triangle intersection; returns the hit distance
/// along `dir` (`dir` need not be unit length, but callers here always pass
/// a unit vector so distance equals world-space depth).
fn intersect_triangle(origin: &Point3<f64>, dir: &Vector3<f64>, tri: &TriangleGeom) -> Option<f64> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;
    let pvec = dir.cross(&edge2);
    let det = edge1.dot(&pvec);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = origin - tri.v0;
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(&edge1);
    let v = dir.dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(&qvec) * inv_det;
    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// The nearest-hit result of one ray query: the hit triangle's index (into
/// the triangle list the mesh was built from), the hit distance, and the
/// world-space hit location.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub triangle: u32,
    pub distance: f64,
    pub location: Point3<f64>,
}

/// A BVH over the track's concatenated collision mesh. `None` for a track
/// with no collidable triangles at all, in which case every ray misses.
pub struct CollisionMesh {
    root: Option<Node>,
}

impl CollisionMesh {
    /// Builds the BVH from a flat triangle list; `index` recorded on each
    /// [`TriangleGeom`] is this list's position, matching
    /// [`harness_types::TrackMeshData`]'s triangle indexing.
    pub fn build(triangles: &[[Point3<f64>; 3]]) -> Self {
        if triangles.is_empty() {
            return Self { root: None };
        }
        let geoms = triangles
            .iter()
            .enumerate()
            .map(|(i, [v0, v1, v2])| TriangleGeom {
                v0: *v0,
                v1: *v1,
                v2: *v2,
                index: i as u32,
            })
            .collect();
        Self { root: Some(build(geoms)) }
    }

    /// Casts one ray and returns the nearest hit, or `None` for background.
    pub fn cast(&self, ray: &Ray) -> Option<Hit> {
        let root = self.root.as_ref()?;
        let inv_dir = Vector3::new(1.0 / ray.dir.x, 1.0 / ray.dir.y, 1.0 / ray.dir.z);
        let mut best: Option<Hit> = None;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let max_t = best.map(|h| h.distance).unwrap_or(f64::INFINITY);
            if node.aabb().ray_entry(&ray.origin, &inv_dir, max_t).is_none() {
                continue;
            }
            match node {
                Node::Leaf { triangles, .. } => {
                    for tri in triangles {
                        if let Some(t) = intersect_triangle(&ray.origin, &ray.dir, tri) {
                            if best.map(|h| t < h.distance).unwrap_or(true) {
                                best = Some(Hit {
                                    triangle: tri.index,
                                    distance: t,
                                    location: ray.origin + ray.dir * t,
                                });
                            }
                        }
                    }
                }
                Node::Split { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle_mesh() -> CollisionMesh {
        // A unit triangle in the z=5 plane, facing the camera at the origin.
        CollisionMesh::build(&[[
            Point3::new(-1.0, -1.0, 5.0),
            Point3::new(1.0, -1.0, 5.0),
            Point3::new(0.0, 1.0, 5.0),
        ]])
    }

    #[test]
    fn ray_through_the_triangle_hits_at_the_expected_distance() {
        let mesh = single_triangle_mesh();
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
        let hit = mesh.cast(&ray).expect("ray should hit the triangle");
        assert_eq!(hit.triangle, 0);
        assert!((hit.distance - 5.0).abs() < 1e-9);
        assert!((hit.location.z - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_mesh_never_reports_a_hit() {
        let mesh = CollisionMesh::build(&[]);
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
        assert!(mesh.cast(&ray).is_none());
    }

    #[test]
    fn ray_missing_the_triangle_returns_none() {
        let mesh = single_triangle_mesh();
        let ray = Ray::new(Point3::origin(), Vector3::new(10.0, 10.0, 1.0).normalize());
        assert!(mesh.cast(&ray).is_none());
    }

    #[test]
    fn picks_the_nearer_of_two_overlapping_triangles() {
        let mesh = CollisionMesh::build(&[
            [
                Point3::new(-1.0, -1.0, 10.0),
                Point3::new(1.0, -1.0, 10.0),
                Point3::new(0.0, 1.0, 10.0),
            ],
            [
                Point3::new(-1.0, -1.0, 3.0),
                Point3::new(1.0, -1.0, 3.0),
                Point3::new(0.0, 1.0, 3.0),
            ],
        ]);
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
        let hit = mesh.cast(&ray).unwrap();
        assert_eq!(hit.triangle, 1);
        assert!((hit.distance - 3.0).abs() < 1e-9);
    }
}
