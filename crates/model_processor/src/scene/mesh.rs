//! Shared mesh geometry
//!
//! Meshes are owned by the [`Scene`](super::Scene) and referenced from nodes
//! by [`MeshId`](super::MeshId), so several nodes may draw the same mesh.

use crate::foundation::math::{Mat4, Point3, Vec2, Vec3, Vec4};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all points, or an empty box at the origin
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        points.iter().skip(1).fold(Self::new(*first, *first), |mut aabb, p| {
            aabb.min = aabb.min.inf(p);
            aabb.max = aabb.max.sup(p);
            aabb
        })
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }
}

/// Mesh geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals, parallel to `vertices`
    pub normals: Option<Vec<Vec3>>,
    /// Per-vertex tangents, `w` holds the bitangent sign
    pub tangents: Option<Vec<Vec4>>,
    /// Per-vertex texture coordinates
    pub uvs: Option<Vec<Vec2>>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Inverse bind matrices, one per bone of a skinned renderer
    pub bind_poses: Option<Vec<Mat4>>,
    bounds: AABB,
}

impl Mesh {
    /// Create a mesh from positions and triangle indices
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = AABB::from_points(&vertices);
        Self {
            name: name.into(),
            vertices,
            normals: None,
            tangents: None,
            uvs: None,
            indices,
            bind_poses: None,
            bounds,
        }
    }

    /// Builder pattern: set normals
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Builder pattern: set texture coordinates
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Builder pattern: set bind poses
    pub fn with_bind_poses(mut self, bind_poses: Vec<Mat4>) -> Self {
        self.bind_poses = Some(bind_poses);
        self
    }

    /// Bounds computed by the last [`recalculate_bounds`](Self::recalculate_bounds)
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// Recompute bounds from the vertex positions
    pub fn recalculate_bounds(&mut self) {
        self.bounds = AABB::from_points(&self.vertices);
    }

    /// Apply a transform to vertices, normals and tangents
    pub fn transform(&mut self, matrix: &Mat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point(&Point3::from(*v)).coords;
        }
        if let Some(normals) = &mut self.normals {
            for n in normals.iter_mut() {
                *n = matrix.transform_vector(n);
            }
        }
        if let Some(tangents) = &mut self.tangents {
            for t in tangents.iter_mut() {
                let rotated = matrix.transform_vector(&t.xyz());
                *t = Vec4::new(rotated.x, rotated.y, rotated.z, t.w);
            }
        }
    }

    /// Whether normals, UVs and indices are available to derive tangents
    pub fn can_recalculate_tangents(&self) -> bool {
        let count = self.vertices.len();
        self.normals.as_ref().is_some_and(|n| n.len() == count)
            && self.uvs.as_ref().is_some_and(|uv| uv.len() == count)
            && !self.indices.is_empty()
    }

    /// Rebuild tangents from positions, normals and UVs
    ///
    /// Returns `false` and leaves tangents untouched when the mesh lacks the
    /// required attributes.
    pub fn recalculate_tangents(&mut self) -> bool {
        if !self.can_recalculate_tangents() {
            return false;
        }
        let (Some(normals), Some(uvs)) = (&self.normals, &self.uvs) else {
            return false;
        };

        let count = self.vertices.len();
        let mut tan1 = vec![Vec3::zeros(); count];
        let mut tan2 = vec![Vec3::zeros(); count];

        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            if i0 >= count || i1 >= count || i2 >= count {
                continue;
            }
            let e1 = self.vertices[i1] - self.vertices[i0];
            let e2 = self.vertices[i2] - self.vertices[i0];
            let duv1 = uvs[i1] - uvs[i0];
            let duv2 = uvs[i2] - uvs[i0];

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let sdir = (e1 * duv2.y - e2 * duv1.y) * r;
            let tdir = (e2 * duv1.x - e1 * duv2.x) * r;
            for i in [i0, i1, i2] {
                tan1[i] += sdir;
                tan2[i] += tdir;
            }
        }

        let tangents = (0..count)
            .map(|i| {
                let n = normals[i];
                let t = tan1[i] - n * n.dot(&tan1[i]);
                let t = t.try_normalize(f32::EPSILON).unwrap_or_else(|| any_perpendicular(n));
                let w = if n.cross(&t).dot(&tan2[i]) < 0.0 { -1.0 } else { 1.0 };
                Vec4::new(t.x, t.y, t.z, w)
            })
            .collect();
        self.tangents = Some(tangents);
        true
    }
}

fn any_perpendicular(n: Vec3) -> Vec3 {
    let axis = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    n.cross(&axis).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::x)
}
