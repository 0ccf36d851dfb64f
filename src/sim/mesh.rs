//! Collision meshes and ray queries
//!
//! A mesh is a triangle soup in local space with optional per-vertex normals
//! and child meshes offset from their parent. Queries take the owning
//! entity's world transform so meshes are never mutated when entities move.

use glam::{Affine3A, Vec3};

use crate::error::GeometryError;

/// Smallest determinant treated as a non-parallel ray/triangle pair
const RAY_EPSILON: f32 = 1e-7;

/// Triangle mesh used for collision
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMesh {
    pub vertices: Vec<Vec3>,
    /// Outward normals, one per vertex (required on ray-source meshes only)
    pub normals: Option<Vec<Vec3>>,
    pub triangles: Vec<[u32; 3]>,
    /// Offset relative to the parent mesh (identity at the root)
    pub local: Affine3A,
    pub children: Vec<CollisionMesh>,
}

impl CollisionMesh {
    pub fn new(vertices: Vec<Vec3>, normals: Option<Vec<Vec3>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            normals,
            triangles,
            local: Affine3A::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Attach a child mesh at the given offset
    pub fn with_child(mut self, local: Affine3A, mut child: CollisionMesh) -> Self {
        child.local = local;
        self.children.push(child);
        self
    }

    /// Axis-aligned cube with normals pointing out through each corner
    pub fn cube(half_extent: f32) -> Self {
        let vertices: Vec<Vec3> = (0..8)
            .map(|i| {
                let pick = |bit: u32| if i & (1 << bit) != 0 { half_extent } else { -half_extent };
                Vec3::new(pick(0), pick(1), pick(2))
            })
            .collect();
        let normals = vertices.iter().map(|v| v.normalize_or_zero()).collect();
        let faces: [[u32; 4]; 6] = [
            [0, 2, 6, 4],
            [1, 5, 7, 3],
            [0, 4, 5, 1],
            [2, 3, 7, 6],
            [0, 1, 3, 2],
            [4, 6, 7, 5],
        ];
        let triangles = faces
            .iter()
            .flat_map(|[a, b, c, d]| [[*a, *b, *c], [*a, *c, *d]])
            .collect();
        Self::new(vertices, Some(normals), triangles)
    }

    /// Flat annulus in the XZ plane (ring pickups)
    pub fn annulus(inner_radius: f32, outer_radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(segments as usize * 2);
        for radius in [outer_radius, inner_radius] {
            for i in 0..segments {
                let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
                vertices.push(Vec3::new(radius * theta.cos(), 0.0, radius * theta.sin()));
            }
        }
        let normals = vec![Vec3::Y; vertices.len()];
        let triangles = (0..segments)
            .flat_map(|i| {
                let next = (i + 1) % segments;
                let (o0, o1) = (i, next);
                let (i0, i1) = (segments + i, segments + next);
                [[o0, o1, i1], [o0, i1, i0]]
            })
            .collect();
        Self::new(vertices, Some(normals), triangles)
    }

    /// Check this mesh (and its children) can act as a ray source
    pub fn validate_ray_source(&self) -> Result<(), GeometryError> {
        let normals = self.normals.as_ref().ok_or(GeometryError::MissingNormals)?;
        if normals.len() != self.vertices.len() {
            return Err(GeometryError::NormalCountMismatch {
                vertices: self.vertices.len(),
                normals: normals.len(),
            });
        }
        self.validate_triangles()?;
        self.children.iter().try_for_each(|c| c.validate_ray_source())
    }

    /// Check every triangle index refers to an existing vertex
    pub fn validate_triangles(&self) -> Result<(), GeometryError> {
        let vertices = self.vertices.len();
        if let Some(&index) = self
            .triangles
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertices)
        {
            return Err(GeometryError::IndexOutOfRange { index, vertices });
        }
        self.children.iter().try_for_each(|c| c.validate_triangles())
    }

    /// World-space (position, unit normal) pairs for every vertex, children included
    pub fn world_rays(&self, transform: &Affine3A) -> Result<Vec<(Vec3, Vec3)>, GeometryError> {
        self.validate_ray_source()?;
        let mut rays = Vec::with_capacity(self.vertices.len());
        self.collect_rays(transform, &mut rays);
        Ok(rays)
    }

    fn collect_rays(&self, parent: &Affine3A, out: &mut Vec<(Vec3, Vec3)>) {
        let world = *parent * self.local;
        // Normals transform by the inverse transpose so non-uniform scale keeps them perpendicular
        let normal_matrix = world.matrix3.inverse().transpose();
        if let Some(normals) = &self.normals {
            for (v, n) in self.vertices.iter().zip(normals) {
                let origin = world.transform_point3(*v);
                let dir = Vec3::from(normal_matrix * glam::Vec3A::from(*n)).normalize_or_zero();
                out.push((origin, dir));
            }
        }
        for child in &self.children {
            child.collect_rays(&world, out);
        }
    }

    /// Nearest hit distance along `dir` from `origin`, searching children too
    pub fn ray_distance(&self, transform: &Affine3A, origin: Vec3, dir: Vec3) -> Option<f32> {
        let world = *transform * self.local;
        let own = self
            .triangles
            .iter()
            .filter_map(|[a, b, c]| {
                let a = world.transform_point3(*self.vertices.get(*a as usize)?);
                let b = world.transform_point3(*self.vertices.get(*b as usize)?);
                let c = world.transform_point3(*self.vertices.get(*c as usize)?);
                ray_triangle(origin, dir, a, b, c)
            })
            .fold(None, nearer);
        self.children
            .iter()
            .filter_map(|child| child.ray_distance(&world, origin, dir))
            .fold(own, nearer)
    }
}

fn nearer(best: Option<f32>, t: f32) -> Option<f32> {
    Some(best.map_or(t, |b| b.min(t)))
}

/// Two-sided Möller-Trumbore intersection; returns the distance along `dir`
/// (in units of `dir`'s length) when the hit is in front of the origin
pub fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < RAY_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_triangle_hit_and_miss() {
        let (a, b, c) = (
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let hit = ray_triangle(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, a, b, c);
        assert!((hit.unwrap() - 2.0).abs() < 1e-5);

        // Pointing away
        assert!(ray_triangle(Vec3::new(0.0, 2.0, 0.0), Vec3::Y, a, b, c).is_none());
        // Outside the triangle
        assert!(ray_triangle(Vec3::new(5.0, 2.0, 0.0), Vec3::NEG_Y, a, b, c).is_none());
        // Parallel
        assert!(ray_triangle(Vec3::new(0.0, 2.0, 0.0), Vec3::X, a, b, c).is_none());
    }

    #[test]
    fn test_cube_ray_distance_uses_transform() {
        let cube = CollisionMesh::cube(0.5);
        let transform = Affine3A::from_translation(Vec3::new(0.0, -3.0, 0.0));
        let t = cube
            .ray_distance(&transform, Vec3::new(0.1, 0.0, 0.2), Vec3::NEG_Y)
            .unwrap();
        assert!((t - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_ray_distance_recurses_into_children() {
        let parent = CollisionMesh::new(Vec::new(), None, Vec::new())
            .with_child(Affine3A::from_translation(Vec3::new(0.0, 0.0, 4.0)), CollisionMesh::cube(1.0));
        let t = parent
            .ray_distance(&Affine3A::IDENTITY, Vec3::new(0.2, 0.3, 0.0), Vec3::Z)
            .unwrap();
        assert!((t - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_world_rays_follow_transform() {
        let cube = CollisionMesh::cube(1.0);
        let transform = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(10.0, 0.0, 0.0),
        );
        let rays = cube.world_rays(&transform).unwrap();
        assert_eq!(rays.len(), 8);
        for (origin, normal) in rays {
            assert!((normal.length() - 1.0).abs() < 1e-5);
            // Normals point away from the cube center
            assert!((origin - Vec3::new(10.0, 0.0, 0.0)).dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_missing_normals_rejected() {
        let mut cube = CollisionMesh::cube(1.0);
        cube.normals = None;
        assert_eq!(cube.validate_ray_source(), Err(GeometryError::MissingNormals));

        let mut cube = CollisionMesh::cube(1.0);
        cube.normals.as_mut().unwrap().pop();
        assert_eq!(
            cube.world_rays(&Affine3A::IDENTITY),
            Err(GeometryError::NormalCountMismatch { vertices: 8, normals: 7 })
        );
    }

    #[test]
    fn test_bad_index_rejected_but_ray_query_does_not_panic() {
        let mut cube = CollisionMesh::cube(1.0);
        cube.triangles.push([0, 1, 99]);
        assert_eq!(
            cube.validate_triangles(),
            Err(GeometryError::IndexOutOfRange { index: 99, vertices: 8 })
        );
        assert!(cube
            .ray_distance(
                &Affine3A::from_translation(Vec3::Y * 5.0),
                Vec3::new(0.3, 0.0, 0.1),
                Vec3::Y
            )
            .is_some());
    }

    #[test]
    fn test_annulus_hole_lets_rays_through() {
        let ring = CollisionMesh::annulus(1.0, 2.0, 16);
        let transform = Affine3A::from_translation(Vec3::new(0.0, -1.0, 0.0));
        assert!(ring.ray_distance(&transform, Vec3::ZERO, Vec3::NEG_Y).is_none());
        let half_segment = std::f32::consts::PI / 16.0;
        let origin = Vec3::new(1.5 * half_segment.cos(), 0.0, 1.5 * half_segment.sin());
        let t = ring
            .ray_distance(&transform, origin, Vec3::NEG_Y)
            .unwrap();
        assert!((t - 1.0).abs() < 1e-5);
    }
}
