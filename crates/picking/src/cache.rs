//! Per-frame triangle geometry rebuilt from the current vertex positions.

use glam::Vec3;

use crate::triangle::Triangle;
use crate::types::{Ray, RaycastError};

/// The current frame's triangles, stored by triangle index.
///
/// Backing storage is reused across rebuilds.
#[derive(Debug, Clone, Default)]
pub struct TriangleCache {
    triangles: Vec<Triangle>,
}

impl TriangleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild every triangle from the current positions.
    ///
    /// `triangles` holds the vertex indices of each triangle. On error the
    /// cache is left empty.
    pub fn rebuild(
        &mut self,
        positions: &[Vec3],
        triangles: &[[u32; 3]],
    ) -> Result<(), RaycastError> {
        self.triangles.resize(triangles.len(), Triangle::default());

        for (tri_idx, vertices) in triangles.iter().enumerate() {
            match triangle_positions(positions, *vertices) {
                Ok([v1, v2, v3]) => {
                    self.triangles[tri_idx] = Triangle::new(tri_idx as u32, v1, v2, v3);
                }
                Err(e) => {
                    self.triangles.clear();
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Closest intersected triangle over a full linear scan.
    ///
    /// Returns the triangle index and ray parameter. Among equal distances
    /// the lowest triangle index wins.
    pub fn closest_hit(&self, ray: &Ray, epsilon: f32) -> Option<(u32, f32)> {
        let mut closest: Option<(u32, f32)> = None;

        for triangle in &self.triangles {
            if let Some(t) = triangle.intersect_with_epsilon(ray, epsilon) {
                let dominated = match closest {
                    Some((_, best)) => t >= best,
                    None => false,
                };
                if !dominated {
                    closest = Some((triangle.index, t));
                }
            }
        }

        closest
    }
}

fn triangle_positions(positions: &[Vec3], vertices: [u32; 3]) -> Result<[Vec3; 3], RaycastError> {
    let fetch = |i: u32| {
        positions
            .get(i as usize)
            .copied()
            .ok_or(RaycastError::IndexOutOfRange {
                index: i as usize,
                len: positions.len(),
            })
    };
    Ok([fetch(vertices[0])?, fetch(vertices[1])?, fetch(vertices[2])?])
}
