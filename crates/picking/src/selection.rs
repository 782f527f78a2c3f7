//! Per-vertex selection produced by a raycast.

use glam::Vec3;

use crate::region::Region;
use crate::topology::TopologyIndex;

/// Result of the last raycast: facing mask plus the triangles behind it.
///
/// Buffers are reused across raycasts; every raycast starts from an
/// all-zero mask.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    facing_mask: Vec<f32>,
    region: Region,
    selected_positions: Vec<Vec3>,
    world_point: Option<Vec3>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the previous selection and size the mask for `vertex_count`.
    pub fn reset(&mut self, vertex_count: usize) {
        self.facing_mask.clear();
        self.facing_mask.resize(vertex_count, 0.0);
        self.region.clear();
        self.selected_positions.clear();
        self.world_point = None;
    }

    /// Mark every vertex of the region's in-range triangles.
    ///
    /// Returns the number of distinct vertices marked.
    pub(crate) fn mark_region(
        &mut self,
        topology: &TopologyIndex,
        positions: &[Vec3],
        world_point: Vec3,
    ) -> usize {
        for &tri in &self.region.in_range {
            let Some(vertices) = topology.triangle_vertices(tri as usize) else {
                continue;
            };
            for vertex in vertices {
                let vertex = vertex as usize;
                let Some(mask) = self.facing_mask.get_mut(vertex) else {
                    continue;
                };
                if *mask == 0.0 {
                    *mask = 1.0;
                    if let Some(&position) = positions.get(vertex) {
                        self.selected_positions.push(position);
                    }
                }
            }
        }
        self.world_point = Some(world_point);
        self.selected_positions.len()
    }

    pub(crate) fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    /// Per-vertex mask, 1.0 for selected vertices and 0.0 otherwise
    pub fn facing_mask(&self) -> &[f32] {
        &self.facing_mask
    }

    /// Facing mask as raw bytes for upload into a GPU buffer
    pub fn facing_mask_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.facing_mask)
    }

    /// Whether a vertex is part of the selection
    pub fn is_selected(&self, vertex: usize) -> bool {
        self.facing_mask.get(vertex).is_some_and(|&m| m > 0.0)
    }

    /// Triangles whose vertices were marked
    pub fn in_range(&self) -> &[u32] {
        &self.region.in_range
    }

    /// Every triangle examined during region growth
    pub fn visited(&self) -> &[u32] {
        &self.region.visited
    }

    /// Mesh-space positions of the selected vertices, one per vertex
    pub fn selected_positions(&self) -> &[Vec3] {
        &self.selected_positions
    }

    /// World-space hit point, `None` if the last raycast failed
    pub fn world_point(&self) -> Option<Vec3> {
        self.world_point
    }
}
