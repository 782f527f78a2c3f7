//! Vertex-to-triangle adjacency built from a triangle index buffer.
//!
//! Only connectivity is stored, so the index survives any amount of vertex
//! deformation. It must be rebuilt when the index buffer or vertex count
//! changes.

use tracing::debug;

use crate::types::RaycastError;

/// Maps every vertex to the triangles that reference it.
#[derive(Debug, Clone, Default)]
pub struct TopologyIndex {
    /// Vertex indices of every triangle, in index-buffer order
    triangles: Vec<[u32; 3]>,
    /// For each vertex, incident triangle indices in first-seen order
    vertex_triangles: Vec<Vec<u32>>,
}

impl TopologyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a new index from a flat triangle list.
    pub fn from_indices(vertex_count: usize, indices: &[u32]) -> Result<Self, RaycastError> {
        let mut topology = Self::new();
        topology.build(vertex_count, indices)?;
        Ok(topology)
    }

    /// Clear and repopulate the adjacency from a flat triangle list.
    ///
    /// The buffer is validated before anything is modified, so on error the
    /// previous contents are kept.
    pub fn build(&mut self, vertex_count: usize, indices: &[u32]) -> Result<(), RaycastError> {
        if indices.len() % 3 != 0 {
            return Err(RaycastError::InvalidIndexBuffer { len: indices.len() });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RaycastError::IndexOutOfRange {
                index: index as usize,
                len: vertex_count,
            });
        }

        self.triangles.clear();
        self.triangles.extend(
            indices
                .chunks_exact(3)
                .map(|tri| [tri[0], tri[1], tri[2]]),
        );

        for list in &mut self.vertex_triangles {
            list.clear();
        }
        self.vertex_triangles.resize_with(vertex_count, Vec::new);

        for (tri_idx, tri) in self.triangles.iter().enumerate() {
            let tri_idx = tri_idx as u32;
            for &vertex in tri {
                let list = &mut self.vertex_triangles[vertex as usize];
                // A degenerate triangle may name the same vertex twice
                if !list.contains(&tri_idx) {
                    list.push(tri_idx);
                }
            }
        }

        debug!(
            "TopologyIndex: built {} vertices, {} triangles",
            vertex_count,
            self.triangles.len()
        );
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_triangles.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Triangles incident to a vertex.
    pub fn triangles_of(&self, vertex: usize) -> Result<&[u32], RaycastError> {
        self.vertex_triangles
            .get(vertex)
            .map(Vec::as_slice)
            .ok_or(RaycastError::IndexOutOfRange {
                index: vertex,
                len: self.vertex_triangles.len(),
            })
    }

    /// Vertex indices of a triangle.
    pub fn triangle_vertices(&self, triangle: usize) -> Option<[u32; 3]> {
        self.triangles.get(triangle).copied()
    }

    /// All vertex triples, in index-buffer order.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Append the one-ring of a triangle (itself plus every triangle sharing
    /// a vertex with it) to `out`, without duplicates.
    ///
    /// Does nothing if `triangle` is out of range.
    pub fn one_ring(&self, triangle: usize, out: &mut Vec<u32>) {
        let Some(vertices) = self.triangle_vertices(triangle) else {
            return;
        };
        for vertex in vertices {
            for &neighbor in &self.vertex_triangles[vertex as usize] {
                if !out.contains(&neighbor) {
                    out.push(neighbor);
                }
            }
        }
    }
}
