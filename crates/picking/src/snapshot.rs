//! Sources of the current (possibly deformed) vertex data.
//!
//! The raycaster never owns mesh data. Each raycast asks a
//! [`MeshSnapshotSource`] to bake its current state into a reusable
//! [`MeshSnapshot`], along with the mesh-to-world transform.
//!
//! Two sources are provided:
//! - [`StaticMesh`] - rigid vertex data with a movable world transform
//! - [`SkinnedMesh`] - CPU linear blend skinning over bind-pose data

use glam::{Affine3A, Mat4, Vec3};
use thiserror::Error;

/// Maximum bone influences per vertex
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Vertex positions and normals sampled at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSnapshot {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl MeshSnapshot {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Provider of the current deformed mesh.
///
/// `bake` must be synchronous: when it returns, `out` holds the mesh state
/// the ray should be tested against.
pub trait MeshSnapshotSource {
    /// Write the current vertex positions and normals into `out`,
    /// replacing its previous contents.
    fn bake(&mut self, out: &mut MeshSnapshot);

    /// Mesh-to-world transform matching the last bake.
    fn world_transform(&self) -> Affine3A;
}

/// Rigid mesh whose vertices only move with its world transform.
#[derive(Debug, Clone)]
pub struct StaticMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    transform: Affine3A,
}

impl StaticMesh {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>) -> Self {
        Self {
            positions,
            normals,
            transform: Affine3A::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Affine3A) -> Self {
        self.transform = transform;
        self
    }

    pub fn set_transform(&mut self, transform: Affine3A) {
        self.transform = transform;
    }

    /// Mutable vertex positions, for hosts that deform on their own.
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }
}

impl MeshSnapshotSource for StaticMesh {
    fn bake(&mut self, out: &mut MeshSnapshot) {
        out.positions.clear();
        out.positions.extend_from_slice(&self.positions);
        out.normals.clear();
        out.normals.extend_from_slice(&self.normals);
    }

    fn world_transform(&self) -> Affine3A {
        self.transform
    }
}

/// Bone influences for a single vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexWeights {
    pub bones: [u16; MAX_BONE_INFLUENCES],
    pub weights: [f32; MAX_BONE_INFLUENCES],
}

impl VertexWeights {
    /// Vertex fully bound to one bone
    pub fn single(bone: u16) -> Self {
        Self {
            bones: [bone, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Errors for inconsistent skinning data
#[derive(Debug, Error, PartialEq)]
pub enum SkinError {
    #[error("Attribute {attribute} has {actual} entries, expected {expected}")]
    LengthMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Vertex {vertex} references bone {bone}, but only {bone_count} bones exist")]
    BoneOutOfRange {
        vertex: usize,
        bone: u16,
        bone_count: usize,
    },
}

/// Mesh deformed on the CPU by linear blend skinning.
///
/// Bone matrices are expected to already include the inverse bind matrix,
/// so the identity pose reproduces the bind pose.
#[derive(Debug, Clone)]
pub struct SkinnedMesh {
    bind_positions: Vec<Vec3>,
    bind_normals: Vec<Vec3>,
    weights: Vec<VertexWeights>,
    bone_matrices: Vec<Mat4>,
    transform: Affine3A,
}

impl SkinnedMesh {
    pub fn new(
        bind_positions: Vec<Vec3>,
        bind_normals: Vec<Vec3>,
        weights: Vec<VertexWeights>,
        bone_count: usize,
    ) -> Result<Self, SkinError> {
        let expected = bind_positions.len();
        if bind_normals.len() != expected {
            return Err(SkinError::LengthMismatch {
                attribute: "normals",
                expected,
                actual: bind_normals.len(),
            });
        }
        if weights.len() != expected {
            return Err(SkinError::LengthMismatch {
                attribute: "weights",
                expected,
                actual: weights.len(),
            });
        }
        for (vertex, w) in weights.iter().enumerate() {
            for (&bone, &weight) in w.bones.iter().zip(&w.weights) {
                if weight != 0.0 && bone as usize >= bone_count {
                    return Err(SkinError::BoneOutOfRange {
                        vertex,
                        bone,
                        bone_count,
                    });
                }
            }
        }

        Ok(Self {
            bind_positions,
            bind_normals,
            weights,
            bone_matrices: vec![Mat4::IDENTITY; bone_count],
            transform: Affine3A::IDENTITY,
        })
    }

    pub fn bone_count(&self) -> usize {
        self.bone_matrices.len()
    }

    /// Current pose, one skinning matrix per bone
    pub fn bone_matrices_mut(&mut self) -> &mut [Mat4] {
        &mut self.bone_matrices
    }

    pub fn set_transform(&mut self, transform: Affine3A) {
        self.transform = transform;
    }

    /// Blended skinning matrix for a vertex, `None` if it has no weight.
    fn skin_matrix(&self, weights: &VertexWeights) -> Option<Mat4> {
        let mut total = 0.0;
        let mut blended = Mat4::ZERO;
        for (&bone, &weight) in weights.bones.iter().zip(&weights.weights) {
            if weight == 0.0 {
                continue;
            }
            blended += self.bone_matrices[bone as usize] * weight;
            total += weight;
        }

        (total > 0.0).then(|| blended * (1.0 / total))
    }
}

impl MeshSnapshotSource for SkinnedMesh {
    fn bake(&mut self, out: &mut MeshSnapshot) {
        out.positions.clear();
        out.normals.clear();

        for ((position, normal), weights) in self
            .bind_positions
            .iter()
            .zip(&self.bind_normals)
            .zip(&self.weights)
        {
            match self.skin_matrix(weights) {
                Some(matrix) => {
                    out.positions.push(matrix.transform_point3(*position));
                    out.normals
                        .push(matrix.transform_vector3(*normal).normalize_or_zero());
                }
                None => {
                    out.positions.push(*position);
                    out.normals.push(*normal);
                }
            }
        }
    }

    fn world_transform(&self) -> Affine3A {
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_vertex_skin() -> SkinnedMesh {
        SkinnedMesh::new(
            vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vec![Vec3::Z, Vec3::Z],
            vec![
                VertexWeights::single(0),
                VertexWeights {
                    bones: [0, 1, 0, 0],
                    weights: [0.5, 0.5, 0.0, 0.0],
                },
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_static_bake_copies() {
        let mut mesh = StaticMesh::new(vec![Vec3::X, Vec3::Y], vec![Vec3::Z, Vec3::Z]);
        let mut snapshot = MeshSnapshot::default();
        mesh.bake(&mut snapshot);
        assert_eq!(snapshot.positions, vec![Vec3::X, Vec3::Y]);

        mesh.positions_mut()[0] = Vec3::ZERO;
        mesh.bake(&mut snapshot);
        assert_eq!(snapshot.positions, vec![Vec3::ZERO, Vec3::Y]);
        assert_eq!(snapshot.vertex_count(), 2);
    }

    #[test]
    fn test_identity_pose_is_bind_pose() {
        let mut skin = two_vertex_skin();
        let mut snapshot = MeshSnapshot::default();
        skin.bake(&mut snapshot);
        assert_eq!(snapshot.positions[0], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(snapshot.positions[1], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_blended_translation() {
        let mut skin = two_vertex_skin();
        skin.bone_matrices_mut()[1] = Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0));

        let mut snapshot = MeshSnapshot::default();
        skin.bake(&mut snapshot);

        // Vertex 0 only follows bone 0
        assert_eq!(snapshot.positions[0], Vec3::new(1.0, 0.0, 0.0));
        // Vertex 1 moves half way
        assert!((snapshot.positions[1] - Vec3::new(0.0, 1.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_rotated_normals_stay_unit() {
        let mut skin = two_vertex_skin();
        skin.bone_matrices_mut()[0] = Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);

        let mut snapshot = MeshSnapshot::default();
        skin.bake(&mut snapshot);
        assert!((snapshot.normals[0] - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-6);
        assert!((snapshot.normals[1].length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unweighted_vertex_keeps_bind_pose() {
        let mut skin = SkinnedMesh::new(
            vec![Vec3::X],
            vec![Vec3::Z],
            vec![VertexWeights::default()],
            1,
        )
        .unwrap();
        skin.bone_matrices_mut()[0] = Mat4::from_translation(Vec3::ONE);

        let mut snapshot = MeshSnapshot::default();
        skin.bake(&mut snapshot);
        assert_eq!(snapshot.positions[0], Vec3::X);
    }

    #[test]
    fn test_invalid_skin_rejected() {
        let err = SkinnedMesh::new(vec![Vec3::X], vec![], vec![VertexWeights::single(0)], 1)
            .unwrap_err();
        assert!(matches!(err, SkinError::LengthMismatch { attribute: "normals", .. }));

        let err = SkinnedMesh::new(vec![Vec3::X], vec![Vec3::Z], vec![VertexWeights::single(3)], 2)
            .unwrap_err();
        assert_eq!(
            err,
            SkinError::BoneOutOfRange {
                vertex: 0,
                bone: 3,
                bone_count: 2
            }
        );
    }
}
