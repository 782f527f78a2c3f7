use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A ray with an origin and a direction.
///
/// The direction is not required to be unit length; intersection distances
/// are expressed in multiples of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Successful raycast against a bound mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Hit point in world space
    pub world_point: Vec3,
    /// Hit point in mesh space
    pub local_point: Vec3,
    /// Index of the closest intersected triangle
    pub triangle: u32,
    /// Ray parameter of the hit in mesh space (may be negative)
    pub distance: f32,
    /// Number of vertices marked in the facing mask
    pub selected_vertices: usize,
}

/// Errors reported by the picking core
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RaycastError {
    #[error("No mesh bound to raycaster")]
    NoMesh,
    #[error("Ray does not intersect any triangle")]
    NoIntersection,
    #[error("Vertex index {index} out of range (vertex count {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Index buffer length {len} is not a multiple of 3")]
    InvalidIndexBuffer { len: usize },
    #[error("Snapshot has {actual} vertices, binding expects {expected}")]
    SnapshotMismatch { expected: usize, actual: usize },
}

impl RaycastError {
    /// Whether the caller can simply skip this frame and try again.
    ///
    /// The remaining variants mean the binding and the mesh data disagree.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RaycastError::NoMesh | RaycastError::NoIntersection)
    }
}
