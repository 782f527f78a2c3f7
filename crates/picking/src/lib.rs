//! Skinned-mesh picking for brush painting
//!
//! This crate finds where a pointer ray strikes a (possibly deforming) mesh
//! and which vertices around that point a brush should affect:
//! - [`triangle`] - Ray intersection and closest-point queries on one triangle
//! - [`topology`] - Vertex-to-triangle adjacency from the index buffer
//! - [`cache`] - Per-frame triangle geometry rebuilt from baked positions
//! - [`snapshot`] - Mesh sources (static and CPU-skinned) that bake vertex data
//! - [`region`] - One-ring and radius/facing-bounded flood-fill growth
//! - [`selection`] - Per-vertex facing mask and selection details
//! - [`raycaster`] - The per-mesh raycaster tying the above together
//! - [`paint_target`] - Brush-driven paint requests for the paint pass

pub mod cache;
pub mod paint_target;
pub mod raycaster;
pub mod region;
pub mod selection;
pub mod snapshot;
pub mod topology;
pub mod triangle;
pub mod types;

pub use cache::TriangleCache;
pub use paint_target::{PaintRequest, PaintTarget};
pub use raycaster::MeshRaycaster;
pub use region::{Region, RegionGrower, RegionQuery};
pub use selection::Selection;
pub use snapshot::{
    MeshSnapshot, MeshSnapshotSource, SkinError, SkinnedMesh, StaticMesh, VertexWeights,
};
pub use topology::TopologyIndex;
pub use triangle::Triangle;
pub use types::*;

pub use skinpaint_config::{BrushSettings, DirectionMode, RaycastConfig, SelectionPolicy};
