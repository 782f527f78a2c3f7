//! Raycasting against a deforming mesh with brush-region selection.
//!
//! Each call bakes the mesh source, brings the ray into mesh space,
//! rebuilds the triangle cache, finds the closest hit and grows the vertex
//! selection around it. Nothing is precomputed across calls except the
//! topology, which only changes on [`MeshRaycaster::bind`].

use glam::{Affine3A, Vec3};
use skinpaint_config::{DirectionMode, RaycastConfig};
use tracing::{debug, trace};

use crate::cache::TriangleCache;
use crate::region::{RegionGrower, RegionQuery};
use crate::selection::Selection;
use crate::snapshot::{MeshSnapshot, MeshSnapshotSource};
use crate::topology::TopologyIndex;
use crate::triangle::Triangle;
use crate::types::{Ray, RaycastError, RaycastHit};

/// Raycaster for one mesh.
///
/// Owns the per-frame buffers (snapshot, triangle cache, selection) and
/// reuses them across calls. Calls must be serialized per instance.
#[derive(Debug, Default)]
pub struct MeshRaycaster {
    config: RaycastConfig,
    /// Bound topology, `None` until [`bind`](Self::bind) succeeds
    topology: Option<TopologyIndex>,
    snapshot: MeshSnapshot,
    cache: TriangleCache,
    grower: RegionGrower,
    selection: Selection,
}

impl MeshRaycaster {
    pub fn new(config: RaycastConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Register the mesh topology. Call again whenever the vertex count or
    /// index buffer changes; deformation alone never needs a rebind.
    pub fn bind(&mut self, vertex_count: usize, indices: &[u32]) -> Result<(), RaycastError> {
        let topology = TopologyIndex::from_indices(vertex_count, indices)?;
        debug!(
            "MeshRaycaster: bound mesh with {} vertices, {} triangles",
            vertex_count,
            topology.triangle_count()
        );
        self.selection.reset(vertex_count);
        self.cache = TriangleCache::new();
        self.topology = Some(topology);
        Ok(())
    }

    pub fn unbind(&mut self) {
        self.topology = None;
        self.cache = TriangleCache::new();
        self.selection.reset(0);
    }

    pub fn is_bound(&self) -> bool {
        self.topology.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.topology.as_ref().map_or(0, TopologyIndex::vertex_count)
    }

    pub fn triangle_count(&self) -> usize {
        self.topology.as_ref().map_or(0, TopologyIndex::triangle_count)
    }

    pub fn topology(&self) -> Option<&TopologyIndex> {
        self.topology.as_ref()
    }

    pub fn config(&self) -> &RaycastConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RaycastConfig) {
        self.config = config;
    }

    /// Cast a world-space ray against the current state of `source`.
    ///
    /// On success the facing mask marks the vertices selected around the
    /// hit. `radius` is in mesh units and only affects the flood-fill policy;
    /// a negative or NaN radius selects only the hit triangle.
    ///
    /// The hit may lie behind the ray origin: intersections with negative
    /// ray parameter are not rejected.
    pub fn raycast<S>(
        &mut self,
        source: &mut S,
        world_ray: Ray,
        radius: f32,
    ) -> Result<RaycastHit, RaycastError>
    where
        S: MeshSnapshotSource + ?Sized,
    {
        let Some(topology) = self.topology.as_ref() else {
            trace!("raycast: no mesh bound");
            return Err(RaycastError::NoMesh);
        };
        let vertex_count = topology.vertex_count();
        self.selection.reset(vertex_count);

        source.bake(&mut self.snapshot);
        check_snapshot(&self.snapshot, vertex_count)?;

        let world = source.world_transform();
        let local_ray = to_mesh_space(&world, &world_ray, self.config.direction);

        self.cache
            .rebuild(&self.snapshot.positions, topology.triangles())?;

        let Some((hit_triangle, distance)) = self
            .cache
            .closest_hit(&local_ray, self.config.intersect_epsilon)
        else {
            trace!("raycast: no intersection");
            return Err(RaycastError::NoIntersection);
        };

        let local_point = local_ray.at(distance);
        let query = RegionQuery {
            point: local_point,
            radius,
            facing: -local_ray.direction,
            facing_epsilon: self.config.facing_epsilon,
        };
        self.grower.grow(
            self.config.selection,
            hit_triangle,
            &self.cache,
            topology,
            &query,
            self.selection.region_mut(),
        );

        let world_point = world.transform_point3(local_point);
        let selected_vertices =
            self.selection
                .mark_region(topology, &self.snapshot.positions, world_point);

        debug!(
            "raycast: hit triangle {} at t={:.4}, {} triangles / {} vertices selected",
            hit_triangle,
            distance,
            self.selection.in_range().len(),
            selected_vertices
        );

        Ok(RaycastHit {
            world_point,
            local_point,
            triangle: hit_triangle,
            distance,
            selected_vertices,
        })
    }

    /// Per-vertex selection mask from the last raycast
    pub fn facing_mask(&self) -> &[f32] {
        self.selection.facing_mask()
    }

    /// Facing mask as raw bytes for GPU upload
    pub fn facing_mask_bytes(&self) -> &[u8] {
        self.selection.facing_mask_bytes()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Triangles as rebuilt by the last raycast
    pub fn triangles(&self) -> &[Triangle] {
        self.cache.triangles()
    }

    /// Vertex data baked by the last raycast
    pub fn snapshot(&self) -> &MeshSnapshot {
        &self.snapshot
    }
}

fn check_snapshot(snapshot: &MeshSnapshot, expected: usize) -> Result<(), RaycastError> {
    for actual in [snapshot.positions.len(), snapshot.normals.len()] {
        if actual != expected {
            return Err(RaycastError::SnapshotMismatch { expected, actual });
        }
    }
    Ok(())
}

/// Bring a world-space ray into the mesh frame. The direction is never
/// renormalized.
fn to_mesh_space(world: &Affine3A, ray: &Ray, mode: DirectionMode) -> Ray {
    let inverse = world.inverse();
    let direction = match mode {
        DirectionMode::Linear => inverse.transform_vector3(ray.direction),
        DirectionMode::RotationOnly => {
            let (_, rotation, _) = world.to_scale_rotation_translation();
            rotation.inverse() * ray.direction
        }
    };
    Ray::new(inverse.transform_point3(ray.origin), direction)
}
