//! A paintable mesh: raycaster, mesh source and brush settings together.
//!
//! Produces [`PaintRequest`]s for the texture-paint pass. The paint pass
//! itself (render targets, shaders) lives in the host.

use glam::Vec3;
use skinpaint_config::{BrushSettings, RaycastConfig};
use tracing::{debug, warn};

use crate::raycaster::MeshRaycaster;
use crate::snapshot::MeshSnapshotSource;
use crate::types::{Ray, RaycastError};

/// Everything the paint pass needs for one dab
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintRequest {
    /// Brush center in world space
    pub world_point: Vec3,
    /// Direction towards the viewer (negated world ray direction)
    pub facing: Vec3,
    pub radius: f32,
    pub hardness: f32,
    pub strength: f32,
}

/// Mesh that can be painted by pointer rays.
pub struct PaintTarget<S: MeshSnapshotSource> {
    source: S,
    raycaster: MeshRaycaster,
    brush: BrushSettings,
}

impl<S: MeshSnapshotSource> PaintTarget<S> {
    /// Bind `source` with the given topology.
    pub fn new(
        source: S,
        vertex_count: usize,
        indices: &[u32],
        config: RaycastConfig,
        brush: BrushSettings,
    ) -> Result<Self, RaycastError> {
        let mut raycaster = MeshRaycaster::new(config);
        raycaster.bind(vertex_count, indices)?;
        Ok(Self {
            source,
            raycaster,
            brush,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn raycaster(&self) -> &MeshRaycaster {
        &self.raycaster
    }

    pub fn raycaster_mut(&mut self) -> &mut MeshRaycaster {
        &mut self.raycaster
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn set_brush(&mut self, brush: BrushSettings) {
        self.brush = brush;
    }

    /// Raycast with the current brush and build a paint request.
    pub fn paint_request(&mut self, ray: Ray) -> Result<PaintRequest, RaycastError> {
        let hit = self
            .raycaster
            .raycast(&mut self.source, ray, self.brush.radius)?;
        Ok(PaintRequest {
            world_point: hit.world_point,
            facing: -ray.direction,
            radius: self.brush.radius,
            hardness: self.brush.hardness,
            strength: self.brush.strength,
        })
    }

    /// Refine a coarse hit (e.g. from a physics collider) against the
    /// deformed surface.
    ///
    /// Falls back to `fallback` when the frame should be skipped; binding
    /// errors are still returned.
    pub fn try_point_on_mesh(&mut self, ray: Ray, fallback: Vec3) -> Result<Vec3, RaycastError> {
        match self
            .raycaster
            .raycast(&mut self.source, ray, self.brush.radius)
        {
            Ok(hit) => Ok(hit.world_point),
            Err(err) if err.is_recoverable() => {
                debug!("try_point_on_mesh: {}, using fallback point", err);
                Ok(fallback)
            }
            Err(err) => {
                warn!("try_point_on_mesh: {}", err);
                Err(err)
            }
        }
    }
}
