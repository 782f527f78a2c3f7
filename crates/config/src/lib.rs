//! Shared configuration for skinned-mesh painting
//!
//! This crate provides the single source of truth for raycast tuning and
//! brush parameters shared between the host application and the picking
//! core. Everything here is plain serde data so hosts can keep it in
//! whatever settings file they already load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default determinant threshold below which a triangle is treated as
/// back-facing or parallel to the ray.
pub const DEFAULT_INTERSECT_EPSILON: f32 = 1e-8;

/// Default minimum `dot(facing, normal)` for a triangle to join a flood fill.
pub const DEFAULT_FACING_EPSILON: f32 = 1e-5;

/// Default brush radius in mesh units
pub const DEFAULT_RADIUS: f32 = 1.0;

/// Default brush strength (0-1)
pub const DEFAULT_STRENGTH: f32 = 1.0;

/// Default brush hardness (0-1)
pub const DEFAULT_HARDNESS: f32 = 1.0;

/// Errors produced while loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

/// How triangles around the hit point are gathered into the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Hit triangle plus every triangle sharing a vertex with it.
    /// Ignores radius and facing.
    OneRing,
    /// Breadth-first growth bounded by the brush radius and restricted to
    /// triangles facing the viewer.
    #[default]
    FloodFill,
}

/// How a world-space ray direction is brought into mesh space.
///
/// Neither mode renormalizes the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// Full inverse linear part of the world transform (rotation and scale).
    #[default]
    Linear,
    /// Inverse rotation only; direction length is preserved and scale ignored.
    RotationOnly,
}

/// Raycaster tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastConfig {
    /// Region growth policy
    pub selection: SelectionPolicy,
    /// Ray direction transform into mesh space
    pub direction: DirectionMode,
    /// Back-face culling threshold for ray/triangle determinant
    pub intersect_epsilon: f32,
    /// Minimum facing dot product during flood fill
    pub facing_epsilon: f32,
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            direction: DirectionMode::default(),
            intersect_epsilon: DEFAULT_INTERSECT_EPSILON,
            facing_epsilon: DEFAULT_FACING_EPSILON,
        }
    }
}

impl RaycastConfig {
    /// Config that reproduces the fixed one-ring selection.
    pub fn one_ring() -> Self {
        Self {
            selection: SelectionPolicy::OneRing,
            ..Self::default()
        }
    }

    /// Check that thresholds are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("intersect_epsilon", self.intersect_epsilon)?;
        check_non_negative("facing_epsilon", self.facing_epsilon)?;
        Ok(())
    }
}

/// Brush parameters exposed to the user by the pointer painter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    /// Selection radius in mesh units
    pub radius: f32,
    /// Paint strength 0.0-1.0
    pub strength: f32,
    /// Edge hardness: 0.0 = soft, 1.0 = hard
    pub hardness: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            strength: DEFAULT_STRENGTH,
            hardness: DEFAULT_HARDNESS,
        }
    }
}

impl BrushSettings {
    /// Create brush settings, clamping strength and hardness to 0..1.
    /// NaN strength or hardness falls back to the default.
    pub fn new(radius: f32, strength: f32, hardness: f32) -> Self {
        Self {
            radius,
            strength: unit_or(strength, DEFAULT_STRENGTH),
            hardness: unit_or(hardness, DEFAULT_HARDNESS),
        }
    }

    /// Check that the radius is usable and normalize the unit-range fields.
    pub fn validated(self) -> Result<Self, ConfigError> {
        check_non_negative("radius", self.radius)?;
        Ok(Self::new(self.radius, self.strength, self.hardness))
    }
}

/// Top-level settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintSettings {
    pub raycast: RaycastConfig,
    pub brush: BrushSettings,
}

impl PaintSettings {
    /// Parse and validate settings from JSON. Missing fields use defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: PaintSettings = serde_json::from_str(json)?;
        settings.raycast.validate()?;
        Ok(Self {
            raycast: settings.raycast,
            brush: settings.brush.validated()?,
        })
    }

    /// Serialize settings to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn unit_or(value: f32, default: f32) -> f32 {
    if value.is_nan() {
        default
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue { field, value });
    }
    Ok(())
}
