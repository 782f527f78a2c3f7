//! Triangle primitive for mesh-space ray and proximity queries.
//!
//! Ray intersection uses the Moller-Trumbore algorithm with back-face culling.
//! Closest point uses the seven-region case analysis over the triangle's
//! parametric plane (interior, three edges, three vertices).

use glam::Vec3;
use skinpaint_config::DEFAULT_INTERSECT_EPSILON;

use crate::types::Ray;

/// A triangle with its vertex positions copied out of the mesh buffers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Triangle {
    /// Position of this triangle in the triangle buffer
    pub index: u32,
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
}

impl Triangle {
    pub fn new(index: u32, v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        Self { index, v1, v2, v3 }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v1, self.v2, self.v3]
    }

    /// Unit normal `normalize((v1 - v2) x (v1 - v3))`.
    ///
    /// Returns `None` for degenerate triangles.
    pub fn normal(&self) -> Option<Vec3> {
        (self.v1 - self.v2).cross(self.v1 - self.v3).try_normalize()
    }

    /// Ray intersection with the default back-face threshold.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        self.intersect_with_epsilon(ray, DEFAULT_INTERSECT_EPSILON)
    }

    /// Moller-Trumbore ray-triangle intersection.
    ///
    /// Returns the ray parameter `t` of the hit. Triangles seen from behind
    /// (determinant below `epsilon`) are never hit. Hits behind the ray
    /// origin are not rejected, so `t` may be negative.
    pub fn intersect_with_epsilon(&self, ray: &Ray, epsilon: f32) -> Option<f32> {
        let edge1 = self.v2 - self.v1;
        let edge2 = self.v3 - self.v1;

        let pvec = ray.direction.cross(edge2);
        let det = edge1.dot(pvec);

        // Back-face culling; also rejects rays parallel to the plane
        if det.is_nan() || det < epsilon {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin - self.v1;

        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(edge1);

        let v = ray.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some(edge2.dot(qvec) * inv_det)
    }

    /// Closest point on the triangle surface to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge0 = self.v2 - self.v1;
        let edge1 = self.v3 - self.v1;
        let v0 = self.v1 - point;

        let a = edge0.dot(edge0);
        let b = edge0.dot(edge1);
        let c = edge1.dot(edge1);
        let d = edge0.dot(v0);
        let e = edge1.dot(v0);

        let det = a * c - b * b;
        let mut s = b * e - c * d;
        let mut t = b * d - a * e;

        if s + t < det {
            if s < 0.0 {
                if t < 0.0 {
                    // Vertex v1 region, closest on one of the two adjacent edges
                    if d < 0.0 {
                        s = clamp01(-d / a);
                        t = 0.0;
                    } else {
                        s = 0.0;
                        t = clamp01(-e / c);
                    }
                } else {
                    s = 0.0;
                    t = clamp01(-e / c);
                }
            } else if t < 0.0 {
                s = clamp01(-d / a);
                t = 0.0;
            } else {
                let inv_det = 1.0 / det;
                s *= inv_det;
                t *= inv_det;
            }
        } else if s < 0.0 {
            let tmp0 = b + d;
            let tmp1 = c + e;
            if tmp1 > tmp0 {
                let numer = tmp1 - tmp0;
                let denom = a - 2.0 * b + c;
                s = clamp01(numer / denom);
                t = 1.0 - s;
            } else {
                s = 0.0;
                t = clamp01(-e / c);
            }
        } else if t < 0.0 {
            if a + d > b + e {
                let numer = c + e - b - d;
                let denom = a - 2.0 * b + c;
                s = clamp01(numer / denom);
                t = 1.0 - s;
            } else {
                s = clamp01(-d / a);
                t = 0.0;
            }
        } else {
            let numer = c + e - b - d;
            let denom = a - 2.0 * b + c;
            s = clamp01(numer / denom);
            t = 1.0 - s;
        }

        self.v1 + s * edge0 + t * edge1
    }

    /// Squared distance from `point` to the triangle surface.
    pub fn sqr_distance_to(&self, point: Vec3) -> f32 {
        self.closest_point(point).distance_squared(point)
    }

    /// Vertices strictly closer than `distance` to `origin`.
    pub fn vertices_within(&self, origin: Vec3, distance: f32) -> impl Iterator<Item = Vec3> {
        let sqr_distance = distance * distance;
        self.vertices()
            .into_iter()
            .filter(move |v| v.distance_squared(origin) < sqr_distance)
    }
}

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}
