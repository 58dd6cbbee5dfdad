//! Rays and pick results.

use nalgebra::{Point3, Vector2, Vector3, Vector4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A ray defined by an origin and a direction.
///
/// The direction need not be normalized; parametric distances along the ray
/// are measured in units of its length. Use [`Ray::normalized`] when hit
/// distances should be world-space distances.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Starting point of the ray.
    pub origin: Point3<f64>,
    /// Direction the ray travels in.
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Create a new ray.
    #[must_use]
    pub const fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Point at parametric distance `t` along the ray.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// The same ray with a unit-length direction.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            origin: self.origin,
            direction: self.direction.normalize(),
        }
    }
}

/// A ray-mesh intersection with interpolated surface attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Parametric distance along the ray.
    pub t: f64,
    /// Hit position, `origin + direction * t`.
    pub point: Point3<f64>,
    /// Surface normal at the hit, unit length for non-degenerate geometry
    /// and flipped to face the incoming ray.
    pub normal: Vector3<f64>,
    /// Interpolated texture coordinate; `(0, 0)` without a texcoord stream.
    pub texcoord: Vector2<f64>,
    /// Interpolated vertex color; zero without a color stream.
    pub color: Vector4<f64>,
}
