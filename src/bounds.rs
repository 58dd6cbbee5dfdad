//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box defined by its minimum and maximum corners.
///
/// An empty box has `min` at positive infinity and `max` at negative
/// infinity, so that expanding it by any point yields that point's box.
///
/// # Example
///
/// ```
/// use mesh_pick::{Aabb, Point3};
///
/// let aabb = Aabb::from_points(&[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 1.0, 0.5),
/// ]);
/// assert_eq!(aabb.max_extent(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create a bounding box from explicit corners.
    #[must_use]
    pub const fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Create an empty bounding box.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Compute the bounding box of a set of points.
    ///
    /// An empty slice yields an empty box.
    #[must_use]
    pub fn from_points(points: &[Point3<f64>]) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to_include(*point);
        }
        aabb
    }

    /// Check if the bounding box contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Size along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Center point of the bounding box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        self.min + self.size() * 0.5
    }

    /// Largest extent across the three axes.
    #[must_use]
    pub fn max_extent(&self) -> f64 {
        self.size().max()
    }

    /// Check if a point lies inside the box (boundary included).
    #[must_use]
    pub fn contains(&self, point: Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Grow the box to include a point.
    pub fn expand_to_include(&mut self, point: Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Slab test against a ray given as origin and inverse direction.
    ///
    /// Each axis picks the entry corner by the sign of the inverse direction
    /// component. Returns the parametric `(near, far)` interval, or `None`
    /// when the intervals separate or the box lies entirely behind the
    /// origin (`far <= 0`).
    #[must_use]
    pub fn intersect_ray(&self, origin: Point3<f64>, inv_dir: Vector3<f64>) -> Option<(f64, f64)> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        for axis in 0..3 {
            let (entry, exit) = if inv_dir[axis] < 0.0 {
                (self.max[axis], self.min[axis])
            } else {
                (self.min[axis], self.max[axis])
            };
            let t0 = (entry - origin[axis]) * inv_dir[axis];
            let t1 = (exit - origin[axis]) * inv_dir[axis];

            if t0 > t_far || t_near > t1 {
                return None;
            }
            if t0 > t_near {
                t_near = t0;
            }
            if t1 < t_far {
                t_far = t1;
            }
        }

        if t_far > 0.0 {
            Some((t_near, t_far))
        } else {
            None
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
