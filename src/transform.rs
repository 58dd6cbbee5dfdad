//! Affine transforms and unit-cube normalization.

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::bounds::Aabb;
use crate::mesh::Mesh;

impl Mesh {
    /// Apply a 4x4 affine transform to every vertex position.
    ///
    /// Positions are multiplied as homogeneous coordinates with `w = 1`.
    /// Bounds are recomputed and the pick index, when one exists, is
    /// rebuilt. Normals are left untouched; follow a non-rotational
    /// transform with [`Mesh::recompute_normals`] to keep lighting data
    /// consistent.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            let h = matrix * Vector4::new(vertex.x, vertex.y, vertex.z, 1.0);
            *vertex = Point3::new(h.x, h.y, h.z);
        }
        self.geometry_changed(true, true);
    }

    /// Apply `v' = v * scale + translation` component-wise to every vertex.
    ///
    /// The stored bounding box corners are mapped directly instead of being
    /// recomputed; the map is monotonic per axis, so the two mapped corners
    /// still span the box. A negative scale component swaps min and max on
    /// its axis, so the corners are reordered component-wise. The pick index
    /// is rebuilt only when one exists.
    pub fn scale_and_bias(&mut self, scale: Vector3<f64>, translation: Vector3<f64>) {
        for vertex in &mut self.vertices {
            *vertex = Point3::from(vertex.coords.component_mul(&scale) + translation);
        }
        if !self.bounds.is_empty() {
            // A negative scale component swaps min and max on its axis;
            // an empty box keeps its infinite corners untouched.
            let a = Point3::from(self.bounds.min.coords.component_mul(&scale) + translation);
            let b = Point3::from(self.bounds.max.coords.component_mul(&scale) + translation);
            self.bounds = Aabb::from_points(&[a, b]);
        }
        self.geometry_changed(false, true);
    }

    /// Uniform scale and translation that fit the mesh into a unit cube
    /// centered at the origin, longest axis spanning `[-0.5, 0.5]`.
    ///
    /// An empty mesh, or one whose bounding box has no extent, yields the
    /// identity pair.
    #[must_use]
    pub fn unit_cube_scale(&self) -> (Vector3<f64>, Vector3<f64>) {
        if self.vertices.is_empty() {
            return (Vector3::repeat(1.0), Vector3::zeros());
        }
        let max_extent = self.bounds.max_extent();
        if max_extent <= 0.0 {
            return (Vector3::repeat(1.0), Vector3::zeros());
        }

        let scale = Vector3::repeat(1.0 / max_extent);
        let translation =
            -(self.bounds.max.coords + self.bounds.min.coords) / (2.0 * max_extent);
        (scale, translation)
    }

    /// Compute the unit-cube pair and apply it via [`Mesh::scale_and_bias`].
    pub fn scale_to_unit_cube(&mut self) {
        let (scale, translation) = self.unit_cube_scale();
        self.scale_and_bias(scale, translation);
    }
}
