//! Ray picking: the per-triangle test, attribute interpolation, and the
//! dispatch between the pick index and the brute-force scan.

use nalgebra::{Point3, Vector2, Vector3, Vector4};

use crate::mesh::{Mesh, PrimitiveKind};
use crate::ray::{Ray, RayHit};

/// Determinants smaller than this reject the triangle as parallel.
const DET_EPSILON: f64 = 1e-8;

/// Möller–Trumbore ray-triangle test.
///
/// Returns the ray parameter and barycentric coordinates `(t, u, v)` of
/// the intersection, where `u` weights `v1` and `v` weights `v2`. `None`
/// when the ray is (near-)parallel to the triangle plane, the intersection
/// lies outside the triangle, or behind the origin.
#[must_use]
pub fn ray_triangle_intersect(
    origin: Point3<f64>,
    direction: Vector3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Option<(f64, f64, f64)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let p = direction.cross(&edge2);
    let det = edge1.dot(&p);

    // Ray lies in the plane of the triangle
    if det.abs() < DET_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - v0;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(&q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some((t, u, v))
}

impl Mesh {
    /// Nearest ray hit strictly inside `(t_min, t_max)`.
    ///
    /// Line meshes never intersect. When a pick index is present it
    /// answers the query; otherwise every triangle is tested in turn.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_pick::{Mesh, Point3, Ray, Vector3};
    ///
    /// let mesh = Mesh::builder()
    ///     .vertices(vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ])
    ///     .vertex_indices(vec![0, 1, 2])
    ///     .build();
    ///
    /// let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));
    /// let hit = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
    /// assert!((hit.t - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn intersect(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<RayHit> {
        if self.kind != PrimitiveKind::Triangles {
            return None;
        }
        if let Some(index) = &self.index {
            return index.query(self, ray, t_min, t_max);
        }

        let inv_dir = ray.direction.map(|c| 1.0 / c);
        self.bounds.intersect_ray(ray.origin, inv_dir)?;

        let mut best: Option<(f64, f64, f64, usize)> = None;
        for triangle in 0..self.primitive_count() {
            let upper = best.map_or(t_max, |(t, ..)| t);
            if let Some((t, u, v)) = self.intersect_triangle(triangle, ray, t_min, upper) {
                best = Some((t, u, v, triangle));
            }
        }
        best.map(|(t, u, v, triangle)| self.triangle_hit(triangle, ray, t, u, v))
    }

    /// Test one triangle, keeping only hits strictly inside `(t_min, t_max)`.
    pub(crate) fn intersect_triangle(
        &self,
        triangle: usize,
        ray: &Ray,
        t_min: f64,
        t_max: f64,
    ) -> Option<(f64, f64, f64)> {
        let i = triangle * 3;
        let v0 = self.vertices[self.vertex_indices[i] as usize];
        let v1 = self.vertices[self.vertex_indices[i + 1] as usize];
        let v2 = self.vertices[self.vertex_indices[i + 2] as usize];

        let (t, u, v) = ray_triangle_intersect(ray.origin, ray.direction, v0, v1, v2)?;
        if t <= t_min || t >= t_max {
            return None;
        }
        Some((t, u, v))
    }

    /// Materialize a hit on `triangle` with interpolated attributes.
    pub(crate) fn triangle_hit(&self, triangle: usize, ray: &Ray, t: f64, u: f64, v: f64) -> RayHit {
        let i = triangle * 3;
        let w = 1.0 - u - v;

        let raw_normal = if self.normal_indices.is_empty() {
            // No normal stream: fall back to the face normal.
            let v0 = self.vertices[self.vertex_indices[i] as usize];
            let v1 = self.vertices[self.vertex_indices[i + 1] as usize];
            let v2 = self.vertices[self.vertex_indices[i + 2] as usize];
            (v1 - v0).cross(&(v2 - v0))
        } else {
            let n0 = self.normals[self.normal_indices[i] as usize];
            let n1 = self.normals[self.normal_indices[i + 1] as usize];
            let n2 = self.normals[self.normal_indices[i + 2] as usize];
            n0 * w + n1 * u + n2 * v
        };
        let mut normal = if raw_normal.norm_squared() > 0.0 {
            raw_normal.normalize()
        } else {
            raw_normal
        };
        if ray.direction.dot(&normal) > 0.0 {
            normal = -normal;
        }

        let texcoord = if self.texcoord_indices.is_empty() {
            Vector2::zeros()
        } else {
            let tc0 = self.texcoords[self.texcoord_indices[i] as usize];
            let tc1 = self.texcoords[self.texcoord_indices[i + 1] as usize];
            let tc2 = self.texcoords[self.texcoord_indices[i + 2] as usize];
            tc0 * w + tc1 * u + tc2 * v
        };

        let color = if self.color_indices.is_empty() {
            Vector4::zeros()
        } else {
            let c0 = self.colors[self.color_indices[i] as usize];
            let c1 = self.colors[self.color_indices[i + 1] as usize];
            let c2 = self.colors[self.color_indices[i + 2] as usize];
            c0 * w + c1 * u + c2 * v
        };

        RayHit {
            t,
            point: ray.point_at(t),
            normal,
            texcoord,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    fn triangle_mesh() -> Mesh {
        let (v0, v1, v2) = unit_triangle();
        Mesh::builder()
            .vertices(vec![v0, v1, v2])
            .vertex_indices(vec![0, 1, 2])
            .build()
    }

    #[test]
    fn ray_hits_triangle_with_barycentrics() {
        let (v0, v1, v2) = unit_triangle();
        let origin = Point3::new(0.25, 0.25, 1.0);
        let direction = Vector3::new(0.0, 0.0, -1.0);

        let (t, u, v) = ray_triangle_intersect(origin, direction, v0, v1, v2).unwrap();
        assert_relative_eq!(t, 1.0, epsilon = 1e-12);
        assert_relative_eq!(u, 0.25, epsilon = 1e-12);
        assert_relative_eq!(v, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn ray_misses_outside_barycentric_bounds() {
        let (v0, v1, v2) = unit_triangle();
        let origin = Point3::new(10.0, 10.0, 1.0);
        let direction = Vector3::new(0.0, 0.0, -1.0);

        assert!(ray_triangle_intersect(origin, direction, v0, v1, v2).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let (v0, v1, v2) = unit_triangle();
        let origin = Point3::new(0.25, 0.25, 1.0);
        let direction = Vector3::new(1.0, 0.0, 0.0);

        assert!(ray_triangle_intersect(origin, direction, v0, v1, v2).is_none());
    }

    #[test]
    fn triangle_behind_origin_misses() {
        let (v0, v1, v2) = unit_triangle();
        let origin = Point3::new(0.25, 0.25, 1.0);
        let direction = Vector3::new(0.0, 0.0, 1.0);

        assert!(ray_triangle_intersect(origin, direction, v0, v1, v2).is_none());
    }

    #[test]
    fn degenerate_triangle_misses() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let origin = Point3::new(1.0, 1.0, 5.0);
        let direction = Vector3::new(0.0, 0.0, -1.0);

        assert!(ray_triangle_intersect(origin, direction, p, p, p).is_none());
    }

    #[test]
    fn intersect_reports_distance_and_facing_normal() {
        let mesh = triangle_mesh();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));

        let hit = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
        assert_relative_eq!(hit.t, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.normal.x, 0.0);
        assert_relative_eq!(hit.normal.y, 0.0);
        assert_relative_eq!(hit.normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-12);
        // No texcoord or color streams.
        assert_eq!(hit.texcoord, Vector2::zeros());
        assert_eq!(hit.color, Vector4::zeros());
    }

    #[test]
    fn intersect_misses_outside_triangle() {
        let mesh = triangle_mesh();
        let ray = Ray::new(Point3::new(10.0, 10.0, 1.0), Vector3::new(0.0, 0.0, -1.0));

        assert!(mesh.intersect(&ray, 0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn intersect_respects_the_open_interval() {
        let mesh = triangle_mesh();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));

        assert!(mesh.intersect(&ray, 0.0, 1.0).is_none());
        assert!(mesh.intersect(&ray, 1.0, 2.0).is_none());
        assert!(mesh.intersect(&ray, 0.0, 1.0 + 1e-9).is_some());
        assert!(mesh.intersect(&ray, 1.0 - 1e-9, 2.0).is_some());
    }

    #[test]
    fn line_meshes_never_intersect() {
        let mesh = Mesh::builder()
            .vertices(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ])
            .vertex_indices(vec![0, 1, 1, 2])
            .kind(PrimitiveKind::Lines)
            .build();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));

        assert!(mesh.intersect(&ray, 0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn nearest_of_two_triangles_wins() {
        // Two parallel triangles; the ray meets z = 5 first, then z = 2.
        let mesh = Mesh::builder()
            .vertices(vec![
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(1.0, 0.0, 5.0),
                Point3::new(0.0, 1.0, 5.0),
                Point3::new(0.0, 0.0, 2.0),
                Point3::new(1.0, 0.0, 2.0),
                Point3::new(0.0, 1.0, 2.0),
            ])
            .vertex_indices(vec![0, 1, 2, 3, 4, 5])
            .build();
        let ray = Ray::new(Point3::new(0.25, 0.25, 10.0), Vector3::new(0.0, 0.0, -1.0));

        let hit = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
        assert_relative_eq!(hit.t, 5.0, epsilon = 1e-12);

        // Clipping the nearer triangle away exposes the farther one.
        let hit = mesh.intersect(&ray, 5.5, f64::INFINITY).unwrap();
        assert_relative_eq!(hit.t, 8.0, epsilon = 1e-12);
    }

    #[test]
    fn stored_normals_interpolate_and_flip_toward_the_ray() {
        let (v0, v1, v2) = unit_triangle();
        // Normals point away from the incoming ray and must be flipped.
        let mesh = Mesh::builder()
            .vertices(vec![v0, v1, v2])
            .normals(vec![Vector3::new(0.0, 0.0, -1.0); 3])
            .vertex_indices(vec![0, 1, 2])
            .normal_indices(vec![0, 1, 2])
            .build();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));

        let hit = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
        assert_relative_eq!(hit.normal.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn distinct_corner_normals_blend_by_barycentrics() {
        let (v0, v1, v2) = unit_triangle();
        let mesh = Mesh::builder()
            .vertices(vec![v0, v1, v2])
            .normals(vec![
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ])
            .vertex_indices(vec![0, 1, 2])
            .normal_indices(vec![0, 1, 2])
            .build();
        // Hits at u = v = 0.25, so the blend is (0.25, 0.25, 0.5) normalized.
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));

        let hit = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
        let expected = Vector3::new(0.25, 0.25, 0.5).normalize();
        assert_relative_eq!(hit.normal.x, expected.x, epsilon = 1e-12);
        assert_relative_eq!(hit.normal.y, expected.y, epsilon = 1e-12);
        assert_relative_eq!(hit.normal.z, expected.z, epsilon = 1e-12);
    }

    #[test]
    fn texcoords_and_colors_interpolate() {
        let (v0, v1, v2) = unit_triangle();
        let mesh = Mesh::builder()
            .vertices(vec![v0, v1, v2])
            .texcoords(vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(0.0, 1.0),
            ])
            .colors(vec![
                Vector4::new(1.0, 0.0, 0.0, 1.0),
                Vector4::new(0.0, 1.0, 0.0, 1.0),
                Vector4::new(0.0, 0.0, 1.0, 1.0),
            ])
            .vertex_indices(vec![0, 1, 2])
            .texcoord_indices(vec![0, 1, 2])
            .color_indices(vec![0, 1, 2])
            .build();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));

        let hit = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
        assert_relative_eq!(hit.texcoord.x, 0.25, epsilon = 1e-12);
        assert_relative_eq!(hit.texcoord.y, 0.25, epsilon = 1e-12);
        assert_relative_eq!(hit.color.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.color.y, 0.25, epsilon = 1e-12);
        assert_relative_eq!(hit.color.z, 0.25, epsilon = 1e-12);
        assert_relative_eq!(hit.color.w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn indexed_and_brute_force_agree_on_a_simple_mesh() {
        let mut mesh = Mesh::builder()
            .vertices(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 3.0),
                Point3::new(1.0, 0.0, 3.0),
                Point3::new(0.0, 1.0, 3.0),
            ])
            .vertex_indices(vec![0, 1, 2, 3, 4, 5])
            .build();
        let ray = Ray::new(Point3::new(0.25, 0.25, 10.0), Vector3::new(0.0, 0.0, -1.0));

        let brute = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
        mesh.rebuild_index();
        let indexed = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();

        assert_relative_eq!(brute.t, indexed.t, epsilon = 1e-12);
        assert_relative_eq!(brute.normal.z, indexed.normal.z, epsilon = 1e-12);
    }
}
