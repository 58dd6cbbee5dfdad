//! Indexed triangle/line meshes with BVH-accelerated ray picking.
//!
//! This crate provides a mesh container built for interactive picking and
//! geometry queries:
//!
//! - [`Mesh`] - triangle or line mesh whose normal, texture coordinate and
//!   color attributes each carry their own index stream
//! - [`MeshBuilder`] - construction from raw attribute/index streams, with
//!   optional unit-cube normalization and spatial-index build
//! - [`Aabb`] - axis-aligned bounding box with a slab ray test
//! - [`BvhIndex`] - bounding volume hierarchy answering nearest-hit queries
//!   in better than linear time
//! - [`Ray`] and [`RayHit`] - query input and the interpolated hit attributes
//!
//! Every mutation that moves vertices keeps the bounding volume current and
//! rebuilds the spatial index when one is present, so a mesh can never be
//! queried through a stale index.
//!
//! # Example
//!
//! ```
//! use mesh_pick::{Mesh, Point3, Ray, Vector3};
//!
//! let mesh = Mesh::builder()
//!     .vertices(vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(2.0, 0.0, 0.0),
//!         Point3::new(0.0, 2.0, 0.0),
//!     ])
//!     .vertex_indices(vec![0, 1, 2])
//!     .build_index(true)
//!     .build();
//!
//! let ray = Ray::new(Point3::new(0.5, 0.5, 3.0), Vector3::new(0.0, 0.0, -1.0));
//! let hit = mesh.intersect(&ray, 0.0, f64::INFINITY).unwrap();
//!
//! assert!((hit.t - 3.0).abs() < 1e-12);
//! assert_eq!(mesh.primitive_count(), 1);
//! ```
//!
//! # Validation
//!
//! Construction and mutation never inspect index values; meshes assembled
//! from untrusted streams should be checked with [`Mesh::check`] or
//! [`Mesh::validate`] before picking, since an out-of-range index panics
//! inside the query paths.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bounds;
mod bvh;
mod error;
mod mesh;
mod pick;
mod ray;
mod transform;
mod validate;

pub use bounds::Aabb;
pub use bvh::{BvhIndex, BvhStats};
pub use error::{MeshError, MeshResult};
pub use mesh::{Mesh, MeshBuilder, PrimitiveKind};
pub use pick::ray_triangle_intersect;
pub use ray::{Ray, RayHit};

// Re-export the nalgebra types used throughout the public API.
pub use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
