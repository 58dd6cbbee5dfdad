//! Indexed mesh aggregate with per-attribute index streams.

use nalgebra::{Point3, Vector2, Vector3, Vector4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bounds::Aabb;
use crate::bvh::BvhIndex;

/// How the vertex index stream groups into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrimitiveKind {
    /// Three indices per primitive; ray picking supported.
    #[default]
    Triangles,
    /// Two indices per primitive; ray picking always misses.
    Lines,
}

impl PrimitiveKind {
    /// Number of indices that make up one primitive.
    #[must_use]
    pub const fn stride(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Lines => 2,
        }
    }
}

/// An indexed triangle or line mesh.
///
/// Positions, normals, texture coordinates and colors are stored as
/// independent attribute arrays, each addressed by its own index stream;
/// every non-empty index stream must match `vertex_indices` in length.
/// The mesh maintains its own bounding box and optionally owns a
/// [`BvhIndex`] that accelerates ray picking. Mutating operations keep
/// both up to date.
///
/// # Example
///
/// ```
/// use mesh_pick::{Mesh, Point3};
///
/// let mesh = Mesh::builder()
///     .vertices(vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(2.0, 0.0, 0.0),
///         Point3::new(0.0, 2.0, 0.0),
///     ])
///     .vertex_indices(vec![0, 1, 2])
///     .build();
///
/// assert_eq!(mesh.primitive_count(), 1);
/// assert_eq!(mesh.bounds().max_extent(), 2.0);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    pub(crate) vertices: Vec<Point3<f64>>,
    pub(crate) normals: Vec<Vector3<f64>>,
    pub(crate) texcoords: Vec<Vector2<f64>>,
    pub(crate) colors: Vec<Vector4<f64>>,
    pub(crate) vertex_indices: Vec<u32>,
    pub(crate) normal_indices: Vec<u32>,
    pub(crate) texcoord_indices: Vec<u32>,
    pub(crate) color_indices: Vec<u32>,
    pub(crate) kind: PrimitiveKind,
    pub(crate) bounds: Aabb,
    pub(crate) default_color: Vector4<f64>,
    pub(crate) description: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) index: Option<BvhIndex>,
}

impl Mesh {
    /// Create an empty triangle mesh.
    #[must_use]
    pub fn new() -> Self {
        MeshBuilder::default().build()
    }

    /// Start building a mesh from raw attribute and index streams.
    #[must_use]
    pub fn builder() -> MeshBuilder {
        MeshBuilder::default()
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Per-vertex normals; empty when the mesh carries none.
    #[must_use]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Texture coordinates; empty when the mesh carries none.
    #[must_use]
    pub fn texcoords(&self) -> &[Vector2<f64>] {
        &self.texcoords
    }

    /// Vertex colors; empty when the mesh carries none.
    #[must_use]
    pub fn colors(&self) -> &[Vector4<f64>] {
        &self.colors
    }

    /// Index stream into [`Mesh::vertices`].
    #[must_use]
    pub fn vertex_indices(&self) -> &[u32] {
        &self.vertex_indices
    }

    /// Index stream into [`Mesh::normals`].
    #[must_use]
    pub fn normal_indices(&self) -> &[u32] {
        &self.normal_indices
    }

    /// Index stream into [`Mesh::texcoords`].
    #[must_use]
    pub fn texcoord_indices(&self) -> &[u32] {
        &self.texcoord_indices
    }

    /// Index stream into [`Mesh::colors`].
    #[must_use]
    pub fn color_indices(&self) -> &[u32] {
        &self.color_indices
    }

    /// How indices group into primitives.
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Current bounding box; empty when the mesh has no vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Fallback color for callers of meshes without a color stream.
    ///
    /// Picking does not consult it; hits on color-less meshes report a
    /// zero color.
    #[must_use]
    pub fn default_color(&self) -> Vector4<f64> {
        self.default_color
    }

    /// Replace the fallback color.
    pub fn set_default_color(&mut self, color: Vector4<f64>) {
        self.default_color = color;
    }

    /// Free-text label with no semantic effect.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the free-text label.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// The pick index, when one has been built.
    #[must_use]
    pub fn index(&self) -> Option<&BvhIndex> {
        self.index.as_ref()
    }

    /// Number of whole primitives in the vertex index stream.
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.vertex_indices.len() / self.kind.stride()
    }

    /// `true` when the mesh has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Recompute the bounding box from the current vertex positions.
    ///
    /// Mutating operations do this on their own; the call is only needed
    /// after constructing a mesh through other means.
    pub fn recompute_bounds(&mut self) {
        self.bounds = Aabb::from_points(&self.vertices);
    }

    /// Replace the normal stream with smooth per-vertex normals.
    ///
    /// Face normals (the cross product of two triangle edges, left
    /// un-normalized so larger triangles weigh more) are accumulated into
    /// each corner vertex, then every non-zero sum is normalized. A vertex
    /// referenced by no triangle, or whose face normals cancel exactly,
    /// keeps a zero normal. Afterwards the normal index stream equals the
    /// vertex index stream. Does nothing for line meshes.
    pub fn recompute_normals(&mut self) {
        if self.kind != PrimitiveKind::Triangles {
            return;
        }

        self.normals = vec![Vector3::zeros(); self.vertices.len()];
        for tri in self.vertex_indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let edge1 = self.vertices[b] - self.vertices[a];
            let edge2 = self.vertices[c] - self.vertices[a];
            let face_normal = edge1.cross(&edge2);
            self.normals[a] += face_normal;
            self.normals[b] += face_normal;
            self.normals[c] += face_normal;
        }
        for normal in &mut self.normals {
            if normal.norm_squared() > 0.0 {
                normal.normalize_mut();
            }
        }
        self.normal_indices = self.vertex_indices.clone();

        debug!(
            vertices = self.vertices.len(),
            triangles = self.primitive_count(),
            "Recomputed vertex normals"
        );
    }

    /// Build (or rebuild) the pick index over the current triangles.
    ///
    /// Line meshes have no triangles to index; for them the call clears
    /// any existing index instead.
    pub fn rebuild_index(&mut self) {
        if self.kind == PrimitiveKind::Triangles {
            self.index = Some(BvhIndex::build(&self.vertices, &self.vertex_indices));
        } else {
            self.index = None;
        }
    }

    /// Invalidation hook every geometry mutation funnels through.
    ///
    /// The index is rebuilt only when one exists; meshes that never pick
    /// pay no rebuild cost.
    pub(crate) fn geometry_changed(&mut self, update_bounds: bool, rebuild_index: bool) {
        if update_bounds {
            self.recompute_bounds();
        }
        if rebuild_index && self.index.is_some() {
            self.rebuild_index();
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Mesh`].
///
/// All streams default to empty, the kind to [`PrimitiveKind::Triangles`],
/// the fallback color to opaque white. Streams are taken as-is: call
/// [`Mesh::validate`] before trusting ray queries on untrusted data.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    vertices: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
    texcoords: Vec<Vector2<f64>>,
    colors: Vec<Vector4<f64>>,
    vertex_indices: Vec<u32>,
    normal_indices: Vec<u32>,
    texcoord_indices: Vec<u32>,
    color_indices: Vec<u32>,
    kind: PrimitiveKind,
    default_color: Vector4<f64>,
    description: String,
    build_index: bool,
    scale_to_unit_cube: bool,
}

impl MeshBuilder {
    /// Set the vertex positions.
    #[must_use]
    pub fn vertices(mut self, vertices: Vec<Point3<f64>>) -> Self {
        self.vertices = vertices;
        self
    }

    /// Set the normal attribute array.
    #[must_use]
    pub fn normals(mut self, normals: Vec<Vector3<f64>>) -> Self {
        self.normals = normals;
        self
    }

    /// Set the texture coordinate attribute array.
    #[must_use]
    pub fn texcoords(mut self, texcoords: Vec<Vector2<f64>>) -> Self {
        self.texcoords = texcoords;
        self
    }

    /// Set the color attribute array.
    #[must_use]
    pub fn colors(mut self, colors: Vec<Vector4<f64>>) -> Self {
        self.colors = colors;
        self
    }

    /// Set the index stream into the vertex positions.
    #[must_use]
    pub fn vertex_indices(mut self, indices: Vec<u32>) -> Self {
        self.vertex_indices = indices;
        self
    }

    /// Set the index stream into the normals.
    #[must_use]
    pub fn normal_indices(mut self, indices: Vec<u32>) -> Self {
        self.normal_indices = indices;
        self
    }

    /// Set the index stream into the texture coordinates.
    #[must_use]
    pub fn texcoord_indices(mut self, indices: Vec<u32>) -> Self {
        self.texcoord_indices = indices;
        self
    }

    /// Set the index stream into the colors.
    #[must_use]
    pub fn color_indices(mut self, indices: Vec<u32>) -> Self {
        self.color_indices = indices;
        self
    }

    /// Set the primitive kind.
    #[must_use]
    pub fn kind(mut self, kind: PrimitiveKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the fallback color.
    #[must_use]
    pub fn default_color(mut self, color: Vector4<f64>) -> Self {
        self.default_color = color;
        self
    }

    /// Set the free-text label.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Build the pick index as part of construction.
    #[must_use]
    pub fn build_index(mut self, build: bool) -> Self {
        self.build_index = build;
        self
    }

    /// Normalize the mesh into a centered unit cube as part of construction.
    #[must_use]
    pub fn scale_to_unit_cube(mut self, scale: bool) -> Self {
        self.scale_to_unit_cube = scale;
        self
    }

    /// Finish construction.
    ///
    /// Bounds are always computed; unit-cube normalization and the pick
    /// index follow, in that order, when requested.
    #[must_use]
    pub fn build(self) -> Mesh {
        let mut mesh = Mesh {
            vertices: self.vertices,
            normals: self.normals,
            texcoords: self.texcoords,
            colors: self.colors,
            vertex_indices: self.vertex_indices,
            normal_indices: self.normal_indices,
            texcoord_indices: self.texcoord_indices,
            color_indices: self.color_indices,
            kind: self.kind,
            bounds: Aabb::empty(),
            default_color: self.default_color,
            description: self.description,
            index: None,
        };
        mesh.recompute_bounds();
        if self.scale_to_unit_cube {
            mesh.scale_to_unit_cube();
        }
        if self.build_index {
            mesh.rebuild_index();
        }
        mesh
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            colors: Vec::new(),
            vertex_indices: Vec::new(),
            normal_indices: Vec::new(),
            texcoord_indices: Vec::new(),
            color_indices: Vec::new(),
            kind: PrimitiveKind::Triangles,
            default_color: Vector4::new(1.0, 1.0, 1.0, 1.0),
            description: String::from("Generic Triangle Mesh"),
            build_index: false,
            scale_to_unit_cube: false,
        }
    }
}
