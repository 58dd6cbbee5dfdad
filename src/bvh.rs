//! Bounding volume hierarchy over a mesh's triangles.
//!
//! Nodes live in a flat arena and reference their children by arena index,
//! so the tree carries no owning pointers. Leaves keep up to [`LEAF_SIZE`]
//! triangle ids inline.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use tracing::debug;

use crate::bounds::Aabb;
use crate::mesh::Mesh;
use crate::ray::{Ray, RayHit};

/// Maximum number of triangles per leaf node.
const LEAF_SIZE: usize = 8;

/// Arena node: a leaf holding triangle ids or an internal node with
/// two children.
#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        triangles: SmallVec<[u32; LEAF_SIZE]>,
    },
    Internal {
        bounds: Aabb,
        left: u32,
        right: u32,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            Self::Leaf { bounds, .. } | Self::Internal { bounds, .. } => bounds,
        }
    }
}

/// Spatial index over a mesh's triangles for nearest-hit ray queries.
///
/// The index is owned by the [`Mesh`] it was built from and holds no
/// geometry of its own; any mutation of the mesh invalidates it. See
/// [`Mesh::rebuild_index`].
#[derive(Debug, Clone)]
pub struct BvhIndex {
    /// Arena of nodes; children are pushed before their parent, so the
    /// root is always the last node.
    nodes: Vec<BvhNode>,
    root: u32,
    triangle_count: usize,
}

impl BvhIndex {
    /// Build an index over the triangles described by `vertex_indices`.
    pub(crate) fn build(vertices: &[Point3<f64>], vertex_indices: &[u32]) -> Self {
        let start = std::time::Instant::now();
        let triangle_count = vertex_indices.len() / 3;
        let mut triangle_bounds = Vec::with_capacity(triangle_count);
        let mut centroids = Vec::with_capacity(triangle_count);
        for triangle in 0..triangle_count {
            let i = triangle * 3;
            let bounds = Aabb::from_points(&[
                vertices[vertex_indices[i] as usize],
                vertices[vertex_indices[i + 1] as usize],
                vertices[vertex_indices[i + 2] as usize],
            ]);
            centroids.push(bounds.center());
            triangle_bounds.push(bounds);
        }

        let mut ids: Vec<u32> = (0..triangle_count as u32).collect();
        let mut nodes = Vec::new();
        let root = build_node(&mut nodes, &mut ids, &triangle_bounds, &centroids);
        debug!(
            triangles = triangle_count,
            nodes = nodes.len(),
            time_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Built pick index"
        );

        Self {
            nodes,
            root,
            triangle_count,
        }
    }

    /// Nearest hit strictly inside `(t_min, t_max)`.
    ///
    /// Attribute interpolation matches the brute-force scan; the index
    /// only changes which triangles get tested.
    pub(crate) fn query(&self, mesh: &Mesh, ray: &Ray, t_min: f64, t_max: f64) -> Option<RayHit> {
        let inv_dir = ray.direction.map(|c| 1.0 / c);
        let root_entry = self.node_entry(self.root, ray.origin, inv_dir, t_min, t_max)?;

        let mut best: Option<(f64, f64, f64, u32)> = None;
        let mut stack: Vec<(f64, u32)> = vec![(root_entry, self.root)];
        while let Some((entry, id)) = stack.pop() {
            // The best hit may have shrunk since this node was pushed.
            if entry >= best.map_or(t_max, |(t, ..)| t) {
                continue;
            }
            match &self.nodes[id as usize] {
                BvhNode::Leaf { triangles, .. } => {
                    for &triangle in triangles {
                        let upper = best.map_or(t_max, |(t, ..)| t);
                        if let Some((t, u, v)) =
                            mesh.intersect_triangle(triangle as usize, ray, t_min, upper)
                        {
                            best = Some((t, u, v, triangle));
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let upper = best.map_or(t_max, |(t, ..)| t);
                    let left_entry = self.node_entry(*left, ray.origin, inv_dir, t_min, upper);
                    let right_entry = self.node_entry(*right, ray.origin, inv_dir, t_min, upper);
                    // Push the farther child first so the nearer pops first.
                    match (left_entry, right_entry) {
                        (Some(lt), Some(rt)) if lt <= rt => {
                            stack.push((rt, *right));
                            stack.push((lt, *left));
                        }
                        (Some(lt), Some(rt)) => {
                            stack.push((lt, *left));
                            stack.push((rt, *right));
                        }
                        (Some(lt), None) => stack.push((lt, *left)),
                        (None, Some(rt)) => stack.push((rt, *right)),
                        (None, None) => {}
                    }
                }
            }
        }

        best.map(|(t, u, v, triangle)| mesh.triangle_hit(triangle as usize, ray, t, u, v))
    }

    /// Parametric entry distance into a node's bounds, or `None` when the
    /// node cannot contain a hit inside `(t_min, t_max)`.
    fn node_entry(
        &self,
        node: u32,
        origin: Point3<f64>,
        inv_dir: Vector3<f64>,
        t_min: f64,
        t_max: f64,
    ) -> Option<f64> {
        let (t_near, t_far) = self.nodes[node as usize]
            .bounds()
            .intersect_ray(origin, inv_dir)?;
        if t_far <= t_min || t_near >= t_max {
            return None;
        }
        Some(t_near)
    }

    /// Total number of triangles indexed.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Check if the index covers no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangle_count == 0
    }

    /// Get statistics about the index structure.
    #[must_use]
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        self.collect_stats(self.root, 0, &mut stats);
        stats
    }

    fn collect_stats(&self, node: u32, depth: usize, stats: &mut BvhStats) {
        stats.max_depth = stats.max_depth.max(depth);

        match &self.nodes[node as usize] {
            BvhNode::Leaf { triangles, .. } => {
                stats.leaf_count += 1;
                stats.total_triangles_in_leaves += triangles.len();
                stats.max_leaf_size = stats.max_leaf_size.max(triangles.len());
            }
            BvhNode::Internal { left, right, .. } => {
                stats.internal_count += 1;
                self.collect_stats(*left, depth + 1, stats);
                self.collect_stats(*right, depth + 1, stats);
            }
        }
    }
}

/// Recursively partition `ids`, pushing children before their parent.
/// Returns the arena index of the node built for this slice.
fn build_node(
    nodes: &mut Vec<BvhNode>,
    ids: &mut [u32],
    triangle_bounds: &[Aabb],
    centroids: &[Point3<f64>],
) -> u32 {
    let mut bounds = Aabb::empty();
    for &id in ids.iter() {
        bounds = bounds.union(&triangle_bounds[id as usize]);
    }

    if ids.len() <= LEAF_SIZE {
        nodes.push(BvhNode::Leaf {
            bounds,
            triangles: SmallVec::from_slice(ids),
        });
        return (nodes.len() - 1) as u32;
    }

    // Median split along the widest centroid axis.
    let mut centroid_bounds = Aabb::empty();
    for &id in ids.iter() {
        centroid_bounds.expand_to_include(centroids[id as usize]);
    }
    let extent = centroid_bounds.size();
    let axis = if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    };
    ids.sort_unstable_by(|a, b| {
        centroids[*a as usize][axis].total_cmp(&centroids[*b as usize][axis])
    });

    let mid = ids.len() / 2;
    let (left_ids, right_ids) = ids.split_at_mut(mid);
    let left = build_node(nodes, left_ids, triangle_bounds, centroids);
    let right = build_node(nodes, right_ids, triangle_bounds, centroids);
    nodes.push(BvhNode::Internal {
        bounds,
        left,
        right,
    });
    (nodes.len() - 1) as u32
}

/// Statistics about the index structure.
#[derive(Debug, Default, Clone)]
pub struct BvhStats {
    /// Number of internal (branch) nodes.
    pub internal_count: usize,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Maximum depth of the tree.
    pub max_depth: usize,
    /// Maximum number of triangles in any leaf.
    pub max_leaf_size: usize,
    /// Total triangles stored across all leaves.
    pub total_triangles_in_leaves: usize,
}
