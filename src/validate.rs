//! Structural and referential integrity checks over the index streams.

use tracing::warn;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;

impl Mesh {
    /// Check the integrity of the index streams.
    ///
    /// The shallow pass verifies that every non-empty index stream matches
    /// the vertex index stream in length, and that the vertex index stream
    /// divides into whole primitives. With `deep`, every index value is
    /// additionally checked against the length of its attribute array.
    /// The first problem found is returned; nothing is repaired.
    ///
    /// Mutation and query paths never re-validate. Skipping this check on
    /// untrusted data trades safety for speed: out-of-range indices panic
    /// inside picking and normal recomputation.
    pub fn check(&self, deep: bool) -> MeshResult<()> {
        let expected = self.vertex_indices.len();
        check_len("normal_indices", self.normal_indices.len(), expected)?;
        check_len("texcoord_indices", self.texcoord_indices.len(), expected)?;
        check_len("color_indices", self.color_indices.len(), expected)?;

        let stride = self.kind.stride();
        if expected % stride != 0 {
            return Err(MeshError::PartialPrimitive {
                len: expected,
                stride,
            });
        }

        if !deep {
            return Ok(());
        }

        check_range(
            "vertex_indices",
            &self.vertex_indices,
            "vertices",
            self.vertices.len(),
        )?;
        check_range(
            "normal_indices",
            &self.normal_indices,
            "normals",
            self.normals.len(),
        )?;
        check_range(
            "texcoord_indices",
            &self.texcoord_indices,
            "texcoords",
            self.texcoords.len(),
        )?;
        check_range(
            "color_indices",
            &self.color_indices,
            "colors",
            self.colors.len(),
        )?;
        Ok(())
    }

    /// Boolean form of [`Mesh::check`].
    ///
    /// Logs the failure and returns `false` instead of the error. Loaders
    /// are expected to call this after populating a mesh from untrusted
    /// data and before enabling ray queries.
    #[must_use]
    pub fn validate(&self, deep: bool) -> bool {
        match self.check(deep) {
            Ok(()) => true,
            Err(error) => {
                warn!(error = %error, "Mesh failed validation");
                false
            }
        }
    }
}

fn check_len(stream: &'static str, actual: usize, expected: usize) -> MeshResult<()> {
    if actual != 0 && actual != expected {
        return Err(MeshError::StreamLengthMismatch {
            stream,
            actual,
            expected,
        });
    }
    Ok(())
}

fn check_range(
    stream: &'static str,
    indices: &[u32],
    array: &'static str,
    len: usize,
) -> MeshResult<()> {
    for (position, &index) in indices.iter().enumerate() {
        if index as usize >= len {
            return Err(MeshError::IndexOutOfRange {
                stream,
                position,
                index,
                array,
                len,
            });
        }
    }
    Ok(())
}
