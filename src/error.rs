//! Error types for mesh integrity checks.

use thiserror::Error;

/// Result alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Structural problems found by [`Mesh::check`](crate::Mesh::check).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A non-empty index stream differs in length from the vertex index stream.
    #[error("{stream} has {actual} entries but vertex_indices has {expected}")]
    StreamLengthMismatch {
        /// Name of the offending index stream.
        stream: &'static str,
        /// Length of the offending stream.
        actual: usize,
        /// Length of the vertex index stream.
        expected: usize,
    },

    /// The vertex index stream does not divide into whole primitives.
    #[error("vertex_indices length {len} is not a multiple of the primitive stride {stride}")]
    PartialPrimitive {
        /// Length of the vertex index stream.
        len: usize,
        /// Indices per primitive for the mesh's kind.
        stride: usize,
    },

    /// An index points past the end of its attribute array.
    #[error("{stream}[{position}] is {index} but {array} has {len} entries")]
    IndexOutOfRange {
        /// Name of the offending index stream.
        stream: &'static str,
        /// Offset of the offending entry within the stream.
        position: usize,
        /// The out-of-range index value.
        index: u32,
        /// Name of the attribute array the stream points into.
        array: &'static str,
        /// Length of that attribute array.
        len: usize,
    },
}
