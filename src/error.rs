//! Error types for tessera.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

use crate::mesh::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A handle references an element outside the current arrays.
    #[error("invalid handle: index {index} out of bounds for {kind} array of length {len}")]
    InvalidHandle {
        /// The element kind ("vertex", "halfedge", "edge", "face").
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// The current array length.
        len: usize,
    },

    /// A property access went past the end of the store.
    #[error("property access out of range: index {index}, store length {len}")]
    OutOfRange {
        /// The accessed index.
        index: usize,
        /// The store length.
        len: usize,
    },

    /// No property with the given name is registered.
    #[error("no property named {name:?}")]
    PropertyNotFound {
        /// The requested property name.
        name: String,
    },

    /// A property exists under this name but holds a different value type.
    #[error("property {name:?} holds a different value type")]
    PropertyTypeMismatch {
        /// The requested property name.
        name: String,
    },

    /// A face was given with fewer than three vertices or a repeated vertex.
    #[error("degenerate face: vertex sequence is not a simple polygon")]
    DegenerateFace,

    /// A face has the wrong number of vertices for a triangle-only mesh.
    #[error("face arity {arity} not allowed by this mesh kind")]
    InvalidArity {
        /// The offending vertex count.
        arity: usize,
    },

    /// Adding the face would give an edge more than two incident faces.
    #[error("non-manifold edge: halfedge {0:?} already has an incident face")]
    NonManifoldEdge(HalfEdgeId),

    /// Adding the face would make a vertex's neighborhood non-disk-like.
    #[error("complex vertex: {0:?} would lose its disk-like neighborhood")]
    ComplexVertex(VertexId),

    /// The collapse would violate the link condition.
    #[error("illegal collapse of halfedge {0:?}")]
    IllegalCollapse(HalfEdgeId),

    /// The vertex was already marked deleted.
    #[error("vertex {0:?} is already deleted")]
    DeletedVertex(VertexId),

    /// The face was already marked deleted.
    #[error("face {0:?} is already deleted")]
    DeletedFace(FaceId),

    /// The edge was already marked deleted.
    #[error("edge {0:?} is already deleted")]
    DeletedEdge(EdgeId),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A writer option the format cannot honor.
    #[error("option {option} is not supported by the {format} format")]
    UnsupportedOption {
        /// The rejected option.
        option: &'static str,
        /// The format that rejected it.
        format: &'static str,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}
