//! # Tessera
//!
//! A polygonal half-edge mesh library for geometry processing.
//!
//! Tessera stores surface meshes in an array-based half-edge structure:
//! every adjacency query is O(1) or proportional to the neighborhood being
//! walked, elements carry status flags and arbitrary named attributes, and
//! deletion is deferred so bulk edits stay cheap until a single garbage
//! collection pass compacts the arrays.
//!
//! ## Features
//!
//! - **Half-edge connectivity kernel**: type-safe handles, O(1) twin and
//!   boundary queries, polygonal or triangle-only meshes
//! - **Soft deletion**: delete vertices, edges and faces in any order, then
//!   compact once with [`PolyMesh::garbage_collection`](mesh::PolyMesh)
//! - **Named properties**: attach values of any type to any element kind,
//!   kept in lockstep with the mesh through growth and compaction
//! - **Edge collapse**: manifold-safe collapse primitive plus QEM
//!   decimation built on top of it
//! - **OBJ I/O**: positions, normals, texture coordinates and per-face
//!   color materials
//!
//! ## Quick Start
//!
//! ```no_run
//! use tessera::prelude::*;
//!
//! // Load a mesh
//! let mesh = tessera::io::load("model.obj").unwrap();
//!
//! // Query mesh properties
//! println!("Vertices: {}", mesh.num_vertices());
//! println!("Faces: {}", mesh.num_faces());
//!
//! // Iterate over faces
//! for f in mesh.faces() {
//!     let normal = mesh.face_normal(f);
//!     let area = mesh.face_area(f);
//!     println!("Face {:?}: normal={:?}, area={}", f, normal, area);
//! }
//!
//! // Save the mesh
//! tessera::io::save(&mesh, "output.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use tessera::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut mesh = PolyMesh::new();
//! let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let v2 = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
//! let v3 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
//!
//! mesh.add_face(&[v0, v1, v2]).unwrap();
//! mesh.add_face(&[v0, v2, v3]).unwrap();
//!
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 2);
//! assert_eq!(mesh.num_edges(), 5);
//! ```
//!
//! ## Mesh Traversal
//!
//! Circulators walk a neighborhood in half-edge order:
//!
//! ```
//! use tessera::prelude::*;
//! use nalgebra::Point3;
//!
//! # let mut mesh = PolyMesh::new();
//! # let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! # let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! # let v2 = mesh.add_vertex(Point3::new(0.5, 1.0, 0.0));
//! # mesh.add_face(&[v0, v1, v2]).unwrap();
//! // Iterate over neighbors of a vertex
//! for neighbor in mesh.vertex_vertices(v0) {
//!     println!("Neighbor: {:?}", neighbor);
//! }
//!
//! // Iterate over faces around a vertex
//! for face in mesh.vertex_faces(v0) {
//!     println!("Adjacent face: {:?}", face);
//! }
//!
//! // Walk a face loop
//! for h in mesh.face_halfedges(FaceId::new(0)) {
//!     println!("{:?} -> {:?}", mesh.from_vertex(h), mesh.to_vertex(h));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        Connectivity, EdgeId, FaceId, FaceKind, HalfEdgeId, PolyMesh, Status, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let mut mesh = PolyMesh::triangular();
        let vertices: Vec<VertexId> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ]
        .into_iter()
        .map(|p| mesh.add_vertex(p))
        .collect();

        for tri in [
            [0usize, 2, 1], // bottom
            [0, 1, 3],      // front
            [1, 2, 3],      // right
            [2, 0, 3],      // left
        ] {
            mesh.add_face(&tri.map(|i| vertices[i])).unwrap();
        }

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        // 4 faces * 3 = 12 half-edges, no boundary
        assert_eq!(mesh.num_halfedges(), 12);
        assert_eq!(mesh.num_edges(), 6);
        assert!(mesh.is_valid());

        // Check that it's a closed mesh (no boundary vertices)
        for v in mesh.vertices() {
            assert!(
                !mesh.is_boundary_vertex(v),
                "vertex {:?} should not be on boundary",
                v
            );
        }
    }
}
