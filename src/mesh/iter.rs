//! Linear iteration over mesh elements.
//!
//! These iterators walk the element arrays in index order. The default
//! constructors skip soft-deleted elements, so a loop between mutation and
//! garbage collection only sees live elements; the `all_*` variants expose
//! the raw arrays including deleted slots.
//!
//! The element count is captured at construction. Elements appended during
//! iteration are not visited.

use super::connectivity::Connectivity;
use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};

macro_rules! impl_element_iter {
    ($iter:ident, $id:ident, $status:ident) => {
        /// Linear iterator over element handles in index order.
        pub struct $iter<'a> {
            mesh: &'a Connectivity,
            range: std::ops::Range<usize>,
            include_deleted: bool,
        }

        impl<'a> $iter<'a> {
            pub(crate) fn new(mesh: &'a Connectivity, len: usize, include_deleted: bool) -> Self {
                Self {
                    mesh,
                    range: 0..len,
                    include_deleted,
                }
            }
        }

        impl Iterator for $iter<'_> {
            type Item = $id;

            fn next(&mut self) -> Option<$id> {
                for i in self.range.by_ref() {
                    let id = $id::new(i);
                    if self.include_deleted || !self.mesh.$status(id).deleted() {
                        return Some(id);
                    }
                }
                None
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                // Exact only when deleted slots are included.
                let upper = self.range.len();
                if self.include_deleted {
                    (upper, Some(upper))
                } else {
                    (0, Some(upper))
                }
            }
        }
    };
}

impl_element_iter!(VertexIter, VertexId, vertex_status);
impl_element_iter!(HalfEdgeIter, HalfEdgeId, halfedge_status);
impl_element_iter!(EdgeIter, EdgeId, edge_status);
impl_element_iter!(FaceIter, FaceId, face_status);

impl Connectivity {
    /// Iterate over all live vertices.
    pub fn vertices(&self) -> VertexIter<'_> {
        VertexIter::new(self, self.num_vertices(), false)
    }

    /// Iterate over all vertices, including soft-deleted ones.
    pub fn all_vertices(&self) -> VertexIter<'_> {
        VertexIter::new(self, self.num_vertices(), true)
    }

    /// Iterate over all live half-edges.
    pub fn halfedges(&self) -> HalfEdgeIter<'_> {
        HalfEdgeIter::new(self, self.num_halfedges(), false)
    }

    /// Iterate over all half-edges, including soft-deleted ones.
    pub fn all_halfedges(&self) -> HalfEdgeIter<'_> {
        HalfEdgeIter::new(self, self.num_halfedges(), true)
    }

    /// Iterate over all live edges.
    pub fn edges(&self) -> EdgeIter<'_> {
        EdgeIter::new(self, self.num_edges(), false)
    }

    /// Iterate over all edges, including soft-deleted ones.
    pub fn all_edges(&self) -> EdgeIter<'_> {
        EdgeIter::new(self, self.num_edges(), true)
    }

    /// Iterate over all live faces.
    pub fn faces(&self) -> FaceIter<'_> {
        FaceIter::new(self, self.num_faces(), false)
    }

    /// Iterate over all faces, including soft-deleted ones.
    pub fn all_faces(&self) -> FaceIter<'_> {
        FaceIter::new(self, self.num_faces(), true)
    }
}
