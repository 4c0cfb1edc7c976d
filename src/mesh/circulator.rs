//! Circulators: ordered traversal of an element's neighborhood.
//!
//! Circulators follow the half-edge links instead of the element arrays.
//! Each one starts at the element's reference half-edge, advances by a fixed
//! rotation rule, and stops when it returns to the start. They borrow the
//! mesh immutably; to mutate the neighborhood, collect the handles first.
//!
//! The two primitive walks are around a vertex (rotate to the next outgoing
//! half-edge via `next(opposite(h))`) and around a face (follow `next`).
//! Everything else here is a projection of one of these.

use super::connectivity::Connectivity;
use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// Circulates over the outgoing half-edges of a vertex.
///
/// Yields nothing for an isolated vertex. For a boundary vertex the walk
/// starts at the boundary half-edge the kernel keeps as the vertex
/// reference, so the full fan is visited even across the boundary gap.
pub struct OutgoingHalfEdgeIter<'a> {
    mesh: &'a Connectivity,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> OutgoingHalfEdgeIter<'a> {
    pub(crate) fn new(mesh: &'a Connectivity, vertex: VertexId) -> Self {
        let start = mesh.vertex_halfedge(vertex);
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl Iterator for OutgoingHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        if self.done {
            return None;
        }
        let result = self.current;
        self.current = self.mesh.next_halfedge(self.current.opposite());
        if self.current == self.start {
            self.done = true;
        }
        Some(result)
    }
}

/// Circulates over the incoming half-edges of a vertex.
pub struct IncomingHalfEdgeIter<'a> {
    inner: OutgoingHalfEdgeIter<'a>,
}

impl<'a> IncomingHalfEdgeIter<'a> {
    pub(crate) fn new(mesh: &'a Connectivity, vertex: VertexId) -> Self {
        Self {
            inner: OutgoingHalfEdgeIter::new(mesh, vertex),
        }
    }
}

impl Iterator for IncomingHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        self.inner.next().map(HalfEdgeId::opposite)
    }
}

/// Circulates over the half-edges of a face loop.
pub struct FaceHalfEdgeIter<'a> {
    mesh: &'a Connectivity,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> FaceHalfEdgeIter<'a> {
    pub(crate) fn new(mesh: &'a Connectivity, face: FaceId) -> Self {
        let start = mesh.face_halfedge(face);
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl Iterator for FaceHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        if self.done {
            return None;
        }
        let result = self.current;
        self.current = self.mesh.next_halfedge(self.current);
        if self.current == self.start {
            self.done = true;
        }
        Some(result)
    }
}

impl Connectivity {
    /// Circulate over the outgoing half-edges of a vertex.
    pub fn outgoing_halfedges(&self, v: VertexId) -> OutgoingHalfEdgeIter<'_> {
        OutgoingHalfEdgeIter::new(self, v)
    }

    /// Circulate over the incoming half-edges of a vertex.
    pub fn incoming_halfedges(&self, v: VertexId) -> IncomingHalfEdgeIter<'_> {
        IncomingHalfEdgeIter::new(self, v)
    }

    /// Circulate over the one-ring neighbor vertices of a vertex.
    pub fn vertex_vertices(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.outgoing_halfedges(v).map(|h| self.to_vertex(h))
    }

    /// Circulate over the edges incident to a vertex.
    pub fn vertex_edges(&self, v: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        self.outgoing_halfedges(v).map(HalfEdgeId::edge)
    }

    /// Circulate over the faces incident to a vertex. Boundary gaps are
    /// skipped.
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.outgoing_halfedges(v)
            .map(|h| self.halfedge_face(h))
            .filter(|f| f.is_valid())
    }

    /// Circulate over the half-edges of a face loop.
    pub fn face_halfedges(&self, f: FaceId) -> FaceHalfEdgeIter<'_> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Circulate over the vertices of a face loop, in face order.
    pub fn face_vertices(&self, f: FaceId) -> impl Iterator<Item = VertexId> + '_ {
        self.face_halfedges(f).map(|h| self.to_vertex(h))
    }

    /// Circulate over the edges of a face loop.
    pub fn face_edges(&self, f: FaceId) -> impl Iterator<Item = EdgeId> + '_ {
        self.face_halfedges(f).map(HalfEdgeId::edge)
    }

    /// Circulate over the faces adjacent to a face across its edges.
    /// Boundary edges contribute nothing.
    pub fn face_faces(&self, f: FaceId) -> impl Iterator<Item = FaceId> + '_ {
        self.face_halfedges(f)
            .map(|h| self.halfedge_face(h.opposite()))
            .filter(|f| f.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> Connectivity {
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..4).map(|_| mesh.add_vertex()).collect();
        mesh.add_face(&[v[0], v[1], v[2]]).unwrap();
        mesh.add_face(&[v[0], v[2], v[3]]).unwrap();
        mesh
    }

    #[test]
    fn test_outgoing_halfedges_cover_ring() {
        let mesh = two_triangles();
        let v0 = VertexId::new(0);
        let outgoing: Vec<HalfEdgeId> = mesh.outgoing_halfedges(v0).collect();
        assert_eq!(outgoing.len(), 3);
        for h in outgoing {
            assert_eq!(mesh.from_vertex(h), v0);
        }
    }

    #[test]
    fn test_incoming_are_opposites_of_outgoing() {
        let mesh = two_triangles();
        let v0 = VertexId::new(0);
        for h in mesh.incoming_halfedges(v0) {
            assert_eq!(mesh.to_vertex(h), v0);
        }
        assert_eq!(
            mesh.incoming_halfedges(v0).count(),
            mesh.outgoing_halfedges(v0).count()
        );
    }

    #[test]
    fn test_vertex_vertices() {
        let mesh = two_triangles();
        let mut ring: Vec<usize> = mesh
            .vertex_vertices(VertexId::new(0))
            .map(|v| v.index())
            .collect();
        ring.sort_unstable();
        assert_eq!(ring, vec![1, 2, 3]);
    }

    #[test]
    fn test_vertex_faces_skips_boundary_gap() {
        let mesh = two_triangles();
        // Vertex 0 touches both faces; vertex 1 only the first.
        assert_eq!(mesh.vertex_faces(VertexId::new(0)).count(), 2);
        assert_eq!(mesh.vertex_faces(VertexId::new(1)).count(), 1);
    }

    #[test]
    fn test_isolated_vertex_is_exhausted() {
        let mut mesh = Connectivity::new();
        let v = mesh.add_vertex();
        assert_eq!(mesh.outgoing_halfedges(v).count(), 0);
        assert_eq!(mesh.vertex_vertices(v).count(), 0);
        assert_eq!(mesh.vertex_faces(v).count(), 0);
    }

    #[test]
    fn test_face_loop_order() {
        let mesh = two_triangles();
        let f = FaceId::new(0);
        assert_eq!(mesh.face_halfedges(f).count(), 3);
        // The loop visits exactly the face's vertex set, consecutively
        // linked.
        let verts: Vec<VertexId> = mesh.face_vertices(f).collect();
        let mut sorted: Vec<usize> = verts.iter().map(|v| v.index()).collect();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
        for (h, &v) in mesh.face_halfedges(f).zip(verts.iter()) {
            assert_eq!(mesh.to_vertex(h), v);
        }
    }

    #[test]
    fn test_face_faces_across_shared_edge() {
        let mesh = two_triangles();
        let neighbors: Vec<FaceId> = mesh.face_faces(FaceId::new(0)).collect();
        assert_eq!(neighbors, vec![FaceId::new(1)]);
    }
}
