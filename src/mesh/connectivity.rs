//! Half-edge connectivity kernel.
//!
//! This module owns the four element arrays (vertices, half-edges grouped as
//! edge pairs, edges, faces) that encode the adjacency graph of a 2-manifold
//! surface with boundary, and provides the mutation primitives on top of
//! them: vertex/face insertion, soft deletion, garbage collection and edge
//! collapse.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite
//!   directions, stored as an adjacent pair so that the twin of half-edge
//!   `h` is `h ^ 1` and its edge is `h >> 1` — no opposite pointer is stored
//! - Each half-edge knows its **to-vertex**, **incident face** (invalid on
//!   the boundary), and **next**/**prev** half-edges around its face loop or
//!   boundary loop
//! - Each vertex stores one outgoing half-edge; for boundary vertices it is
//!   kept pointing at a boundary half-edge so boundary tests are O(1)
//! - Each face stores one half-edge on its loop
//!
//! # Deletion
//!
//! Deletion only sets the `DELETED` status flag; storage stays in place and
//! handles keep their values until [`Connectivity::garbage_collection`]
//! compacts the arrays and renumbers every surviving element. Callers must
//! not hold handles across a garbage collection (the returned
//! [`CompactionMaps`] translate old handles where needed).

use crate::error::{MeshError, Result};

use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};
use super::property::PropertyContainer;
use super::status::Status;

/// A vertex record: one outgoing half-edge, or invalid if isolated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    pub(crate) halfedge: HalfEdgeId,
}

/// A half-edge record.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfEdge {
    /// The vertex this half-edge points to.
    pub(crate) vertex: VertexId,
    /// The incident face; invalid for boundary half-edges.
    pub(crate) face: FaceId,
    /// The next half-edge around the face or boundary loop.
    pub(crate) next: HalfEdgeId,
    /// The previous half-edge around the face or boundary loop.
    pub(crate) prev: HalfEdgeId,
}

/// An edge record: the two paired half-edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct Edge {
    pub(crate) halves: [HalfEdge; 2],
}

/// A face record: one half-edge on its boundary loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Face {
    pub(crate) halfedge: HalfEdgeId,
}

/// Which face arities a kernel accepts.
///
/// A triangle-only mesh is the same kernel with an arity check in
/// [`Connectivity::add_face`], not a separate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceKind {
    /// Faces may have any arity >= 3.
    #[default]
    Polygonal,
    /// Every face must be a triangle.
    Triangular,
}

/// Old-to-new handle maps produced by [`Connectivity::garbage_collection`].
///
/// Indexed by the pre-compaction handle; removed elements map to the
/// invalid handle.
#[derive(Debug, Clone)]
pub struct CompactionMaps {
    /// Old vertex index to new vertex handle.
    pub vertices: Vec<VertexId>,
    /// Old half-edge index to new half-edge handle.
    pub halfedges: Vec<HalfEdgeId>,
    /// Old edge index to new edge handle.
    pub edges: Vec<EdgeId>,
    /// Old face index to new face handle.
    pub faces: Vec<FaceId>,
}

impl CompactionMaps {
    /// Translate a pre-compaction vertex handle.
    pub fn vertex(&self, old: VertexId) -> VertexId {
        if old.is_valid() {
            self.vertices[old.index()]
        } else {
            VertexId::invalid()
        }
    }

    /// Translate a pre-compaction half-edge handle.
    pub fn halfedge(&self, old: HalfEdgeId) -> HalfEdgeId {
        if old.is_valid() {
            self.halfedges[old.index()]
        } else {
            HalfEdgeId::invalid()
        }
    }

    /// Translate a pre-compaction edge handle.
    pub fn edge(&self, old: EdgeId) -> EdgeId {
        if old.is_valid() {
            self.edges[old.index()]
        } else {
            EdgeId::invalid()
        }
    }

    /// Translate a pre-compaction face handle.
    pub fn face(&self, old: FaceId) -> FaceId {
        if old.is_valid() {
            self.faces[old.index()]
        } else {
            FaceId::invalid()
        }
    }
}

/// The array-based half-edge connectivity kernel.
///
/// Owns the element arrays, one status array per element kind, and one
/// [`PropertyContainer`] per element kind kept in lockstep with the element
/// counts. All operations are synchronous and unsynchronized; concurrent
/// use requires an external mutual-exclusion boundary around the whole
/// kernel.
#[derive(Default)]
pub struct Connectivity {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,

    vstatus: Vec<Status>,
    hstatus: Vec<Status>,
    estatus: Vec<Status>,
    fstatus: Vec<Status>,

    vprops: PropertyContainer,
    hprops: PropertyContainer,
    eprops: PropertyContainer,
    fprops: PropertyContainer,

    kind: FaceKind,
}

impl Connectivity {
    /// Create a new empty polygonal kernel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty kernel accepting only the given face arity.
    pub fn with_kind(kind: FaceKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Create a kernel with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_edges: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            edges: Vec::with_capacity(num_edges),
            faces: Vec::with_capacity(num_faces),
            vstatus: Vec::with_capacity(num_vertices),
            hstatus: Vec::with_capacity(num_edges * 2),
            estatus: Vec::with_capacity(num_edges),
            fstatus: Vec::with_capacity(num_faces),
            ..Self::default()
        }
    }

    /// Which face arities this kernel accepts.
    pub fn face_kind(&self) -> FaceKind {
        self.kind
    }

    // ==================== Counts and validity ====================

    /// Number of allocated vertices, including soft-deleted ones.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of allocated half-edges, including soft-deleted ones.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.edges.len() * 2
    }

    /// Number of allocated edges, including soft-deleted ones.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of allocated faces, including soft-deleted ones.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Check that a vertex handle is in bounds. O(1).
    #[inline]
    pub fn is_valid_vertex(&self, v: VertexId) -> bool {
        v.index() < self.vertices.len()
    }

    /// Check that a half-edge handle is in bounds. O(1).
    #[inline]
    pub fn is_valid_halfedge(&self, h: HalfEdgeId) -> bool {
        h.index() < self.num_halfedges()
    }

    /// Check that an edge handle is in bounds. O(1).
    #[inline]
    pub fn is_valid_edge(&self, e: EdgeId) -> bool {
        e.index() < self.edges.len()
    }

    /// Check that a face handle is in bounds. O(1).
    #[inline]
    pub fn is_valid_face(&self, f: FaceId) -> bool {
        f.index() < self.faces.len()
    }

    // ==================== Record access ====================

    #[inline]
    fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        &mut self.vertices[v.index()]
    }

    #[inline]
    fn halfedge(&self, h: HalfEdgeId) -> &HalfEdge {
        &self.edges[h.edge().index()].halves[h.side()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, h: HalfEdgeId) -> &mut HalfEdge {
        &mut self.edges[h.edge().index()].halves[h.side()]
    }

    #[inline]
    fn face_mut(&mut self, f: FaceId) -> &mut Face {
        &mut self.faces[f.index()]
    }

    // ==================== Topology queries ====================

    /// The vertex a half-edge points to.
    #[inline]
    pub fn to_vertex(&self, h: HalfEdgeId) -> VertexId {
        self.halfedge(h).vertex
    }

    /// The vertex a half-edge originates from.
    #[inline]
    pub fn from_vertex(&self, h: HalfEdgeId) -> VertexId {
        self.to_vertex(h.opposite())
    }

    /// The next half-edge around the face or boundary loop.
    #[inline]
    pub fn next_halfedge(&self, h: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(h).next
    }

    /// The previous half-edge around the face or boundary loop.
    #[inline]
    pub fn prev_halfedge(&self, h: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(h).prev
    }

    /// The opposite (paired) half-edge.
    #[inline]
    pub fn opposite_halfedge(&self, h: HalfEdgeId) -> HalfEdgeId {
        h.opposite()
    }

    /// The incident face of a half-edge, invalid on the boundary.
    #[inline]
    pub fn halfedge_face(&self, h: HalfEdgeId) -> FaceId {
        self.halfedge(h).face
    }

    /// One outgoing half-edge of a vertex, invalid if the vertex is isolated.
    #[inline]
    pub fn vertex_halfedge(&self, v: VertexId) -> HalfEdgeId {
        self.vertex(v).halfedge
    }

    /// One half-edge on the loop of a face.
    #[inline]
    pub fn face_halfedge(&self, f: FaceId) -> HalfEdgeId {
        self.faces[f.index()].halfedge
    }

    /// Check if a half-edge lies on the boundary (has no incident face).
    #[inline]
    pub fn is_boundary_halfedge(&self, h: HalfEdgeId) -> bool {
        !self.halfedge(h).face.is_valid()
    }

    /// Check if an edge lies on the boundary.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        let (h0, h1) = e.halfedges();
        self.is_boundary_halfedge(h0) || self.is_boundary_halfedge(h1)
    }

    /// Check if a vertex lies on the boundary (or is isolated).
    ///
    /// O(1): the kernel keeps every boundary vertex's outgoing half-edge
    /// pointing at a boundary half-edge.
    #[inline]
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        let h = self.vertex(v).halfedge;
        !h.is_valid() || self.is_boundary_halfedge(h)
    }

    /// Find the half-edge from `from` to `to`, if the edge exists.
    pub fn find_halfedge(&self, from: VertexId, to: VertexId) -> Option<HalfEdgeId> {
        self.outgoing_halfedges(from)
            .find(|&h| self.to_vertex(h) == to)
    }

    /// Check if the neighborhood of a vertex is a single fan.
    ///
    /// Only the vertex's reference half-edge may be on the boundary; a
    /// second boundary half-edge in the ring means more than one gap.
    pub fn is_manifold_vertex(&self, v: VertexId) -> bool {
        self.outgoing_halfedges(v)
            .skip(1)
            .all(|h| !self.is_boundary_halfedge(h))
    }

    /// Number of edges incident to a vertex.
    pub fn vertex_valence(&self, v: VertexId) -> usize {
        self.outgoing_halfedges(v).count()
    }

    /// Number of vertices of a face.
    pub fn face_valence(&self, f: FaceId) -> usize {
        self.face_halfedges(f).count()
    }

    // ==================== Status ====================

    /// Status flags of a vertex.
    #[inline]
    pub fn vertex_status(&self, v: VertexId) -> Status {
        self.vstatus[v.index()]
    }

    /// Mutable status flags of a vertex.
    #[inline]
    pub fn vertex_status_mut(&mut self, v: VertexId) -> &mut Status {
        &mut self.vstatus[v.index()]
    }

    /// Status flags of a half-edge.
    #[inline]
    pub fn halfedge_status(&self, h: HalfEdgeId) -> Status {
        self.hstatus[h.index()]
    }

    /// Mutable status flags of a half-edge.
    #[inline]
    pub fn halfedge_status_mut(&mut self, h: HalfEdgeId) -> &mut Status {
        &mut self.hstatus[h.index()]
    }

    /// Status flags of an edge.
    #[inline]
    pub fn edge_status(&self, e: EdgeId) -> Status {
        self.estatus[e.index()]
    }

    /// Mutable status flags of an edge.
    #[inline]
    pub fn edge_status_mut(&mut self, e: EdgeId) -> &mut Status {
        &mut self.estatus[e.index()]
    }

    /// Status flags of a face.
    #[inline]
    pub fn face_status(&self, f: FaceId) -> Status {
        self.fstatus[f.index()]
    }

    /// Mutable status flags of a face.
    #[inline]
    pub fn face_status_mut(&mut self, f: FaceId) -> &mut Status {
        &mut self.fstatus[f.index()]
    }

    // ==================== Properties ====================

    /// Named attribute stores for vertices.
    pub fn vertex_props(&self) -> &PropertyContainer {
        &self.vprops
    }

    /// Mutable named attribute stores for vertices.
    pub fn vertex_props_mut(&mut self) -> &mut PropertyContainer {
        &mut self.vprops
    }

    /// Named attribute stores for half-edges.
    pub fn halfedge_props(&self) -> &PropertyContainer {
        &self.hprops
    }

    /// Mutable named attribute stores for half-edges.
    pub fn halfedge_props_mut(&mut self) -> &mut PropertyContainer {
        &mut self.hprops
    }

    /// Named attribute stores for edges.
    pub fn edge_props(&self) -> &PropertyContainer {
        &self.eprops
    }

    /// Mutable named attribute stores for edges.
    pub fn edge_props_mut(&mut self) -> &mut PropertyContainer {
        &mut self.eprops
    }

    /// Named attribute stores for faces.
    pub fn face_props(&self) -> &PropertyContainer {
        &self.fprops
    }

    /// Mutable named attribute stores for faces.
    pub fn face_props_mut(&mut self) -> &mut PropertyContainer {
        &mut self.fprops
    }

    // ==================== Construction ====================

    /// Append a new isolated vertex.
    pub fn add_vertex(&mut self) -> VertexId {
        let v = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::default());
        self.vstatus.push(Status::default());
        self.vprops.push_all();
        v
    }

    /// Append a new edge between `from` and `to`, returning the `from -> to`
    /// half-edge. Links are left for the caller to wire.
    fn new_edge(&mut self, from: VertexId, to: VertexId) -> HalfEdgeId {
        let e = EdgeId::new(self.edges.len());
        self.edges.push(Edge {
            halves: [
                HalfEdge {
                    vertex: to,
                    ..HalfEdge::default()
                },
                HalfEdge {
                    vertex: from,
                    ..HalfEdge::default()
                },
            ],
        });
        self.estatus.push(Status::default());
        self.hstatus.push(Status::default());
        self.hstatus.push(Status::default());
        self.eprops.push_all();
        self.hprops.push_n(2);
        e.halfedge(false)
    }

    fn new_face(&mut self, halfedge: HalfEdgeId) -> FaceId {
        let f = FaceId::new(self.faces.len());
        self.faces.push(Face { halfedge });
        self.fstatus.push(Status::default());
        self.fprops.push_all();
        f
    }

    /// Link two half-edges so that `next(prev) == next` and `prev(next) == prev`.
    #[inline]
    fn link_halfedges(&mut self, prev: HalfEdgeId, next: HalfEdgeId) {
        self.halfedge_mut(prev).next = next;
        self.halfedge_mut(next).prev = prev;
    }

    /// Point a boundary vertex's reference half-edge at a boundary half-edge
    /// if its ring contains one.
    fn adjust_outgoing_halfedge(&mut self, v: VertexId) {
        let found = self
            .outgoing_halfedges(v)
            .find(|&h| self.is_boundary_halfedge(h));
        if let Some(h) = found {
            self.vertex_mut(v).halfedge = h;
        }
    }

    /// Add a face over an ordered ring of existing vertices.
    ///
    /// Finds or creates the half-edge between each consecutive pair and
    /// splices the new loop into the boundary fans at shared vertices. All
    /// error conditions are checked before the first mutation, so a failed
    /// call leaves the kernel exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`MeshError::DegenerateFace`] for fewer than three or repeated
    ///   vertices
    /// - [`MeshError::InvalidArity`] when a triangle-only kernel is given a
    ///   non-triangle
    /// - [`MeshError::NonManifoldEdge`] when an edge of the ring already has
    ///   two incident faces
    /// - [`MeshError::ComplexVertex`] when a ring vertex is not on the
    ///   boundary, or splicing would disconnect one of its fans
    pub fn add_face(&mut self, verts: &[VertexId]) -> Result<FaceId> {
        let n = verts.len();
        if n < 3 {
            return Err(MeshError::DegenerateFace);
        }
        if self.kind == FaceKind::Triangular && n != 3 {
            return Err(MeshError::InvalidArity { arity: n });
        }
        for (i, &v) in verts.iter().enumerate() {
            if !self.is_valid_vertex(v) {
                return Err(MeshError::InvalidHandle {
                    kind: "vertex",
                    index: v.index(),
                    len: self.vertices.len(),
                });
            }
            if verts[i + 1..].contains(&v) {
                return Err(MeshError::DegenerateFace);
            }
        }

        // Locate existing half-edges and reject non-manifold configurations.
        let mut loop_he = Vec::with_capacity(n);
        let mut is_new = Vec::with_capacity(n);
        for i in 0..n {
            if !self.is_boundary_vertex(verts[i]) {
                return Err(MeshError::ComplexVertex(verts[i]));
            }
            let h = self.find_halfedge(verts[i], verts[(i + 1) % n]);
            if let Some(h) = h {
                if !self.is_boundary_halfedge(h) {
                    return Err(MeshError::NonManifoldEdge(h));
                }
            }
            loop_he.push(h.unwrap_or_else(HalfEdgeId::invalid));
            is_new.push(h.is_none());
        }

        // Where two existing boundary half-edges meet at a vertex without
        // being linked, the fans between them must be rotated out of the
        // way. The links are only recorded here; nothing is written until
        // every check has passed.
        let mut next_cache: Vec<(HalfEdgeId, HalfEdgeId)> = Vec::with_capacity(6 * n);
        for i in 0..n {
            let j = (i + 1) % n;
            if is_new[i] || is_new[j] {
                continue;
            }
            let inner_prev = loop_he[i];
            let inner_next = loop_he[j];
            if self.next_halfedge(inner_prev) == inner_next {
                continue;
            }
            // Find a free (boundary) gap to move the in-between patch into.
            let mut boundary_prev = inner_next.opposite();
            loop {
                boundary_prev = self.next_halfedge(boundary_prev).opposite();
                if self.is_boundary_halfedge(boundary_prev) {
                    break;
                }
            }
            let boundary_next = self.next_halfedge(boundary_prev);
            if boundary_prev == inner_prev {
                return Err(MeshError::ComplexVertex(verts[j]));
            }
            debug_assert!(self.is_boundary_halfedge(boundary_prev));
            debug_assert!(self.is_boundary_halfedge(boundary_next));
            let patch_start = self.next_halfedge(inner_prev);
            let patch_end = self.prev_halfedge(inner_next);
            next_cache.push((boundary_prev, patch_start));
            next_cache.push((patch_end, boundary_next));
            next_cache.push((inner_prev, inner_next));
        }

        // No more errors possible; create the missing edges and the face.
        for i in 0..n {
            if is_new[i] {
                loop_he[i] = self.new_edge(verts[i], verts[(i + 1) % n]);
            }
        }
        let face = self.new_face(loop_he[n - 1]);

        let mut needs_adjust = vec![false; n];
        for i in 0..n {
            let j = (i + 1) % n;
            let v = verts[j];
            let inner_prev = loop_he[i];
            let inner_next = loop_he[j];

            let case = (is_new[i] as u8) | ((is_new[j] as u8) << 1);
            if case > 0 {
                let outer_prev = inner_next.opposite();
                let outer_next = inner_prev.opposite();
                match case {
                    1 => {
                        // inner_prev is new, inner_next already existed
                        let boundary_prev = self.prev_halfedge(inner_next);
                        next_cache.push((boundary_prev, outer_next));
                        self.vertex_mut(v).halfedge = outer_next;
                    }
                    2 => {
                        // inner_prev existed, inner_next is new
                        let boundary_next = self.next_halfedge(inner_prev);
                        next_cache.push((outer_prev, boundary_next));
                        self.vertex_mut(v).halfedge = boundary_next;
                    }
                    _ => {
                        // both are new
                        let vh = self.vertex_halfedge(v);
                        if vh.is_valid() {
                            let boundary_prev = self.prev_halfedge(vh);
                            next_cache.push((boundary_prev, outer_next));
                            next_cache.push((outer_prev, vh));
                        } else {
                            self.vertex_mut(v).halfedge = outer_next;
                            next_cache.push((outer_prev, outer_next));
                        }
                    }
                }
                next_cache.push((inner_prev, inner_next));
            } else {
                needs_adjust[j] = self.vertex_halfedge(v) == inner_next;
            }

            self.halfedge_mut(loop_he[i]).face = face;
        }

        for (prev, next) in next_cache {
            self.link_halfedges(prev, next);
        }
        for (i, &v) in verts.iter().enumerate() {
            if needs_adjust[i] {
                self.adjust_outgoing_halfedge(v);
            }
        }
        Ok(face)
    }

    // ==================== Deletion ====================

    /// Mark a vertex deleted along with every incident face.
    ///
    /// `delete_isolated` additionally marks vertices that lose their last
    /// edge in the process.
    pub fn delete_vertex(&mut self, v: VertexId, delete_isolated: bool) -> Result<()> {
        if !self.is_valid_vertex(v) {
            return Err(MeshError::InvalidHandle {
                kind: "vertex",
                index: v.index(),
                len: self.vertices.len(),
            });
        }
        if self.vstatus[v.index()].deleted() {
            return Err(MeshError::DeletedVertex(v));
        }
        // Deleting a face rewires the ring, so collect the incident faces
        // before touching anything.
        let incident: Vec<FaceId> = self.vertex_faces(v).collect();
        for f in incident {
            self.delete_face(f, delete_isolated)?;
        }
        self.vstatus[v.index()].set_deleted(true);
        Ok(())
    }

    /// Mark an edge deleted along with its incident faces.
    pub fn delete_edge(&mut self, e: EdgeId, delete_isolated: bool) -> Result<()> {
        if !self.is_valid_edge(e) {
            return Err(MeshError::InvalidHandle {
                kind: "edge",
                index: e.index(),
                len: self.edges.len(),
            });
        }
        if self.estatus[e.index()].deleted() {
            return Err(MeshError::DeletedEdge(e));
        }
        let (h0, h1) = e.halfedges();
        let f0 = self.halfedge_face(h0);
        let f1 = self.halfedge_face(h1);
        if f0.is_valid() {
            self.delete_face(f0, delete_isolated)?;
        }
        if f1.is_valid() {
            self.delete_face(f1, delete_isolated)?;
        }
        // A wire edge (no face on either side) is not touched by the face
        // deletions above and must be marked here.
        if !f0.is_valid() && !f1.is_valid() {
            self.estatus[e.index()].set_deleted(true);
            self.hstatus[h0.index()].set_deleted(true);
            self.hstatus[h1.index()].set_deleted(true);
        }
        Ok(())
    }

    /// Mark a face deleted, detaching its half-edges and removing edges that
    /// would be left dangling (boundary on both sides).
    pub fn delete_face(&mut self, f: FaceId, delete_isolated: bool) -> Result<()> {
        if !self.is_valid_face(f) {
            return Err(MeshError::InvalidHandle {
                kind: "face",
                index: f.index(),
                len: self.faces.len(),
            });
        }
        if self.fstatus[f.index()].deleted() {
            return Err(MeshError::DeletedFace(f));
        }
        self.fstatus[f.index()].set_deleted(true);

        // Detach the loop from the face and collect the neighborhood.
        let ring: Vec<HalfEdgeId> = self.face_halfedges(f).collect();
        let mut dangling_edges = Vec::new();
        let mut ring_vertices = Vec::with_capacity(ring.len());
        for &h in &ring {
            self.halfedge_mut(h).face = FaceId::invalid();
            if self.is_boundary_halfedge(h.opposite()) {
                dangling_edges.push(h.edge());
            }
            ring_vertices.push(self.to_vertex(h));
        }

        for e in dangling_edges {
            let h0 = e.halfedge(false);
            let v0 = self.to_vertex(h0);
            let next0 = self.next_halfedge(h0);
            let prev0 = self.prev_halfedge(h0);
            let h1 = e.halfedge(true);
            let v1 = self.to_vertex(h1);
            let next1 = self.next_halfedge(h1);
            let prev1 = self.prev_halfedge(h1);

            self.link_halfedges(prev0, next1);
            self.link_halfedges(prev1, next0);
            self.estatus[e.index()].set_deleted(true);
            self.hstatus[h0.index()].set_deleted(true);
            self.hstatus[h1.index()].set_deleted(true);

            if self.vertex_halfedge(v0) == h1 {
                if next0 == h1 {
                    // v0 lost its last edge
                    if delete_isolated {
                        self.vstatus[v0.index()].set_deleted(true);
                    }
                    self.vertex_mut(v0).halfedge = HalfEdgeId::invalid();
                } else {
                    self.vertex_mut(v0).halfedge = next0;
                }
            }
            if self.vertex_halfedge(v1) == h0 {
                if next1 == h0 {
                    if delete_isolated {
                        self.vstatus[v1.index()].set_deleted(true);
                    }
                    self.vertex_mut(v1).halfedge = HalfEdgeId::invalid();
                } else {
                    self.vertex_mut(v1).halfedge = next1;
                }
            }
        }

        for v in ring_vertices {
            if self.vertex_halfedge(v).is_valid() {
                self.adjust_outgoing_halfedge(v);
            }
        }
        Ok(())
    }

    // ==================== Collapse ====================

    /// Check whether collapsing `h` (merging its from-vertex into its
    /// to-vertex) preserves manifoldness. Non-mutating.
    pub fn is_collapse_ok(&self, h: HalfEdgeId) -> bool {
        if !self.is_valid_halfedge(h) || self.estatus[h.edge().index()].deleted() {
            return false;
        }
        let o = h.opposite();
        let v0 = self.to_vertex(o); // removed by the collapse
        let v1 = self.to_vertex(h); // kept
        if self.vstatus[v0.index()].deleted() || self.vstatus[v1.index()].deleted() {
            return false;
        }

        // On a triangular side face, the two remaining edges merge; they
        // must not both be boundary edges.
        let mut vl = VertexId::invalid();
        if !self.is_boundary_halfedge(h) {
            let h1 = self.next_halfedge(h);
            let h2 = self.next_halfedge(h1);
            if self.next_halfedge(h2) == h {
                vl = self.to_vertex(h1);
                if self.is_boundary_halfedge(h1.opposite())
                    && self.is_boundary_halfedge(h2.opposite())
                {
                    return false;
                }
            }
        }
        let mut vr = VertexId::invalid();
        if !self.is_boundary_halfedge(o) {
            let o1 = self.next_halfedge(o);
            let o2 = self.next_halfedge(o1);
            if self.next_halfedge(o2) == o {
                vr = self.to_vertex(o1);
                if self.is_boundary_halfedge(o1.opposite())
                    && self.is_boundary_halfedge(o2.opposite())
                {
                    return false;
                }
            }
        }
        if vl == vr && vl.is_valid() {
            return false;
        }

        // An interior edge between two boundary vertices would pinch the
        // surface shut.
        if self.is_boundary_vertex(v0)
            && self.is_boundary_vertex(v1)
            && !self.is_boundary_halfedge(h)
            && !self.is_boundary_halfedge(o)
        {
            return false;
        }

        // Link condition: the one-rings of the endpoints may only share the
        // vertices opposite the collapsed edge.
        for vv in self.vertex_vertices(v0) {
            if vv != v1 && vv != vl && vv != vr && self.find_halfedge(vv, v1).is_some() {
                return false;
            }
        }
        true
    }

    /// Collapse `h`: merge its from-vertex into its to-vertex, relinking the
    /// one-ring and marking the collapsed vertex, the collapsed edge, and
    /// any now-degenerate faces deleted.
    ///
    /// Fails with [`MeshError::IllegalCollapse`] (and mutates nothing) when
    /// [`Connectivity::is_collapse_ok`] rejects the half-edge.
    pub fn collapse(&mut self, h: HalfEdgeId) -> Result<()> {
        if !self.is_collapse_ok(h) {
            return Err(MeshError::IllegalCollapse(h));
        }
        let h0 = h;
        let h1 = self.prev_halfedge(h0);
        let o0 = h0.opposite();
        let o1 = self.next_halfedge(o0);

        self.collapse_edge(h0);

        // Triangular side faces degenerate into two-edge loops; weld them.
        if self.next_halfedge(self.next_halfedge(h1)) == h1 {
            let loop_he = self.next_halfedge(h1);
            self.collapse_loop(loop_he);
        }
        if self.next_halfedge(self.next_halfedge(o1)) == o1 {
            self.collapse_loop(o1);
        }
        Ok(())
    }

    /// Remove the edge of `h`, retargeting every half-edge that pointed at
    /// its from-vertex.
    fn collapse_edge(&mut self, h: HalfEdgeId) {
        let hn = self.next_halfedge(h);
        let hp = self.prev_halfedge(h);
        let o = h.opposite();
        let on = self.next_halfedge(o);
        let op = self.prev_halfedge(o);
        let fh = self.halfedge_face(h);
        let fo = self.halfedge_face(o);
        let vh = self.to_vertex(h); // kept
        let vo = self.to_vertex(o); // removed

        let incoming: Vec<HalfEdgeId> = self.incoming_halfedges(vo).collect();
        for ih in incoming {
            self.halfedge_mut(ih).vertex = vh;
        }

        self.link_halfedges(hp, hn);
        self.link_halfedges(op, on);

        if fh.is_valid() {
            self.face_mut(fh).halfedge = hn;
        }
        if fo.is_valid() {
            self.face_mut(fo).halfedge = on;
        }

        if self.vertex_halfedge(vh) == o {
            self.vertex_mut(vh).halfedge = hn;
        }
        self.adjust_outgoing_halfedge(vh);
        self.vertex_mut(vo).halfedge = HalfEdgeId::invalid();

        self.estatus[h.edge().index()].set_deleted(true);
        self.hstatus[h.index()].set_deleted(true);
        self.hstatus[o.index()].set_deleted(true);
        self.vstatus[vo.index()].set_deleted(true);
    }

    /// Remove a degenerate loop of exactly two half-edges.
    fn collapse_loop(&mut self, h: HalfEdgeId) {
        let h0 = h;
        let h1 = self.next_halfedge(h0);
        let o0 = h0.opposite();
        let o1 = h1.opposite();
        let v0 = self.to_vertex(h0);
        let v1 = self.to_vertex(h1);
        let fh = self.halfedge_face(h0);
        let fo = self.halfedge_face(o0);
        debug_assert!(self.next_halfedge(h1) == h0 && h1 != o0);

        let o0_next = self.next_halfedge(o0);
        let o0_prev = self.prev_halfedge(o0);
        self.link_halfedges(h1, o0_next);
        self.link_halfedges(o0_prev, h1);
        self.halfedge_mut(h1).face = fo;

        self.vertex_mut(v0).halfedge = h1;
        self.adjust_outgoing_halfedge(v0);
        self.vertex_mut(v1).halfedge = o1;
        self.adjust_outgoing_halfedge(v1);

        if fo.is_valid() && self.face_halfedge(fo) == o0 {
            self.face_mut(fo).halfedge = h1;
        }
        if fh.is_valid() {
            self.face_mut(fh).halfedge = HalfEdgeId::invalid();
            self.fstatus[fh.index()].set_deleted(true);
        }
        self.estatus[h0.edge().index()].set_deleted(true);
        self.hstatus[h0.index()].set_deleted(true);
        self.hstatus[o0.index()].set_deleted(true);
    }

    // ==================== Garbage collection ====================

    /// Compact all element arrays, statuses and properties, removing
    /// soft-deleted elements and renumbering the survivors densely from 0.
    ///
    /// Live elements keep their relative order. Every handle held by a
    /// caller is stale after this returns; the returned [`CompactionMaps`]
    /// translate them. O(n) in elements plus property values. Calling it
    /// again without intervening deletions is a no-op.
    pub fn garbage_collection(&mut self) -> CompactionMaps {
        let nv = self.vertices.len();
        let ne = self.edges.len();
        let nf = self.faces.len();

        let vorder: Vec<usize> = (0..nv).filter(|&i| !self.vstatus[i].deleted()).collect();
        let eorder: Vec<usize> = (0..ne).filter(|&i| !self.estatus[i].deleted()).collect();
        let forder: Vec<usize> = (0..nf).filter(|&i| !self.fstatus[i].deleted()).collect();
        let horder: Vec<usize> = eorder.iter().flat_map(|&e| [2 * e, 2 * e + 1]).collect();

        let mut vmap = vec![VertexId::invalid(); nv];
        for (new, &old) in vorder.iter().enumerate() {
            vmap[old] = VertexId::new(new);
        }
        let mut emap = vec![EdgeId::invalid(); ne];
        let mut hmap = vec![HalfEdgeId::invalid(); ne * 2];
        for (new, &old) in eorder.iter().enumerate() {
            emap[old] = EdgeId::new(new);
            hmap[2 * old] = HalfEdgeId::new(2 * new);
            hmap[2 * old + 1] = HalfEdgeId::new(2 * new + 1);
        }
        let mut fmap = vec![FaceId::invalid(); nf];
        for (new, &old) in forder.iter().enumerate() {
            fmap[old] = FaceId::new(new);
        }

        // Compact elements and statuses with the same permutation.
        let vertices: Vec<Vertex> = vorder.iter().map(|&i| self.vertices[i]).collect();
        self.vertices = vertices;
        let vstatus: Vec<Status> = vorder.iter().map(|&i| self.vstatus[i]).collect();
        self.vstatus = vstatus;
        let edges: Vec<Edge> = eorder.iter().map(|&i| self.edges[i]).collect();
        self.edges = edges;
        let estatus: Vec<Status> = eorder.iter().map(|&i| self.estatus[i]).collect();
        self.estatus = estatus;
        let hstatus: Vec<Status> = horder.iter().map(|&i| self.hstatus[i]).collect();
        self.hstatus = hstatus;
        let faces: Vec<Face> = forder.iter().map(|&i| self.faces[i]).collect();
        self.faces = faces;
        let fstatus: Vec<Status> = forder.iter().map(|&i| self.fstatus[i]).collect();
        self.fstatus = fstatus;

        self.vprops.gather(&vorder);
        self.hprops.gather(&horder);
        self.eprops.gather(&eorder);
        self.fprops.gather(&forder);

        // Rewrite every internal reference to the new numbering. Live
        // elements never reference deleted ones, so all lookups hit valid
        // entries.
        for v in &mut self.vertices {
            if v.halfedge.is_valid() {
                v.halfedge = hmap[v.halfedge.index()];
            }
        }
        for e in &mut self.edges {
            for half in &mut e.halves {
                half.vertex = vmap[half.vertex.index()];
                half.next = hmap[half.next.index()];
                half.prev = hmap[half.prev.index()];
                if half.face.is_valid() {
                    half.face = fmap[half.face.index()];
                }
            }
        }
        for f in &mut self.faces {
            f.halfedge = hmap[f.halfedge.index()];
        }

        log::debug!(
            "garbage collection: {} -> {} vertices, {} -> {} edges, {} -> {} faces",
            nv,
            self.vertices.len(),
            ne,
            self.edges.len(),
            nf,
            self.faces.len()
        );

        CompactionMaps {
            vertices: vmap,
            halfedges: hmap,
            edges: emap,
            faces: fmap,
        }
    }

    // ==================== Reset ====================

    /// Reset the kernel to empty. Registered property stores survive at
    /// length zero.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.vstatus.clear();
        self.hstatus.clear();
        self.estatus.clear();
        self.fstatus.clear();
        self.vprops.clear();
        self.hprops.clear();
        self.eprops.clear();
        self.fprops.clear();
    }

    /// Drop all registered property stores and transient status bits
    /// (selection, tags) without compacting or touching connectivity.
    pub fn clean(&mut self) {
        self.vprops.remove_all();
        self.hprops.remove_all();
        self.eprops.remove_all();
        self.fprops.remove_all();
        let transient = Status::SELECTED | Status::TAGGED;
        for s in self
            .vstatus
            .iter_mut()
            .chain(self.hstatus.iter_mut())
            .chain(self.estatus.iter_mut())
            .chain(self.fstatus.iter_mut())
        {
            s.remove(transient);
        }
    }

    // ==================== Validation ====================

    /// Check the kernel's topological invariants.
    ///
    /// Intended for tests and debugging; O(n).
    pub fn is_valid(&self) -> bool {
        // Vertex references: live vertices point at live outgoing half-edges.
        for v in self.vertices() {
            let h = self.vertex_halfedge(v);
            if h.is_valid() {
                if self.hstatus[h.index()].deleted() || self.from_vertex(h) != v {
                    return false;
                }
            }
        }
        // Half-edge links: next/prev are inverse, endpoints are live.
        for h in self.halfedges() {
            let next = self.next_halfedge(h);
            let prev = self.prev_halfedge(h);
            if !next.is_valid() || !prev.is_valid() {
                return false;
            }
            if self.prev_halfedge(next) != h || self.next_halfedge(prev) != h {
                return false;
            }
            if self.vstatus[self.to_vertex(h).index()].deleted() {
                return false;
            }
            let f = self.halfedge_face(h);
            if f.is_valid() && self.fstatus[f.index()].deleted() {
                return false;
            }
        }
        // Face loops close and stay within their face.
        for f in self.faces() {
            let start = self.face_halfedge(f);
            if !start.is_valid() || self.hstatus[start.index()].deleted() {
                return false;
            }
            let mut h = start;
            for _ in 0..self.num_halfedges() {
                if self.halfedge_face(h) != f {
                    return false;
                }
                h = self.next_halfedge(h);
                if h == start {
                    break;
                }
            }
            if h != start {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles sharing the edge 0-2.
    fn two_triangles() -> Connectivity {
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..4).map(|_| mesh.add_vertex()).collect();
        mesh.add_face(&[v[0], v[1], v[2]]).unwrap();
        mesh.add_face(&[v[0], v[2], v[3]]).unwrap();
        mesh
    }

    /// A cube of six quads; closed, every vertex valence 3.
    fn quad_box() -> Connectivity {
        let mut mesh = Connectivity::with_capacity(8, 12, 6);
        let v: Vec<VertexId> = (0..8).map(|_| mesh.add_vertex()).collect();
        for quad in [
            [0usize, 3, 2, 1],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
            [4, 5, 6, 7],
        ] {
            mesh.add_face(&quad.map(|i| v[i])).unwrap();
        }
        mesh
    }

    /// A closed octahedron of eight triangles; every vertex valence 4.
    fn octahedron() -> Connectivity {
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..6).map(|_| mesh.add_vertex()).collect();
        for tri in [
            [0usize, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ] {
            mesh.add_face(&tri.map(|i| v[i])).unwrap();
        }
        mesh
    }

    #[test]
    fn test_single_triangle() {
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..3).map(|_| mesh.add_vertex()).collect();
        let f = mesh.add_face(&v).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_edges(), 3);
        assert_eq!(mesh.num_halfedges(), 6);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(f.index(), 0);
        assert!(mesh.is_valid());

        // Every vertex is on the boundary and references a boundary
        // half-edge whose opposite belongs to the face.
        for &vid in &v {
            let h = mesh.vertex_halfedge(vid);
            assert!(mesh.is_boundary_halfedge(h));
            assert_eq!(mesh.halfedge_face(h.opposite()), f);
        }
    }

    #[test]
    fn test_two_triangles_counts() {
        let mesh = two_triangles();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());
        assert_eq!(
            mesh.edges().filter(|&e| mesh.is_boundary_edge(e)).count(),
            4
        );
    }

    #[test]
    fn test_opposite_involution_and_loop_closure() {
        let mesh = quad_box();
        for h in mesh.halfedges() {
            assert_eq!(h.opposite().opposite(), h);
        }
        for f in mesh.faces() {
            let start = mesh.face_halfedge(f);
            let mut h = start;
            let valence = mesh.face_valence(f);
            for _ in 0..valence {
                h = mesh.next_halfedge(h);
            }
            assert_eq!(h, start);
        }
    }

    #[test]
    fn test_quad_box_is_closed() {
        let mesh = quad_box();
        assert!(mesh.halfedges().all(|h| !mesh.is_boundary_halfedge(h)));
        for v in mesh.vertices() {
            assert_eq!(mesh.vertex_valence(v), 3);
            assert!(mesh.is_manifold_vertex(v));
        }
        for f in mesh.faces() {
            assert_eq!(mesh.face_valence(f), 4);
        }
    }

    #[test]
    fn test_add_face_too_few_vertices() {
        let mut mesh = Connectivity::new();
        let v0 = mesh.add_vertex();
        let v1 = mesh.add_vertex();
        assert!(matches!(
            mesh.add_face(&[v0, v1]),
            Err(MeshError::DegenerateFace)
        ));
    }

    #[test]
    fn test_add_face_repeated_vertex_leaves_mesh_unchanged() {
        let mut mesh = two_triangles();
        let faces_before = mesh.num_faces();
        let edges_before = mesh.num_edges();
        let v0 = VertexId::new(0);
        let v1 = VertexId::new(1);
        let v3 = VertexId::new(3);

        assert!(matches!(
            mesh.add_face(&[v0, v1, v1, v3]),
            Err(MeshError::DegenerateFace)
        ));
        assert_eq!(mesh.num_faces(), faces_before);
        assert_eq!(mesh.num_edges(), edges_before);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_add_face_non_manifold_edge() {
        let mut mesh = two_triangles();
        let v = mesh.add_vertex();
        // Edge 0-2 already has two incident faces.
        let result = mesh.add_face(&[VertexId::new(0), VertexId::new(2), v]);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge(_))));
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_add_face_complex_vertex() {
        let mut mesh = quad_box();
        let a = mesh.add_vertex();
        let b = mesh.add_vertex();
        // Vertex 0 is interior in the closed box; a new face fan cannot
        // attach there.
        let result = mesh.add_face(&[VertexId::new(0), a, b]);
        assert!(matches!(result, Err(MeshError::ComplexVertex(_))));
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_triangular_kind_rejects_quads() {
        let mut mesh = Connectivity::with_kind(FaceKind::Triangular);
        let v: Vec<VertexId> = (0..4).map(|_| mesh.add_vertex()).collect();
        assert!(matches!(
            mesh.add_face(&v),
            Err(MeshError::InvalidArity { arity: 4 })
        ));
        assert!(mesh.add_face(&v[..3]).is_ok());
    }

    #[test]
    fn test_add_face_closes_fan_gap() {
        // Two triangles meeting only at vertex 1 create two boundary fans
        // there; the third face closes the gap and must splice them.
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..5).map(|_| mesh.add_vertex()).collect();
        mesh.add_face(&[v[0], v[1], v[4]]).unwrap();
        mesh.add_face(&[v[1], v[2], v[3]]).unwrap();
        assert!(!mesh.is_manifold_vertex(v[1]));

        mesh.add_face(&[v[1], v[3], v[4]]).unwrap();
        assert!(mesh.is_manifold_vertex(v[1]));
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 3);
    }

    #[test]
    fn test_add_face_splices_multiple_fans() {
        // Three triangles meeting only at a hub vertex leave three boundary
        // gaps there; bridging faces must relink the gaps one by one until
        // the hub is interior.
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..7).map(|_| mesh.add_vertex()).collect();
        let hub = v[6];
        mesh.add_face(&[v[0], v[1], hub]).unwrap();
        mesh.add_face(&[v[2], v[3], hub]).unwrap();
        mesh.add_face(&[v[4], v[5], hub]).unwrap();
        assert!(!mesh.is_manifold_vertex(hub));
        assert_eq!(mesh.vertex_valence(hub), 6);

        mesh.add_face(&[v[2], hub, v[1]]).unwrap();
        assert!(mesh.is_valid());
        assert!(!mesh.is_manifold_vertex(hub));

        mesh.add_face(&[v[4], hub, v[3]]).unwrap();
        assert!(mesh.is_valid());
        assert!(mesh.is_manifold_vertex(hub));
        assert!(mesh.is_boundary_vertex(hub));

        mesh.add_face(&[v[0], hub, v[5]]).unwrap();
        assert!(mesh.is_valid());
        assert!(!mesh.is_boundary_vertex(hub));
        assert_eq!(mesh.vertex_valence(hub), 6);
        assert_eq!(mesh.vertex_vertices(hub).count(), 6);
    }

    #[test]
    fn test_find_halfedge() {
        let mesh = two_triangles();
        let h = mesh.find_halfedge(VertexId::new(0), VertexId::new(2)).unwrap();
        assert_eq!(mesh.from_vertex(h), VertexId::new(0));
        assert_eq!(mesh.to_vertex(h), VertexId::new(2));
        assert!(mesh
            .find_halfedge(VertexId::new(1), VertexId::new(3))
            .is_none());
    }

    #[test]
    fn test_delete_face_and_collect() {
        let mut mesh = quad_box();
        mesh.delete_face(FaceId::new(5), true).unwrap();
        assert!(mesh.face_status(FaceId::new(5)).deleted());
        // Double deletion is an error.
        assert!(matches!(
            mesh.delete_face(FaceId::new(5), true),
            Err(MeshError::DeletedFace(_))
        ));

        mesh.garbage_collection();
        assert_eq!(mesh.num_faces(), 5);
        assert_eq!(mesh.num_edges(), 12);
        assert_eq!(mesh.num_vertices(), 8);
        assert!(mesh.is_valid());
        assert_eq!(
            mesh.edges().filter(|&e| mesh.is_boundary_edge(e)).count(),
            4
        );
    }

    #[test]
    fn test_delete_vertex() {
        let mut mesh = quad_box();
        mesh.delete_vertex(VertexId::new(5), true).unwrap();
        mesh.garbage_collection();
        assert_eq!(mesh.num_vertices(), 7);
        assert_eq!(mesh.num_edges(), 9);
        assert_eq!(mesh.num_faces(), 3);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_delete_vertex_twice() {
        let mut mesh = quad_box();
        mesh.delete_vertex(VertexId::new(5), true).unwrap();
        assert!(matches!(
            mesh.delete_vertex(VertexId::new(5), true),
            Err(MeshError::DeletedVertex(v)) if v == VertexId::new(5)
        ));
    }

    #[test]
    fn test_delete_edge() {
        let mut mesh = quad_box();
        let h = mesh
            .find_halfedge(VertexId::new(5), VertexId::new(6))
            .unwrap();
        mesh.delete_edge(h.edge(), true).unwrap();
        mesh.garbage_collection();
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_edges(), 11);
        assert_eq!(mesh.num_vertices(), 8);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_gc_renumbers_densely_and_maps() {
        let mut mesh = quad_box();
        mesh.delete_face(FaceId::new(2), true).unwrap();
        let maps = mesh.garbage_collection();

        assert!(!maps.face(FaceId::new(2)).is_valid());
        assert_eq!(maps.face(FaceId::new(0)), FaceId::new(0));
        // Faces after the deleted one shift down by one.
        assert_eq!(maps.face(FaceId::new(3)), FaceId::new(2));
        assert_eq!(maps.face(FaceId::new(5)), FaceId::new(4));
        // Dense: all live handles are < the new count.
        assert!(mesh.faces().all(|f| f.index() < mesh.num_faces()));
    }

    #[test]
    fn test_gc_idempotent() {
        let mut mesh = quad_box();
        mesh.vertex_props_mut().create::<u32>("tag", 0, false).unwrap();
        for i in 0..mesh.num_vertices() {
            mesh.vertex_props_mut().set::<u32>("tag", i, i as u32 * 10).unwrap();
        }
        mesh.delete_face(FaceId::new(1), true).unwrap();
        mesh.garbage_collection();
        let (nv, ne, nf) = (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces());
        let before: Vec<(VertexId, HalfEdgeId)> = mesh
            .halfedges()
            .map(|h| (mesh.to_vertex(h), mesh.next_halfedge(h)))
            .collect();
        let tags_before = mesh.vertex_props().values::<u32>("tag").unwrap().to_vec();

        let maps = mesh.garbage_collection();
        assert_eq!(mesh.num_vertices(), nv);
        assert_eq!(mesh.num_edges(), ne);
        assert_eq!(mesh.num_faces(), nf);
        let after: Vec<(VertexId, HalfEdgeId)> = mesh
            .halfedges()
            .map(|h| (mesh.to_vertex(h), mesh.next_halfedge(h)))
            .collect();
        assert_eq!(before, after);
        // Property contents are reproduced exactly by the second pass.
        assert_eq!(mesh.vertex_props().values::<u32>("tag").unwrap(), &tags_before[..]);
        // Second pass maps every element to itself.
        assert!((0..nv).all(|i| maps.vertices[i] == VertexId::new(i)));
    }

    #[test]
    fn test_property_length_invariant() {
        let mut mesh = Connectivity::new();
        mesh.vertex_props_mut().create::<i32>("tag", 0, false).unwrap();
        mesh.face_props_mut().create::<f64>("area", 0.0, false).unwrap();

        let v: Vec<VertexId> = (0..4).map(|_| mesh.add_vertex()).collect();
        mesh.add_face(&[v[0], v[1], v[2]]).unwrap();
        mesh.add_face(&[v[0], v[2], v[3]]).unwrap();
        assert_eq!(mesh.vertex_props().len(), mesh.num_vertices());
        assert_eq!(mesh.face_props().len(), mesh.num_faces());
        assert_eq!(mesh.halfedge_props().len(), mesh.num_halfedges());
        assert_eq!(mesh.edge_props().len(), mesh.num_edges());

        mesh.delete_face(FaceId::new(0), false).unwrap();
        assert_eq!(mesh.face_props().len(), mesh.num_faces());
        mesh.garbage_collection();
        assert_eq!(mesh.vertex_props().len(), mesh.num_vertices());
        assert_eq!(mesh.face_props().len(), mesh.num_faces());
    }

    #[test]
    fn test_property_survives_growth() {
        let mut mesh = Connectivity::new();
        for _ in 0..3 {
            mesh.add_vertex();
        }
        mesh.vertex_props_mut().create::<i32>("tag", 0, false).unwrap();
        mesh.vertex_props_mut().set::<i32>("tag", 2, 7).unwrap();
        for _ in 0..3 {
            mesh.add_vertex();
        }
        assert_eq!(mesh.vertex_props().get::<i32>("tag", 2).unwrap(), 7);
        assert_eq!(mesh.vertex_props().get::<i32>("tag", 5).unwrap(), 0);
    }

    #[test]
    fn test_property_follows_gc() {
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..4).map(|_| mesh.add_vertex()).collect();
        mesh.add_face(&[v[0], v[1], v[2]]).unwrap();
        mesh.vertex_props_mut().create::<u32>("id", 0, false).unwrap();
        for (i, vid) in v.iter().enumerate() {
            mesh.vertex_props_mut()
                .set::<u32>("id", vid.index(), i as u32 * 10)
                .unwrap();
        }
        // v3 is isolated; mark it deleted and compact.
        mesh.vertex_status_mut(v[3]).set_deleted(true);
        mesh.garbage_collection();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(
            mesh.vertex_props().values::<u32>("id").unwrap(),
            &[0, 10, 20]
        );
    }

    #[test]
    fn test_collapse_interior_edge() {
        let mut mesh = octahedron();
        let h = mesh
            .find_halfedge(VertexId::new(0), VertexId::new(2))
            .unwrap();
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse(h).unwrap();

        // The from-vertex is gone and nothing points at it anymore.
        assert!(mesh.vertex_status(VertexId::new(0)).deleted());
        for he in mesh.halfedges() {
            assert_ne!(mesh.to_vertex(he), VertexId::new(0));
        }
        mesh.garbage_collection();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 6);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collapse_boundary_edge() {
        let mut mesh = two_triangles();
        let h = mesh
            .find_halfedge(VertexId::new(1), VertexId::new(2))
            .unwrap();
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse(h).unwrap();
        assert!(mesh.is_valid());

        // The incident triangle degenerated and is gone with its vertex.
        assert!(mesh.vertex_status(VertexId::new(1)).deleted());

        // The collapsed edge is deleted; collapsing it again is illegal.
        assert!(!mesh.is_collapse_ok(h));
        assert!(matches!(
            mesh.collapse(h),
            Err(MeshError::IllegalCollapse(_))
        ));

        mesh.garbage_collection();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_edges(), 3);
    }

    #[test]
    fn test_collapse_boundary_pinch_rejected() {
        // A strip of two triangles around an interior edge whose endpoints
        // are both boundary vertices: collapsing would pinch the surface.
        let mut mesh = Connectivity::new();
        let v: Vec<VertexId> = (0..4).map(|_| mesh.add_vertex()).collect();
        mesh.add_face(&[v[0], v[1], v[2]]).unwrap();
        mesh.add_face(&[v[2], v[1], v[3]]).unwrap();
        // Edge 1-2 is interior, vertices 1 and 2 are both on the boundary.
        let h = mesh.find_halfedge(v[1], v[2]).unwrap();
        assert!(!mesh.is_collapse_ok(h));
    }

    #[test]
    fn test_clear() {
        let mut mesh = two_triangles();
        mesh.vertex_props_mut().create::<i32>("tag", 0, false).unwrap();
        mesh.clear();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_faces(), 0);
        // The store survives at length zero and regrows with new elements.
        assert!(mesh.vertex_props().contains("tag"));
        mesh.add_vertex();
        assert_eq!(mesh.vertex_props().get::<i32>("tag", 0).unwrap(), 0);
    }

    #[test]
    fn test_clean() {
        let mut mesh = two_triangles();
        mesh.vertex_props_mut().create::<i32>("tag", 0, false).unwrap();
        mesh.vertex_status_mut(VertexId::new(0)).set_tagged(true);
        mesh.clean();
        assert!(!mesh.vertex_props().contains("tag"));
        assert!(!mesh.vertex_status(VertexId::new(0)).tagged());
        // Connectivity untouched.
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.is_valid());
    }
}
