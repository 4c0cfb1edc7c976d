//! Polygon mesh: connectivity plus vertex positions and geometry queries.
//!
//! [`PolyMesh`] pairs the [`Connectivity`] kernel with one 3D point per
//! vertex and keeps the two in lockstep: vertices are added through
//! [`PolyMesh::add_vertex`], and garbage collection compacts the point
//! array with the same permutation as the vertex array.
//!
//! All read-only kernel queries are available directly on the mesh via
//! `Deref`; mutating kernel operations are forwarded explicitly so the
//! point array can never drift out of sync.

use std::ops::Deref;

use nalgebra::{Point3, Vector2, Vector3};

use crate::error::{MeshError, Result};

use super::connectivity::{CompactionMaps, Connectivity, FaceKind};
use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// Reserved vertex property name for normals.
pub const VERTEX_NORMAL: &str = "v:normal";
/// Reserved vertex property name for 2D texture coordinates.
pub const VERTEX_TEXCOORD: &str = "v:texcoord";
/// Reserved face property name for RGB colors.
pub const FACE_COLOR: &str = "f:color";

/// A polygonal surface mesh with embedded vertex positions.
#[derive(Default)]
pub struct PolyMesh {
    topology: Connectivity,
    points: Vec<Point3<f64>>,
}

impl Deref for PolyMesh {
    type Target = Connectivity;

    fn deref(&self) -> &Connectivity {
        &self.topology
    }
}

impl PolyMesh {
    /// Create an empty polygonal mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh that only accepts triangles.
    pub fn triangular() -> Self {
        Self {
            topology: Connectivity::with_kind(FaceKind::Triangular),
            points: Vec::new(),
        }
    }

    /// Create an empty mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_edges: usize, num_faces: usize) -> Self {
        Self {
            topology: Connectivity::with_capacity(num_vertices, num_edges, num_faces),
            points: Vec::with_capacity(num_vertices),
        }
    }

    /// The underlying connectivity kernel.
    pub fn topology(&self) -> &Connectivity {
        &self.topology
    }

    // ==================== Vertices and positions ====================

    /// Add a vertex at the given position.
    pub fn add_vertex(&mut self, point: Point3<f64>) -> VertexId {
        let v = self.topology.add_vertex();
        self.points.push(point);
        v
    }

    /// The position of a vertex.
    ///
    /// Panics if the handle is out of bounds; see [`PolyMesh::try_point`]
    /// for a checked variant.
    #[inline]
    pub fn point(&self, v: VertexId) -> &Point3<f64> {
        &self.points[v.index()]
    }

    /// The position of a vertex, checked.
    pub fn try_point(&self, v: VertexId) -> Result<&Point3<f64>> {
        self.points.get(v.index()).ok_or(MeshError::InvalidHandle {
            kind: "vertex",
            index: v.index(),
            len: self.points.len(),
        })
    }

    /// Move a vertex.
    #[inline]
    pub fn set_point(&mut self, v: VertexId, point: Point3<f64>) {
        self.points[v.index()] = point;
    }

    /// All vertex positions, indexed by vertex handle.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    // ==================== Forwarded mutations ====================

    /// Add a face over an ordered ring of vertices.
    /// See [`Connectivity::add_face`].
    pub fn add_face(&mut self, verts: &[VertexId]) -> Result<FaceId> {
        self.topology.add_face(verts)
    }

    /// Add a triangle.
    pub fn add_triangle(&mut self, v0: VertexId, v1: VertexId, v2: VertexId) -> Result<FaceId> {
        self.topology.add_face(&[v0, v1, v2])
    }

    /// Mark a vertex and its incident faces deleted.
    /// See [`Connectivity::delete_vertex`].
    pub fn delete_vertex(&mut self, v: VertexId, delete_isolated: bool) -> Result<()> {
        self.topology.delete_vertex(v, delete_isolated)
    }

    /// Mark an edge and its incident faces deleted.
    /// See [`Connectivity::delete_edge`].
    pub fn delete_edge(&mut self, e: EdgeId, delete_isolated: bool) -> Result<()> {
        self.topology.delete_edge(e, delete_isolated)
    }

    /// Mark a face deleted. See [`Connectivity::delete_face`].
    pub fn delete_face(&mut self, f: FaceId, delete_isolated: bool) -> Result<()> {
        self.topology.delete_face(f, delete_isolated)
    }

    /// Collapse a half-edge, merging its from-vertex into its to-vertex.
    /// The kept vertex stays at its current position; move it with
    /// [`PolyMesh::set_point`] before or after the collapse as needed.
    /// See [`Connectivity::collapse`].
    pub fn collapse(&mut self, h: HalfEdgeId) -> Result<()> {
        self.topology.collapse(h)
    }

    /// Compact all arrays, dropping soft-deleted elements. The point array
    /// follows the vertex permutation. See
    /// [`Connectivity::garbage_collection`].
    pub fn garbage_collection(&mut self) -> CompactionMaps {
        let maps = self.topology.garbage_collection();
        let points: Vec<Point3<f64>> = self
            .points
            .iter()
            .enumerate()
            .filter(|&(old, _)| maps.vertices[old].is_valid())
            .map(|(_, &p)| p)
            .collect();
        self.points = points;
        maps
    }

    /// Reset to an empty mesh. See [`Connectivity::clear`].
    pub fn clear(&mut self) {
        self.topology.clear();
        self.points.clear();
    }

    /// Drop all property stores and transient status bits.
    /// See [`Connectivity::clean`].
    pub fn clean(&mut self) {
        self.topology.clean();
    }

    /// Mutable status access, forwarded.
    pub fn vertex_status_mut(&mut self, v: VertexId) -> &mut super::status::Status {
        self.topology.vertex_status_mut(v)
    }

    /// Mutable vertex property container, forwarded.
    pub fn vertex_props_mut(&mut self) -> &mut super::property::PropertyContainer {
        self.topology.vertex_props_mut()
    }

    /// Mutable half-edge property container, forwarded.
    pub fn halfedge_props_mut(&mut self) -> &mut super::property::PropertyContainer {
        self.topology.halfedge_props_mut()
    }

    /// Mutable edge property container, forwarded.
    pub fn edge_props_mut(&mut self) -> &mut super::property::PropertyContainer {
        self.topology.edge_props_mut()
    }

    /// Mutable face property container, forwarded.
    pub fn face_props_mut(&mut self) -> &mut super::property::PropertyContainer {
        self.topology.face_props_mut()
    }

    // ==================== Standard attributes ====================

    /// Register the per-vertex normal attribute.
    pub fn request_vertex_normals(&mut self) -> Result<()> {
        self.topology
            .vertex_props_mut()
            .create::<Vector3<f64>>(VERTEX_NORMAL, Vector3::zeros(), false)
    }

    /// Whether per-vertex normals are registered.
    pub fn has_vertex_normals(&self) -> bool {
        self.vertex_props().contains(VERTEX_NORMAL)
    }

    /// The stored normal of a vertex.
    pub fn vertex_normal(&self, v: VertexId) -> Result<Vector3<f64>> {
        self.vertex_props().get(VERTEX_NORMAL, v.index())
    }

    /// Store a normal for a vertex.
    pub fn set_vertex_normal(&mut self, v: VertexId, normal: Vector3<f64>) -> Result<()> {
        self.topology
            .vertex_props_mut()
            .set(VERTEX_NORMAL, v.index(), normal)
    }

    /// Register the per-vertex texture coordinate attribute.
    pub fn request_vertex_texcoords(&mut self) -> Result<()> {
        self.topology
            .vertex_props_mut()
            .create::<Vector2<f64>>(VERTEX_TEXCOORD, Vector2::zeros(), false)
    }

    /// Whether per-vertex texture coordinates are registered.
    pub fn has_vertex_texcoords(&self) -> bool {
        self.vertex_props().contains(VERTEX_TEXCOORD)
    }

    /// The stored texture coordinate of a vertex.
    pub fn vertex_texcoord(&self, v: VertexId) -> Result<Vector2<f64>> {
        self.vertex_props().get(VERTEX_TEXCOORD, v.index())
    }

    /// Store a texture coordinate for a vertex.
    pub fn set_vertex_texcoord(&mut self, v: VertexId, uv: Vector2<f64>) -> Result<()> {
        self.topology
            .vertex_props_mut()
            .set(VERTEX_TEXCOORD, v.index(), uv)
    }

    /// Register the per-face color attribute.
    pub fn request_face_colors(&mut self) -> Result<()> {
        self.topology
            .face_props_mut()
            .create::<Vector3<f64>>(FACE_COLOR, Vector3::zeros(), false)
    }

    /// Whether per-face colors are registered.
    pub fn has_face_colors(&self) -> bool {
        self.face_props().contains(FACE_COLOR)
    }

    /// The stored color of a face.
    pub fn face_color(&self, f: FaceId) -> Result<Vector3<f64>> {
        self.face_props().get(FACE_COLOR, f.index())
    }

    /// Store an RGB color for a face.
    pub fn set_face_color(&mut self, f: FaceId, color: Vector3<f64>) -> Result<()> {
        self.topology
            .face_props_mut()
            .set(FACE_COLOR, f.index(), color)
    }

    // ==================== Geometry ====================

    /// The vector along a half-edge, from tail to head.
    pub fn halfedge_vector(&self, h: HalfEdgeId) -> Vector3<f64> {
        self.point(self.to_vertex(h)) - self.point(self.from_vertex(h))
    }

    /// The length of an edge.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        self.halfedge_vector(e.halfedge(false)).norm()
    }

    /// The midpoint of an edge.
    pub fn edge_midpoint(&self, e: EdgeId) -> Point3<f64> {
        let h = e.halfedge(false);
        nalgebra::center(self.point(self.from_vertex(h)), self.point(self.to_vertex(h)))
    }

    /// The unit normal of a face, by the Newell method.
    ///
    /// Exact for planar polygons and a least-squares fit for non-planar
    /// ones; for a degenerate (zero-area) face the zero vector is returned.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let mut normal = Vector3::<f64>::zeros();
        for h in self.face_halfedges(f) {
            let p = self.point(self.from_vertex(h));
            let q = self.point(self.to_vertex(h));
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }
        let norm = normal.norm();
        if norm > 0.0 {
            normal / norm
        } else {
            Vector3::zeros()
        }
    }

    /// The area of a face (half the Newell vector's magnitude).
    pub fn face_area(&self, f: FaceId) -> f64 {
        let mut normal = Vector3::zeros();
        for h in self.face_halfedges(f) {
            let p = self.point(self.from_vertex(h));
            let q = self.point(self.to_vertex(h));
            normal += p.coords.cross(&q.coords);
        }
        normal.norm() / 2.0
    }

    /// The centroid (vertex average) of a face.
    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        let mut sum = Vector3::zeros();
        let mut count = 0;
        for v in self.face_vertices(f) {
            sum += self.point(v).coords;
            count += 1;
        }
        Point3::from(sum / count as f64)
    }

    /// The area-weighted normal of a vertex, averaged over incident faces.
    pub fn compute_vertex_normal(&self, v: VertexId) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            normal += self.face_normal(f) * self.face_area(f);
        }
        let norm = normal.norm();
        if norm > 0.0 {
            normal / norm
        } else {
            Vector3::zeros()
        }
    }

    /// Compute and store normals for all live vertices. Registers the
    /// normal attribute if absent.
    pub fn update_vertex_normals(&mut self) -> Result<()> {
        if !self.has_vertex_normals() {
            self.request_vertex_normals()?;
        }
        let normals: Vec<(VertexId, Vector3<f64>)> = self
            .vertices()
            .map(|v| (v, self.compute_vertex_normal(v)))
            .collect();
        for (v, n) in normals {
            self.set_vertex_normal(v, n)?;
        }
        Ok(())
    }

    /// Total surface area over live faces.
    pub fn surface_area(&self) -> f64 {
        self.faces().map(|f| self.face_area(f)).sum()
    }

    /// Axis-aligned bounding box over live vertices, or `None` for a mesh
    /// with no live vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut verts = self.vertices();
        let first = *self.point(verts.next()?);
        let mut min = first;
        let mut max = first;
        for v in verts {
            let p = self.point(v);
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some((min, max))
    }
}
