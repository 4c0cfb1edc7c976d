//! Quadric Error Metrics (QEM) decimation.
//!
//! Iteratively collapses the edge with the lowest quadric error until a
//! target face count is reached (Garland & Heckbert, SIGGRAPH '97). Each
//! vertex accumulates a quadric matrix measuring the squared distance to
//! the planes of its original faces; collapsing an edge merges the two
//! endpoint quadrics and moves the surviving vertex to the position
//! minimizing the merged error.
//!
//! Collapses run directly on the kernel's collapse primitive, so all
//! registered properties and statuses stay consistent throughout; the mesh
//! is garbage-collected once at the end.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::{Matrix4, Point3, Vector4};

use crate::error::Result;
use crate::mesh::{HalfEdgeId, PolyMesh, VertexId};

/// Temporary per-vertex property holding the collapse version counter.
const VERSION_PROP: &str = "decimate:version";

/// Options for mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimateOptions {
    /// Target number of faces after decimation.
    /// If `None`, `target_ratio` is used instead.
    pub target_faces: Option<usize>,

    /// Target ratio of faces to keep (0.0 to 1.0).
    /// Only used if `target_faces` is `None`.
    pub target_ratio: f64,

    /// Whether to preserve boundary edges (don't collapse them).
    pub preserve_boundary: bool,

    /// Maximum allowed error for a single edge collapse.
    /// Once the cheapest remaining collapse exceeds this, decimation stops.
    pub max_error: Option<f64>,
}

impl DecimateOptions {
    /// Create options to reduce to a target number of faces.
    pub fn with_target_faces(target: usize) -> Self {
        Self {
            target_faces: Some(target),
            target_ratio: 0.5,
            preserve_boundary: true,
            max_error: None,
        }
    }

    /// Create options to reduce to a ratio of the original face count.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_faces: None,
            target_ratio: ratio.clamp(0.0, 1.0),
            preserve_boundary: true,
            max_error: None,
        }
    }

    /// Set whether to preserve boundary edges.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set the maximum error threshold for edge collapses.
    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }

    /// Compute the target number of faces given the original count.
    pub fn compute_target(&self, original_faces: usize) -> usize {
        if let Some(target) = self.target_faces {
            target.min(original_faces)
        } else {
            ((original_faces as f64) * self.target_ratio).round() as usize
        }
    }
}

/// A quadric error matrix (4x4 symmetric matrix).
///
/// Represents the sum of squared distances to a set of planes.
/// Stored as 10 unique elements since the matrix is symmetric.
#[derive(Debug, Clone, Copy)]
struct Quadric {
    /// Upper triangular elements: [a, b, c, d, e, f, g, h, i, j]
    /// Matrix form:
    /// | a b c d |
    /// | b e f g |
    /// | c f h i |
    /// | d g i j |
    data: [f64; 10],
}

impl Quadric {
    fn zero() -> Self {
        Self { data: [0.0; 10] }
    }

    /// Create a quadric from a plane equation ax + by + cz + d = 0.
    /// The plane should be normalized (a² + b² + c² = 1).
    fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            data: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    fn add_assign(&mut self, other: &Quadric) {
        for i in 0..10 {
            self.data[i] += other.data[i];
        }
    }

    /// Evaluate the quadric error v^T * Q * v for v = [x, y, z, 1].
    fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);
        self.data[0] * x * x
            + 2.0 * self.data[1] * x * y
            + 2.0 * self.data[2] * x * z
            + 2.0 * self.data[3] * x
            + self.data[4] * y * y
            + 2.0 * self.data[5] * y * z
            + 2.0 * self.data[6] * y
            + self.data[7] * z * z
            + 2.0 * self.data[8] * z
            + self.data[9]
    }

    #[rustfmt::skip]
    fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new(
            self.data[0], self.data[1], self.data[2], self.data[3],
            self.data[1], self.data[4], self.data[5], self.data[6],
            self.data[2], self.data[5], self.data[7], self.data[8],
            self.data[3], self.data[6], self.data[8], self.data[9],
        )
    }

    /// Find the point minimizing the quadric error, or `None` if the
    /// system is singular (e.g. all planes parallel).
    fn optimal_point(&self) -> Option<Point3<f64>> {
        // Solve Q' * v = [0, 0, 0, 1]^T with the last row replaced by the
        // homogeneous constraint.
        let mut m = self.to_matrix();
        m[(3, 0)] = 0.0;
        m[(3, 1)] = 0.0;
        m[(3, 2)] = 0.0;
        m[(3, 3)] = 1.0;
        m.try_inverse().map(|inv| {
            let v = inv * Vector4::new(0.0, 0.0, 0.0, 1.0);
            Point3::new(v.x, v.y, v.z)
        })
    }
}

/// A half-edge collapse candidate in the priority queue.
#[derive(Debug, Clone)]
struct EdgeCandidate {
    /// The half-edge to collapse; its from-vertex merges into its to-vertex.
    halfedge: HalfEdgeId,
    /// From-vertex at creation time (removed by the collapse).
    v0: VertexId,
    /// To-vertex at creation time (kept).
    v1: VertexId,
    /// Position of the kept vertex after the collapse.
    optimal_pos: Point3<f64>,
    /// Error cost of this collapse.
    error: f64,
    /// Sum of the endpoint version counters at creation time; a mismatch
    /// at pop time marks the entry stale.
    version: u32,
}

impl PartialEq for EdgeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.error == other.error
    }
}

impl Eq for EdgeCandidate {}

impl PartialOrd for EdgeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering: BinaryHeap is a max-heap, we want minimum error.
        other
            .error
            .partial_cmp(&self.error)
            .unwrap_or(Ordering::Equal)
    }
}

fn vertex_version(mesh: &PolyMesh, v: VertexId) -> u32 {
    mesh.vertex_props()
        .get::<u32>(VERSION_PROP, v.index())
        .unwrap_or(0)
}

/// Build a collapse candidate for `h`, choosing the cheapest placement
/// among the quadric optimum, the endpoints, and the midpoint.
fn create_candidate(
    mesh: &PolyMesh,
    quadrics: &[Quadric],
    h: HalfEdgeId,
    version: u32,
) -> EdgeCandidate {
    let v0 = mesh.from_vertex(h);
    let v1 = mesh.to_vertex(h);
    let mut q = quadrics[v0.index()];
    q.add_assign(&quadrics[v1.index()]);

    let p0 = *mesh.point(v0);
    let p1 = *mesh.point(v1);
    let midpoint = nalgebra::center(&p0, &p1);
    let (optimal_pos, error) = match q.optimal_point() {
        Some(p) => (p, q.evaluate(&p)),
        None => {
            // Singular quadric: fall back to the best of the endpoints and
            // the midpoint.
            let mut best = (p1, q.evaluate(&p1));
            for p in [p0, midpoint] {
                let err = q.evaluate(&p);
                if err < best.1 {
                    best = (p, err);
                }
            }
            best
        }
    };
    EdgeCandidate {
        halfedge: h,
        v0,
        v1,
        optimal_pos,
        error: error.max(0.0),
        version,
    }
}

/// Decimate a mesh in place using quadric error metrics.
///
/// Collapses edges cheapest-first until the face target from `options` is
/// reached, no legal collapse remains, or the cheapest collapse exceeds
/// `max_error`. The mesh is garbage-collected before returning, so all
/// handles held across the call are stale.
pub fn qem_decimate(mesh: &mut PolyMesh, options: &DecimateOptions) -> Result<()> {
    let original_faces = mesh.faces().count();
    if original_faces == 0 {
        return Ok(());
    }
    let target_faces = options.compute_target(original_faces);
    if target_faces >= original_faces {
        return Ok(());
    }

    // Accumulate one plane quadric per face into its corner vertices.
    let mut quadrics = vec![Quadric::zero(); mesh.num_vertices()];
    for f in mesh.faces() {
        let normal = mesh.face_normal(f);
        if normal.norm() < 1e-10 {
            continue; // degenerate face
        }
        let origin = match mesh.face_vertices(f).next() {
            Some(v) => *mesh.point(v),
            None => continue,
        };
        let d = -normal.dot(&origin.coords);
        let q = Quadric::from_plane(normal.x, normal.y, normal.z, d);
        for v in mesh.face_vertices(f) {
            quadrics[v.index()].add_assign(&q);
        }
    }

    // Version counters detect stale heap entries after a neighborhood
    // changes; kept as a property so they follow any interleaved kernel
    // bookkeeping, and removed before returning.
    mesh.vertex_props_mut()
        .create::<u32>(VERSION_PROP, 0, false)?;

    let mut heap: BinaryHeap<EdgeCandidate> = BinaryHeap::new();
    for e in mesh.edges() {
        if options.preserve_boundary && mesh.is_boundary_edge(e) {
            continue;
        }
        heap.push(create_candidate(mesh, &quadrics, e.halfedge(false), 0));
    }

    let mut face_count = original_faces;
    let mut collapses = 0usize;
    while face_count > target_faces {
        let Some(candidate) = heap.pop() else {
            break;
        };
        let h = candidate.halfedge;

        // Stale or no longer applicable?
        if mesh.edge_status(h.edge()).deleted()
            || mesh.vertex_status(candidate.v0).deleted()
            || mesh.vertex_status(candidate.v1).deleted()
        {
            continue;
        }
        let version = vertex_version(mesh, candidate.v0) + vertex_version(mesh, candidate.v1);
        if version != candidate.version {
            continue;
        }
        if let Some(max_error) = options.max_error {
            if candidate.error > max_error {
                break;
            }
        }
        if options.preserve_boundary && mesh.is_boundary_edge(h.edge()) {
            continue;
        }
        if !mesh.is_collapse_ok(h) {
            continue;
        }

        // Triangular side faces disappear with the collapse.
        let removed_faces = [h, h.opposite()]
            .into_iter()
            .filter(|&side| {
                let f = mesh.halfedge_face(side);
                f.is_valid() && mesh.face_valence(f) == 3
            })
            .count();

        let v_keep = candidate.v1;
        let v_gone = candidate.v0;
        mesh.collapse(h)?;
        mesh.set_point(v_keep, candidate.optimal_pos);

        let gone_quadric = quadrics[v_gone.index()];
        quadrics[v_keep.index()].add_assign(&gone_quadric);
        let bumped = vertex_version(mesh, v_keep) + 1;
        mesh.vertex_props_mut()
            .set::<u32>(VERSION_PROP, v_keep.index(), bumped)?;

        face_count -= removed_faces;
        collapses += 1;

        // Re-queue the surviving vertex's ring with the new version.
        let ring: Vec<HalfEdgeId> = mesh.outgoing_halfedges(v_keep).collect();
        for out in ring {
            if options.preserve_boundary && mesh.is_boundary_edge(out.edge()) {
                continue;
            }
            let version = bumped + vertex_version(mesh, mesh.to_vertex(out));
            heap.push(create_candidate(mesh, &quadrics, out, version));
        }
    }

    mesh.vertex_props_mut().remove(VERSION_PROP)?;
    mesh.garbage_collection();
    log::debug!(
        "decimation: {collapses} collapses, {original_faces} -> {} faces (target {target_faces})",
        mesh.num_faces()
    );
    Ok(())
}
