//! Half-edge mesh data structures.
//!
//! The [`Connectivity`] kernel stores pure adjacency; [`PolyMesh`] layers
//! vertex positions and geometry queries on top of it. Elements are
//! addressed by the typed handles in [`index`], carry [`Status`] flags, and
//! can hold arbitrary named attributes through [`PropertyContainer`].

mod circulator;
mod connectivity;
mod index;
mod iter;
mod polymesh;
mod property;
mod status;

pub use circulator::{FaceHalfEdgeIter, IncomingHalfEdgeIter, OutgoingHalfEdgeIter};
pub use connectivity::{CompactionMaps, Connectivity, FaceKind};
pub use index::{EdgeId, FaceId, HalfEdgeId, VertexId};
pub use iter::{EdgeIter, FaceIter, HalfEdgeIter, VertexIter};
pub use polymesh::{PolyMesh, FACE_COLOR, VERTEX_NORMAL, VERTEX_TEXCOORD};
pub use property::PropertyContainer;
pub use status::Status;
