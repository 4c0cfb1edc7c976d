//! Handle types for mesh elements.
//!
//! Handles are type-safe, copyable indices into the kernel's element arrays.
//! They carry no ownership: a handle stays cheap to copy and compare, and
//! `u32::MAX` serves as the invalid/null sentinel. Handles of different
//! element kinds are distinct types and never convert into each other.

use std::fmt::{self, Debug};

pub(crate) const INVALID_INDEX: u32 = u32::MAX;

/// A type-safe vertex handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe half-edge handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

/// A type-safe edge handle (a full edge, i.e. a pair of half-edges).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId(u32);

/// A type-safe face handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new handle from a raw index.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID_INDEX as usize);
                Self(index as u32)
            }

            /// Create an invalid/null handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID_INDEX)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) handle.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID_INDEX
            }

            /// Reset this handle to the invalid sentinel.
            #[inline]
            pub fn invalidate(&mut self) {
                self.0 = INVALID_INDEX;
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(EdgeId, "E");
impl_index_type!(FaceId, "F");

impl HalfEdgeId {
    /// The opposite half-edge. Half-edges are stored as adjacent pairs, so
    /// the twin is always the pair neighbor.
    #[inline]
    pub fn opposite(self) -> HalfEdgeId {
        HalfEdgeId(self.0 ^ 1)
    }

    /// The full edge this half-edge belongs to.
    #[inline]
    pub fn edge(self) -> EdgeId {
        EdgeId(self.0 >> 1)
    }

    /// Which side of its edge this half-edge is (0 or 1).
    #[inline]
    pub(crate) fn side(self) -> usize {
        (self.0 & 1) as usize
    }
}

impl EdgeId {
    /// One of the two half-edges of this edge.
    #[inline]
    pub fn halfedge(self, side: bool) -> HalfEdgeId {
        HalfEdgeId((self.0 << 1) | side as u32)
    }

    /// Both half-edges of this edge.
    #[inline]
    pub fn halfedges(self) -> (HalfEdgeId, HalfEdgeId) {
        (self.halfedge(false), self.halfedge(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());

        let invalid = VertexId::invalid();
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_invalidate() {
        let mut v = VertexId::new(7);
        v.invalidate();
        assert!(!v.is_valid());
        assert_eq!(v, VertexId::default());
    }

    #[test]
    fn test_type_safety() {
        // These are different types and cannot be mixed
        let v = VertexId::new(0);
        let he = HalfEdgeId::new(0);
        let f = FaceId::new(0);

        // All have the same raw value but are distinct types
        assert_eq!(v.index(), he.index());
        assert_eq!(he.index(), f.index());
    }

    #[test]
    fn test_halfedge_pairing() {
        let h = HalfEdgeId::new(6);
        assert_eq!(h.opposite(), HalfEdgeId::new(7));
        assert_eq!(h.opposite().opposite(), h);
        assert_eq!(h.edge(), EdgeId::new(3));
        assert_eq!(h.edge().halfedges(), (h, h.opposite()));
    }

    #[test]
    fn test_debug_format() {
        let v = VertexId::new(42);
        assert_eq!(format!("{:?}", v), "V(42)");

        let invalid = VertexId::invalid();
        assert_eq!(format!("{:?}", invalid), "V(INVALID)");
    }
}
