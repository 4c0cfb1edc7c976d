//! Status flags for mesh elements.
//!
//! Every element carries a small flag set. Deletion is soft: `DELETED` marks
//! an element as logically absent while its storage stays in place until the
//! next garbage collection pass.

use bitflags::bitflags;

bitflags! {
    /// Per-element status flags.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Element is logically removed; storage reclaimed on garbage collection.
        const DELETED = 1 << 0;
        /// Element must not be modified by algorithms.
        const LOCKED = 1 << 1;
        /// Element is selected.
        const SELECTED = 1 << 2;
        /// Scratch bit for algorithms.
        const TAGGED = 1 << 3;
        /// Element is hidden from presentation layers.
        const HIDDEN = 1 << 4;
        /// Element is a feature (e.g. a crease edge).
        const FEATURE = 1 << 5;
    }
}

impl Status {
    /// Check the deleted flag.
    #[inline]
    pub fn deleted(self) -> bool {
        self.contains(Status::DELETED)
    }

    /// Set or clear the deleted flag.
    #[inline]
    pub fn set_deleted(&mut self, on: bool) {
        self.set(Status::DELETED, on);
    }

    /// Check the locked flag.
    #[inline]
    pub fn locked(self) -> bool {
        self.contains(Status::LOCKED)
    }

    /// Set or clear the locked flag.
    #[inline]
    pub fn set_locked(&mut self, on: bool) {
        self.set(Status::LOCKED, on);
    }

    /// Check the tagged flag.
    #[inline]
    pub fn tagged(self) -> bool {
        self.contains(Status::TAGGED)
    }

    /// Set or clear the tagged flag.
    #[inline]
    pub fn set_tagged(&mut self, on: bool) {
        self.set(Status::TAGGED, on);
    }
}
