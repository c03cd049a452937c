//! Sentinel-based node identifiers.
//!
//! Nodes link to each other through arena slot indices rather than pointers.
//! A reserved sentinel (`u32::MAX`) stands in for "no node", which keeps links
//! at four bytes instead of the eight an `Option<u32>` would need.

use core::fmt;

/// Index of a node slot inside the queue's arena.
///
/// `NodeId::NONE` is the empty sentinel used for unset `head`, `tail`,
/// `prev` and `next` links.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    /// The "no node" sentinel.
    pub(crate) const NONE: Self = Self(u32::MAX);

    /// Number of addressable slots. The sentinel value is never handed out.
    pub(crate) const MAX_SLOTS: usize = u32::MAX as usize;

    /// Builds an id from a slot position.
    ///
    /// Callers must keep `slot < MAX_SLOTS`.
    #[inline]
    pub(crate) const fn from_slot(slot: usize) -> Self {
        debug_assert!(slot < Self::MAX_SLOTS);
        Self(slot as u32)
    }

    /// Slot position in the arena.
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub(crate) const fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}
