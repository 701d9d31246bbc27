// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity types.

use core::fmt;

/// Sentinel value indicating "no node" in slot index fields.
pub const INVALID: u32 = u32::MAX;

/// Slot of the root sentinel group.
pub(crate) const ROOT_SLOT: u32 = 0;

/// A handle to a node in a [`GroupTree`](super::GroupTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused. Since a
/// slot's generation only ever increases, a `NodeId` is never handed out twice
/// within one tree's lifetime, which makes it safe to use as a set member or a
/// map key while the node's children change.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl NodeId {
    /// The root sentinel group. It is never part of the flat order and cannot
    /// be selected, moved, or removed.
    pub const ROOT: Self = Self {
        idx: ROOT_SLOT,
        generation: 0,
    };

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Whether this is the root sentinel.
    #[inline]
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.idx == ROOT_SLOT
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("NodeId(root)")
        } else {
            write!(f, "NodeId({}@gen{})", self.idx, self.generation)
        }
    }
}
