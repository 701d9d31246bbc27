// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion between nested indices and flat positions.
//!
//! A [`NestedIndex`] is the path of sibling offsets leading from the root to a
//! node: `(0, 1)` is the second child of the root's first child. A *flat
//! position* is the node's index in the depth-first pre-order traversal of
//! the tree, where each group is counted immediately before its first child
//! and every node (group or leaf) occupies exactly one position:
//!
//! ```text
//!   root -> [G1 -> [A, B], C]
//!
//!   flat   nested   node
//!   0      (0)      G1
//!   1      (0, 0)   A
//!   2      (0, 1)   B
//!   3      (1)      C
//! ```
//!
//! Conversions read the tree's flat-order cache (traversal order, flat
//! positions, and subtree sizes). Every mutation rebuilds that cache before
//! returning, so conversions never observe stale sizes.

use alloc::vec::Vec;
use core::fmt;

use crate::error::{IndexError, NotFoundError};
use crate::tree::{FlatOrder, GroupTree, NodeId, ROOT_SLOT};

/// Path of sibling offsets from the root to a node.
///
/// The empty path designates the root sentinel, which has no flat position.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NestedIndex(Vec<usize>);

impl NestedIndex {
    /// The empty path (the root sentinel).
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this is the empty path.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of offsets in the path; the root's direct children have depth 1.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The offsets, outermost first.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Splits into the last offset and the parent path.
    #[must_use]
    pub fn split_last(&self) -> Option<(usize, &[usize])> {
        self.0.split_last().map(|(&last, rest)| (last, rest))
    }

    /// Path of the parent, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.split_last().map(|(_, rest)| Self(rest.to_vec()))
    }

    /// Path of the child at `offset`.
    #[must_use]
    pub fn child(&self, offset: usize) -> Self {
        let mut path = self.0.clone();
        path.push(offset);
        Self(path)
    }
}

impl From<Vec<usize>> for NestedIndex {
    fn from(path: Vec<usize>) -> Self {
        Self(path)
    }
}

impl From<&[usize]> for NestedIndex {
    fn from(path: &[usize]) -> Self {
        Self(path.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for NestedIndex {
    fn from(path: [usize; N]) -> Self {
        Self(path.to_vec())
    }
}

impl fmt::Display for NestedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, offset) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{offset}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for NestedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NestedIndex{self}")
    }
}

impl GroupTree {
    /// Converts a nested index into a flat position.
    ///
    /// Fails if any offset along the path is beyond its group's child count,
    /// if the path runs through a leaf, or if the path is empty.
    pub fn nested_to_flat(&self, index: &NestedIndex) -> Result<usize, IndexError> {
        let slot = self.slot_at_nested(index)?;
        Ok(self.flat_position[slot as usize] as usize)
    }

    /// Converts a flat position into a nested index.
    pub fn flat_to_nested(&self, position: usize) -> Result<NestedIndex, IndexError> {
        if position >= self.len() {
            return Err(IndexError::Flat {
                position,
                len: self.len(),
            });
        }
        // Descend using subtree sizes: the child whose run contains the
        // target is the next step of the path.
        let mut path = Vec::new();
        let mut group = ROOT_SLOT;
        let mut start = 0_usize;
        loop {
            let mut found = None;
            for (offset, &child) in self.slot(group).child_slots().iter().enumerate() {
                let len = self.subtree_len[child as usize] as usize;
                if position < start + len {
                    found = Some((offset, child));
                    break;
                }
                start += len;
            }
            let Some((offset, child)) = found else {
                return Err(IndexError::Flat {
                    position,
                    len: self.len(),
                });
            };
            path.push(offset);
            if start == position {
                return Ok(NestedIndex(path));
            }
            group = child;
            // Skip the group's own slot.
            start += 1;
        }
    }

    /// The node at a flat position.
    pub fn node_at_flat(&self, position: usize) -> Result<NodeId, IndexError> {
        self.traversal_order
            .get(position)
            .map(|&slot| self.id_at(slot))
            .ok_or(IndexError::Flat {
                position,
                len: self.len(),
            })
    }

    /// The node at a nested index.
    pub fn node_at_nested(&self, index: &NestedIndex) -> Result<NodeId, IndexError> {
        self.slot_at_nested(index).map(|slot| self.id_at(slot))
    }

    /// Flat position of a node.
    pub fn flat_position(&self, id: NodeId) -> Result<usize, NotFoundError> {
        let idx = self.resolve_member(id)?;
        Ok(self.flat_position[idx as usize] as usize)
    }

    /// Nested index of a node; the root yields the empty path.
    pub fn nested_index(&self, id: NodeId) -> Result<NestedIndex, NotFoundError> {
        let mut idx = self.resolve(id)?;
        let mut path = Vec::new();
        while idx != ROOT_SLOT {
            path.push(self.offset_in_parent(idx));
            idx = self.parent[idx as usize];
        }
        path.reverse();
        Ok(NestedIndex(path))
    }

    /// Every node in flat order.
    pub fn flat_order(&self) -> FlatOrder<'_> {
        FlatOrder::new(self)
    }

    /// Every leaf in flat order.
    pub fn leaf_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.traversal_order
            .iter()
            .filter(|&&slot| !self.slot(slot).is_group())
            .map(|&slot| self.id_at(slot))
    }

    fn slot_at_nested(&self, index: &NestedIndex) -> Result<u32, IndexError> {
        if index.is_root() {
            return Err(IndexError::Nested {
                index: index.clone(),
            });
        }
        let mut slot = ROOT_SLOT;
        for &offset in index.as_slice() {
            slot = self
                .slot(slot)
                .child_slots()
                .get(offset)
                .copied()
                .ok_or_else(|| IndexError::Nested {
                    index: index.clone(),
                })?;
        }
        Ok(slot)
    }
}
