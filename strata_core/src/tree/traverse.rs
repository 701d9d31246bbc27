// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use core::slice;

use super::id::NodeId;
use super::store::GroupTree;

/// An iterator over the direct children of a node.
///
/// Created by [`GroupTree::children`].
#[derive(Debug, Clone)]
pub struct Children<'a> {
    tree: &'a GroupTree,
    slots: slice::Iter<'a, u32>,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a GroupTree, slots: &'a [u32]) -> Self {
        Self {
            tree,
            slots: slots.iter(),
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.slots.next().map(|&idx| self.tree.id_at(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        self.slots.next_back().map(|&idx| self.tree.id_at(idx))
    }
}

impl ExactSizeIterator for Children<'_> {}

/// An iterator over nodes in flat order (depth-first pre-order).
///
/// Created by [`GroupTree::flat_order`].
#[derive(Debug, Clone)]
pub struct FlatOrder<'a> {
    tree: &'a GroupTree,
    slots: slice::Iter<'a, u32>,
}

impl<'a> FlatOrder<'a> {
    pub(crate) fn new(tree: &'a GroupTree) -> Self {
        Self {
            tree,
            slots: tree.traversal_order.iter(),
        }
    }
}

impl Iterator for FlatOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.slots.next().map(|&idx| self.tree.id_at(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl ExactSizeIterator for FlatOrder<'_> {}
