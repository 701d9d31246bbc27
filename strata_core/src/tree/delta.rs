// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat-order maintenance and change draining.
//!
//! Every successful mutation rebuilds the flat order immediately (see
//! [`GroupTree::commit`]), so queries never observe a stale cache. What *is*
//! deferred is change reporting: presentation layers call
//! [`take_delta`](GroupTree::take_delta) whenever they are ready to repaint,
//! and get every node touched since the previous call:
//!
//! 1. **STRUCTURE**: Drain with propagation. A node is reported when it was
//!    linked, unlinked, or when an ancestor was, since its nested index may
//!    have changed.
//! 2. **SELECTION**: Drain local marks left by the selection propagator.
//! 3. **NAME**: Drain local marks left by renames.
//! 4. **VISIBILITY**: Drain local marks left by visibility edits.
//!
//! Unlike the main-list events in the outbox, a [`TreeDelta`] is coalesced: a
//! node changed five times between two calls appears once.

use alloc::vec::Vec;

use super::id::{NodeId, ROOT_SLOT};
use super::store::GroupTree;
use crate::dirty;

/// The set of changes produced by a single [`GroupTree::take_delta`] call.
///
/// Nodes appear in ascending slot order. Stale handles (nodes destroyed after
/// being marked) and the root sentinel are filtered out of the change lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeDelta {
    /// Nodes whose parent, sibling offset, or nested index may have changed.
    pub structure: Vec<NodeId>,
    /// Nodes whose selection state flipped.
    pub selection: Vec<NodeId>,
    /// Groups that were renamed.
    pub renamed: Vec<NodeId>,
    /// Nodes whose visibility flag flipped.
    pub visibility: Vec<NodeId>,
    /// Nodes inserted since the last call.
    pub added: Vec<NodeId>,
    /// Nodes destroyed since the last call (now stale).
    pub removed: Vec<NodeId>,
    /// Whether the flat order was rebuilt since the last call.
    pub topology_changed: bool,
}

impl TreeDelta {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.structure.clear();
        self.selection.clear();
        self.renamed.clear();
        self.visibility.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
            && self.selection.is_empty()
            && self.renamed.is_empty()
            && self.visibility.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl GroupTree {
    /// Drains all dirty channels and lifecycle lists.
    pub fn take_delta(&mut self) -> TreeDelta {
        let mut delta = TreeDelta::default();
        self.take_delta_into(&mut delta);
        delta
    }

    /// Like [`take_delta`](Self::take_delta), but reuses a caller-provided
    /// buffer to avoid allocation.
    pub fn take_delta_into(&mut self, delta: &mut TreeDelta) {
        delta.clear();
        delta.topology_changed = core::mem::take(&mut self.topology_changed);

        let structure: Vec<u32> = self
            .dirty
            .drain(dirty::STRUCTURE)
            .affected()
            .deterministic()
            .run()
            .collect();
        delta.structure = self.live_ids(&structure);

        let selection: Vec<u32> = self
            .dirty
            .drain(dirty::SELECTION)
            .deterministic()
            .run()
            .collect();
        delta.selection = self.live_ids(&selection);

        let renamed: Vec<u32> = self
            .dirty
            .drain(dirty::NAME)
            .deterministic()
            .run()
            .collect();
        delta.renamed = self.live_ids(&renamed);

        let visibility: Vec<u32> = self
            .dirty
            .drain(dirty::VISIBILITY)
            .deterministic()
            .run()
            .collect();
        delta.visibility = self.live_ids(&visibility);

        let added = core::mem::take(&mut self.pending_added);
        delta.added = self.live_ids(&added);
        core::mem::swap(&mut self.pending_removed, &mut delta.removed);
    }

    /// Returns the raw slots of every node in flat order (depth-first
    /// pre-order, root excluded).
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    fn live_ids(&self, slots: &[u32]) -> Vec<NodeId> {
        slots
            .iter()
            .filter(|&&s| s != ROOT_SLOT && self.nodes.get(s as usize).is_some_and(Option::is_some))
            .map(|&s| self.id_at(s))
            .collect()
    }

    /// Rebuilds the depth-first pre-order traversal, flat positions, and
    /// subtree sizes.
    pub(super) fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        self.flat_position.fill(super::id::INVALID);
        self.subtree_len.fill(0);
        self.dfs_collect(ROOT_SLOT);
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn dfs_collect(&mut self, idx: u32) {
        let start = self.traversal_order.len();
        if idx != ROOT_SLOT {
            self.flat_position[idx as usize] = start as u32;
            self.traversal_order.push(idx);
        }
        let mut i = 0;
        while let Some(&child) = self.slot(idx).child_slots().get(i) {
            self.dfs_collect(child);
            i += 1;
        }
        self.subtree_len[idx as usize] = (self.traversal_order.len() - start) as u32;
    }
}
