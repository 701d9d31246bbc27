// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility flags.
//!
//! Every node carries a `visible` flag, `true` when created. Setting the flag
//! on a group sets it on the whole subtree; there is no upward derivation, so
//! a visible group may hold hidden children. Toggling flips leaves only, one
//! by one.
//!
//! Visibility is tree-side state: it never reaches the main list as an
//! operation. Flipped nodes are marked on the
//! [`VISIBILITY`](crate::dirty::VISIBILITY) channel so that a presentation
//! layer (or a host adapter pushing the flag onto its items) can pick them
//! up from the next [`TreeDelta`](crate::tree::TreeDelta).

use alloc::vec::Vec;

use crate::dirty;
use crate::error::NotFoundError;
use crate::tree::{GroupTree, NodeId};

impl GroupTree {
    /// Whether a node is visible. Unknown nodes are not.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.node(id).is_ok_and(|node| node.is_visible())
    }

    /// Sets the visibility of `ids` and all their descendants.
    ///
    /// Every node is validated first; an unknown node fails the whole call
    /// without changing anything.
    pub fn set_visible(&mut self, ids: &[NodeId], visible: bool) -> Result<(), NotFoundError> {
        let roots = self.resolve_all(ids)?;
        for idx in roots {
            for slot in self.subtree_slots(idx) {
                self.apply_visible(slot, visible);
            }
        }
        Ok(())
    }

    /// Flips the visibility of each leaf in `ids`. Groups are skipped.
    pub fn toggle_visibility(&mut self, ids: &[NodeId]) -> Result<(), NotFoundError> {
        let slots = self.resolve_all(ids)?;
        for idx in slots {
            let node = self.slot(idx);
            if !node.is_group() {
                let visible = !node.is_visible();
                self.apply_visible(idx, visible);
            }
        }
        Ok(())
    }

    /// Hidden leaves, in flat order.
    #[must_use]
    pub fn hidden_leaves(&self) -> Vec<NodeId> {
        self.leaf_order()
            .filter(|&id| !self.is_visible(id))
            .collect()
    }

    fn resolve_all(&self, ids: &[NodeId]) -> Result<Vec<u32>, NotFoundError> {
        ids.iter().map(|&id| self.resolve_member(id)).collect()
    }

    fn apply_visible(&mut self, slot: u32, visible: bool) {
        if self.slot_mut(slot).set_visible(visible) {
            self.dirty.mark(slot, dirty::VISIBILITY);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::item::ItemHandle;

    /// `root -> [G -> [A, H -> [B]], C]`
    fn tree() -> (GroupTree, [NodeId; 5]) {
        let mut tree = GroupTree::from_items(&[
            ItemHandle::leaf(1),
            ItemHandle::leaf(2),
            ItemHandle::leaf(3),
        ]);
        let a = tree.node_for_handle(ItemHandle::leaf(1)).unwrap();
        let b = tree.node_for_handle(ItemHandle::leaf(2)).unwrap();
        let c = tree.node_for_handle(ItemHandle::leaf(3)).unwrap();
        let h = tree.group_nodes(&[b], None).unwrap();
        let g = tree.group_nodes(&[a, h], None).unwrap();
        let _ = tree.take_delta();
        (tree, [g, a, h, b, c])
    }

    #[test]
    fn nodes_start_visible() {
        let (tree, ids) = tree();
        assert!(ids.iter().all(|&id| tree.is_visible(id)));
        assert!(tree.hidden_leaves().is_empty());
    }

    #[test]
    fn hiding_a_group_hides_its_subtree() {
        let (mut tree, [g, a, h, b, c]) = tree();
        tree.set_visible(&[g], false).unwrap();
        for id in [g, a, h, b] {
            assert!(!tree.is_visible(id), "{id:?} should be hidden");
        }
        assert!(tree.is_visible(c));
        assert_eq!(tree.hidden_leaves(), vec![a, b]);

        tree.set_visible(&[h], true).unwrap();
        assert!(tree.is_visible(b));
        assert!(!tree.is_visible(g), "no upward derivation");
    }

    #[test]
    fn toggle_flips_leaves_and_skips_groups() {
        let (mut tree, [g, a, _, b, c]) = tree();
        tree.toggle_visibility(&[g, a, c]).unwrap();
        assert!(tree.is_visible(g));
        assert!(!tree.is_visible(a));
        assert!(!tree.is_visible(c));
        assert!(tree.is_visible(b));
        tree.toggle_visibility(&[a]).unwrap();
        assert!(tree.is_visible(a));
    }

    #[test]
    fn unknown_node_changes_nothing() {
        let (mut tree, [g, a, ..]) = tree();
        let stale = tree.insert_item(NodeId::ROOT, 0, ItemHandle::leaf(9)).unwrap();
        tree.remove(stale).unwrap();
        let _ = tree.take_delta();

        assert_eq!(tree.set_visible(&[g, stale], false), Err(NotFoundError(stale)));
        assert_eq!(tree.toggle_visibility(&[a, NodeId::ROOT]), Err(NotFoundError(NodeId::ROOT)));
        assert!(tree.is_visible(g));
        assert!(tree.is_visible(a));
        assert!(tree.take_delta().visibility.is_empty());
    }

    #[test]
    fn flips_are_reported_in_delta() {
        let (mut tree, [g, a, h, b, c]) = tree();
        tree.set_visible(&[g], false).unwrap();
        let delta = tree.take_delta();
        assert_eq!(delta.visibility.len(), 4);
        for id in [g, a, h, b] {
            assert!(delta.visibility.contains(&id), "{id:?} flipped");
        }
        assert!(delta.structure.is_empty());

        tree.set_visible(&[c], true).unwrap();
        assert!(tree.take_delta().is_empty(), "unchanged flag is not reported");
    }

    #[test]
    fn visibility_survives_moves() {
        let (mut tree, [g, a, ..]) = tree();
        tree.set_visible(&[a], false).unwrap();
        tree.move_node(a, NodeId::ROOT, 2).unwrap();
        assert!(!tree.is_visible(a));
        tree.dissolve(g).unwrap();
        assert!(!tree.is_visible(a));
    }
}
