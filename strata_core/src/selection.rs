// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection propagation.
//!
//! Selection is stored per node and kept coherent in both directions:
//!
//! - **Downward**: selecting or deselecting a node applies to its whole
//!   subtree.
//! - **Upward**: after every operation, structural or not, a non-empty group
//!   is selected if and only if all of its children are. Empty groups keep
//!   whatever state they were given explicitly.
//!
//! Upward reconciliation walks the flat order backwards, so every group is
//! visited after all of its descendants. Each node whose state flips is
//! marked on the [`SELECTION`](crate::dirty::SELECTION) channel.
//!
//! Selection requests naming unknown or stale nodes ignore those nodes rather
//! than failing.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::dirty;
use crate::event::TreeChange;
use crate::tree::{GroupTree, NodeId};

impl GroupTree {
    /// Selects `ids` and all their descendants.
    ///
    /// Without `additive` the previous selection is replaced.
    pub fn select(&mut self, ids: &[NodeId], additive: bool) {
        self.edit_selection(|tree| {
            if !additive {
                tree.selection.clear();
            }
            for &id in ids {
                tree.select_subtree(id, true);
            }
        });
    }

    /// Deselects `ids` and all their descendants. Ancestors that no longer
    /// have every child selected are deselected as well.
    pub fn deselect(&mut self, ids: &[NodeId]) {
        self.edit_selection(|tree| {
            for &id in ids {
                tree.select_subtree(id, false);
            }
        });
    }

    /// Flips the selection state of each of `ids` (with its subtree), in
    /// order.
    pub fn toggle(&mut self, ids: &[NodeId]) {
        self.edit_selection(|tree| {
            for &id in ids {
                let on = !tree.selection.contains(&id);
                tree.select_subtree(id, on);
                tree.reconcile_selection();
            }
        });
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        self.edit_selection(|tree| tree.selection.clear());
    }

    /// Whether a node is selected. Unknown nodes are not.
    #[must_use]
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.contains(&id)
    }

    /// Every selected node, groups included, in flat order.
    #[must_use]
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.flat_order()
            .filter(|id| self.selection.contains(id))
            .collect()
    }

    /// The selected leaves.
    #[must_use]
    pub fn selected_leaves(&self) -> BTreeSet<NodeId> {
        self.selection
            .iter()
            .copied()
            .filter(|&id| self.node(id).is_ok_and(|node| !node.is_group()))
            .collect()
    }

    /// Flat positions of the selected leaves, ascending.
    #[must_use]
    pub fn selected_leaf_positions(&self) -> Vec<usize> {
        self.traversal_order
            .iter()
            .enumerate()
            .filter(|&(_, &slot)| {
                !self.slot(slot).is_group() && self.selection.contains(&self.id_at(slot))
            })
            .map(|(position, _)| position)
            .collect()
    }

    /// Re-derives the state of every non-empty group from its children.
    pub(crate) fn reconcile_selection(&mut self) {
        for i in (0..self.traversal_order.len()).rev() {
            let slot = self.traversal_order[i];
            let Some(group) = self.slot(slot).as_group() else {
                continue;
            };
            if group.is_empty() {
                continue;
            }
            let all = group
                .children
                .iter()
                .all(|&c| self.selection.contains(&self.id_at(c)));
            let id = self.id_at(slot);
            let flipped = if all {
                self.selection.insert(id)
            } else {
                self.selection.remove(&id)
            };
            if flipped {
                self.dirty.mark(slot, dirty::SELECTION);
            }
        }
    }

    fn select_subtree(&mut self, id: NodeId, on: bool) {
        let Ok(idx) = self.resolve_member(id) else {
            return;
        };
        for slot in self.subtree_slots(idx) {
            let id = self.id_at(slot);
            if on {
                self.selection.insert(id);
            } else {
                self.selection.remove(&id);
            }
        }
    }

    /// Runs a selection edit, reconciles groups, marks flipped nodes, and
    /// records a [`TreeChange::SelectionChanged`] if anything flipped.
    fn edit_selection(&mut self, edit: impl FnOnce(&mut Self)) {
        let before = self.selection.clone();
        edit(self);
        self.reconcile_selection();
        if before == self.selection {
            return;
        }

        let flipped: Vec<NodeId> = before
            .symmetric_difference(&self.selection)
            .copied()
            .collect();
        for id in flipped {
            self.dirty.mark(id.idx, dirty::SELECTION);
        }
        self.record(TreeChange::SelectionChanged {
            selected: self.selected_nodes(),
            leaf_positions: self.selected_leaf_positions(),
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::item::ItemHandle;

    /// `root -> [G -> [A, B], C]`
    fn tree() -> (GroupTree, [NodeId; 4]) {
        let mut tree = GroupTree::new();
        let a = tree.insert_item(NodeId::ROOT, 0, ItemHandle::leaf(1)).unwrap();
        let b = tree.insert_item(NodeId::ROOT, 1, ItemHandle::leaf(2)).unwrap();
        let c = tree.insert_item(NodeId::ROOT, 2, ItemHandle::leaf(3)).unwrap();
        let g = tree.group_nodes(&[a, b], None).unwrap();
        let _ = tree.take_events();
        (tree, [g, a, b, c])
    }

    /// Every non-empty group is selected iff all of its children are.
    fn assert_coherent(tree: &GroupTree) {
        for id in tree.flat_order() {
            let kids: Vec<_> = tree.children(id).unwrap().collect();
            if kids.is_empty() {
                continue;
            }
            let all = kids.iter().all(|&k| tree.is_selected(k));
            assert_eq!(tree.is_selected(id), all, "group {id:?} is incoherent");
        }
    }

    #[test]
    fn selecting_group_selects_descendants() {
        let (mut tree, [g, a, b, c]) = tree();
        tree.select(&[g], false);
        assert!(tree.is_selected(a));
        assert!(tree.is_selected(b));
        assert!(!tree.is_selected(c));
        assert_eq!(tree.selected_leaves(), BTreeSet::from([a, b]));
        assert_eq!(tree.selected_leaf_positions(), vec![1, 2]);
        assert_coherent(&tree);
    }

    #[test]
    fn selecting_all_children_selects_group() {
        let (mut tree, [g, a, b, _]) = tree();
        tree.select(&[a], false);
        assert!(!tree.is_selected(g));
        tree.select(&[b], true);
        assert!(tree.is_selected(g));
        assert_coherent(&tree);
    }

    #[test]
    fn deselecting_child_deselects_group() {
        let (mut tree, [g, a, b, _]) = tree();
        tree.select(&[g], false);
        tree.deselect(&[a]);
        assert!(!tree.is_selected(g));
        assert!(tree.is_selected(b));
        assert_coherent(&tree);
    }

    #[test]
    fn replace_vs_additive() {
        let (mut tree, [_, a, _, c]) = tree();
        tree.select(&[a], false);
        tree.select(&[c], false);
        assert!(!tree.is_selected(a));
        tree.select(&[a], true);
        assert!(tree.is_selected(a));
        assert!(tree.is_selected(c));
    }

    #[test]
    fn toggle_flips_each_in_order() {
        let (mut tree, [g, a, b, c]) = tree();
        tree.select(&[a], false);
        tree.toggle(&[a, c]);
        assert!(!tree.is_selected(a));
        assert!(tree.is_selected(c));
        tree.toggle(&[g]);
        assert!(tree.is_selected(a));
        assert!(tree.is_selected(b));
        assert_coherent(&tree);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (mut tree, [_, a, _, c]) = tree();
        tree.remove(c).unwrap();
        tree.take_events();
        tree.select(&[c, NodeId::ROOT], false);
        assert!(tree.selected_nodes().is_empty());
        assert!(tree.take_events().is_empty(), "no-op selection records nothing");
        tree.select(&[c, a], false);
        assert_eq!(tree.selected_nodes(), vec![a]);
    }

    #[test]
    fn selection_event_carries_leaf_positions() {
        let (mut tree, [g, ..]) = tree();
        tree.select(&[g], false);
        let events = tree.take_events();
        assert_eq!(events.len(), 1);
        let TreeChange::SelectionChanged {
            selected,
            leaf_positions,
        } = &events[0].change
        else {
            panic!("expected SelectionChanged, got {:?}", events[0]);
        };
        assert_eq!(selected.len(), 3);
        assert_eq!(leaf_positions, &vec![1, 2]);
    }

    #[test]
    fn structural_edits_keep_selection_coherent() {
        let (mut tree, [g, a, b, c]) = tree();
        tree.select(&[a], false);
        // Removing the unselected sibling leaves the group fully selected.
        tree.remove(b).unwrap();
        assert!(tree.is_selected(g));
        assert_coherent(&tree);

        // Moving an unselected node in breaks it again.
        tree.move_node(c, g, 1).unwrap();
        assert!(!tree.is_selected(g));
        assert_coherent(&tree);

        // Grouping selected nodes yields a selected group.
        tree.select(&[a, c], false);
        let outer = tree.group_nodes(&[g], None).unwrap();
        assert!(tree.is_selected(outer));
        assert_coherent(&tree);
    }

    #[test]
    fn empty_group_keeps_explicit_state() {
        let (mut tree, _) = tree();
        let empty = tree.create_group(NodeId::ROOT, 0, None).unwrap();
        tree.select(&[empty], false);
        assert!(tree.is_selected(empty));
        assert!(tree.selected_leaves().is_empty());
        tree.clear_selection();
        assert!(!tree.is_selected(empty));
    }

    #[test]
    fn flips_are_reported_in_delta() {
        let (mut tree, [g, a, b, _]) = tree();
        let _ = tree.take_delta();
        tree.select(&[a, b], false);
        let delta = tree.take_delta();
        let flipped: BTreeSet<_> = delta.selection.into_iter().collect();
        assert_eq!(flipped, BTreeSet::from([a, b, g]));
    }
}
