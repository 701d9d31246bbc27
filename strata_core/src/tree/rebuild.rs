// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resynchronization from an authoritative main list.
//!
//! When the tree and the main list disagree, the list wins. The tree is
//! rebuilt so that its flat order is exactly the list, while keeping as much
//! of the previous nesting as the new order allows:
//!
//! 1. Nodes whose item no longer appears in the list are destroyed.
//! 2. Every surviving node is detached.
//! 3. The list is walked in order with a stack of open groups. A tracked item
//!    closes groups until the top of the stack is its former parent (or the
//!    root) and is attached there; a tracked group is then opened. An item the
//!    tree has never seen is attached to the innermost open group as a fresh
//!    leaf or empty group.
//!
//! Duplicate list entries are skipped after their first occurrence.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use super::id::{INVALID, NodeId, ROOT_SLOT};
use super::node::{GroupLayer, GroupLayerNode, Node};
use super::store::GroupTree;
use crate::dirty;
use crate::item::ItemHandle;

/// Outcome of [`GroupTree::rebuild_from`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResyncReport {
    /// Nodes destroyed because their item left the list (now stale).
    pub removed: Vec<NodeId>,
    /// Nodes created for items the tree did not track.
    pub created: Vec<NodeId>,
    /// Number of nodes that survived the rebuild.
    pub retained: usize,
    /// Number of list entries skipped as repeats of an earlier entry.
    pub duplicates: usize,
}

impl ResyncReport {
    /// Whether the rebuild had to add or drop any node.
    #[must_use]
    pub fn changed_membership(&self) -> bool {
        !self.removed.is_empty() || !self.created.is_empty()
    }
}

impl GroupTree {
    /// Rebuilds the tree so that its flat order equals `items`.
    ///
    /// Surviving nodes keep their [`NodeId`], name, and (where the new order
    /// permits) their parent. Selection of surviving nodes is kept and group
    /// selection is re-derived. No [`TreeEvent`](crate::event::TreeEvent) is
    /// recorded: the list already reflects the result.
    pub fn rebuild_from(&mut self, items: &[ItemHandle]) -> ResyncReport {
        let listed: BTreeSet<ItemHandle> = items.iter().copied().collect();
        let tracked: Vec<u32> = self.handles.values().copied().collect();

        let mut former_parent = BTreeMap::new();
        for &idx in &tracked {
            let p = self.parent[idx as usize];
            let handle = if p == INVALID {
                ItemHandle::ROOT
            } else {
                self.slot(p).handle()
            };
            former_parent.insert(idx, handle);
        }

        // Detach everything.
        for &idx in &tracked {
            let p = self.parent[idx as usize];
            if p != INVALID {
                self.dirty.remove_dependency(idx, p, dirty::STRUCTURE);
                self.parent[idx as usize] = INVALID;
            }
        }
        for &idx in tracked.iter().chain(core::iter::once(&ROOT_SLOT)) {
            if let Some(group) = self.slot_mut(idx).as_group_mut() {
                group.children.clear();
            }
        }
        self.traversal_dirty = true;

        let mut report = ResyncReport::default();
        for &idx in &tracked {
            if !listed.contains(&self.slot(idx).handle()) {
                report.removed.push(self.id_at(idx));
                self.free(idx);
            }
        }

        let mut open = alloc::vec![ROOT_SLOT];
        let mut placed = BTreeSet::new();
        for &handle in items {
            if !placed.insert(handle) {
                report.duplicates += 1;
                continue;
            }

            if let Some(&idx) = self.handles.get(&handle) {
                let former = former_parent
                    .get(&idx)
                    .copied()
                    .unwrap_or(ItemHandle::ROOT);
                let target = self.close_until(&mut open, former);
                let end = self.slot(target).child_slots().len();
                self.link(target, end, idx);
                report.retained += 1;
                if self.slot(idx).is_group() {
                    open.push(idx);
                }
            } else {
                let node = if handle.is_group() {
                    Node::Group(GroupLayer::new(handle, self.default_group_name()))
                } else {
                    Node::Leaf(GroupLayerNode::new(handle))
                };
                let target = open.last().copied().unwrap_or(ROOT_SLOT);
                let idx = self.alloc(node);
                let end = self.slot(target).child_slots().len();
                self.link(target, end, idx);
                report.created.push(self.id_at(idx));
            }
        }

        self.commit();
        report
    }

    /// Pops open groups until the innermost one is `parent` or the root, and
    /// returns it.
    fn close_until(&self, open: &mut Vec<u32>, parent: ItemHandle) -> u32 {
        while let Some(&top) = open.last() {
            if top == ROOT_SLOT || self.slot(top).handle() == parent {
                return top;
            }
            open.pop();
        }
        ROOT_SLOT
    }

    /// Builds a tree from scratch whose flat order is `items`, every item
    /// attached directly to the root.
    #[must_use]
    pub fn from_items(items: &[ItemHandle]) -> Self {
        let mut tree = Self::new();
        let _ = tree.rebuild_from(items);
        let _ = tree.take_events();
        tree
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn leaf(key: u64) -> ItemHandle {
        ItemHandle::leaf(key)
    }

    fn flat(tree: &GroupTree) -> Vec<ItemHandle> {
        tree.flat_order()
            .map(|id| tree.handle(id).unwrap())
            .collect()
    }

    #[test]
    fn from_items_attaches_to_root() {
        let tree = GroupTree::from_items(&[leaf(1), leaf(2), leaf(3)]);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children(NodeId::ROOT).unwrap().count(), 3);
    }

    #[test]
    fn rebuild_matches_list_and_keeps_identity() {
        let mut tree = GroupTree::from_items(&[leaf(1), leaf(2), leaf(3)]);
        let b = tree.node_for_handle(leaf(2)).unwrap();

        let items = [leaf(3), leaf(2), leaf(4)];
        let report = tree.rebuild_from(&items);

        assert_eq!(flat(&tree), items.to_vec());
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.retained, 2);
        assert_eq!(tree.node_for_handle(leaf(2)), Some(b), "survivor keeps its id");
        assert!(!tree.is_tracking(leaf(1)));
    }

    #[test]
    fn rebuild_preserves_nesting_where_order_permits() {
        let mut tree = GroupTree::from_items(&[leaf(1), leaf(2), leaf(3)]);
        let a = tree.node_for_handle(leaf(1)).unwrap();
        let b = tree.node_for_handle(leaf(2)).unwrap();
        let g = tree.group_nodes(&[a, b], None).unwrap();
        let gh = tree.handle(g).unwrap();

        // Same items, new trailing leaf.
        let items = [gh, leaf(1), leaf(2), leaf(3), leaf(5)];
        let report = tree.rebuild_from(&items);
        assert_eq!(flat(&tree), items.to_vec());
        assert_eq!(tree.parent(a), Ok(Some(g)));
        assert_eq!(tree.parent(b), Ok(Some(g)));
        let c = tree.node_for_handle(leaf(3)).unwrap();
        assert_eq!(tree.parent(c), Ok(Some(NodeId::ROOT)));
        assert_eq!(report.created.len(), 1);
        let e = report.created[0];
        assert_eq!(tree.parent(e), Ok(Some(NodeId::ROOT)));
    }

    #[test]
    fn rebuild_lifts_members_that_moved_out() {
        let mut tree = GroupTree::from_items(&[leaf(1), leaf(2), leaf(3)]);
        let a = tree.node_for_handle(leaf(1)).unwrap();
        let b = tree.node_for_handle(leaf(2)).unwrap();
        let g = tree.group_nodes(&[a, b], None).unwrap();
        let gh = tree.handle(g).unwrap();

        // Leaf 2 moved behind leaf 3, which belongs to the root.
        let items = [gh, leaf(1), leaf(3), leaf(2)];
        tree.rebuild_from(&items);
        assert_eq!(flat(&tree), items.to_vec());
        assert_eq!(tree.parent(a), Ok(Some(g)));
        assert_eq!(tree.parent(b), Ok(Some(NodeId::ROOT)));
    }

    #[test]
    fn rebuild_skips_duplicates() {
        let mut tree = GroupTree::new();
        let report = tree.rebuild_from(&[leaf(1), leaf(1), leaf(2)]);
        assert_eq!(report.duplicates, 1);
        assert_eq!(flat(&tree), vec![leaf(1), leaf(2)]);
    }

    #[test]
    fn any_host_key_is_tracked() {
        let top = ItemHandle::group(u64::MAX);
        let tree = GroupTree::from_items(&[top, leaf(u64::MAX), leaf(0)]);
        assert_eq!(tree.len(), 3);
        assert_eq!(flat(&tree), vec![top, leaf(u64::MAX), leaf(0)]);
        assert!(tree.node(tree.node_for_handle(top).unwrap()).unwrap().is_group());
    }

    #[test]
    fn rebuild_records_no_events() {
        let mut tree = GroupTree::from_items(&[leaf(1)]);
        tree.rebuild_from(&[leaf(2), leaf(1)]);
        assert!(tree.take_events().is_empty());
    }

    #[test]
    fn rebuild_drops_selection_of_removed_nodes() {
        let mut tree = GroupTree::from_items(&[leaf(1), leaf(2)]);
        let a = tree.node_for_handle(leaf(1)).unwrap();
        let b = tree.node_for_handle(leaf(2)).unwrap();
        tree.select(&[a, b], false);
        tree.rebuild_from(&[leaf(2)]);
        assert!(tree.is_selected(b));
        assert!(!tree.is_selected(a));
        assert_eq!(tree.selected_leaves().len(), 1);
    }
}
