// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation contract.
//!
//! A *view* renders the group tree for the user (a layer panel, a tree
//! widget, a terminal dump). It reads the tree and receives coalesced change
//! deltas; it never mutates the tree directly. User gestures go through the
//! `request_*` entry points of [`SyncBridge`](crate::bridge::SyncBridge)
//! instead, so that every edit reaches the main list too.
//!
//! # Update loop pseudocode
//!
//! ```rust,ignore
//! fn on_idle(bridge: &mut SyncBridge<HostList>, panel: &mut LayerPanel) {
//!     // Ingest whatever the host list reported since the last pass.
//!     for event in host_events.drain(..) {
//!         bridge.on_main_list_event(&event);
//!     }
//!
//!     // Surface recoveries as warnings, not errors.
//!     for notice in bridge.take_notices() {
//!         panel.show_warning(&notice);
//!     }
//!
//!     // Repaint only what changed.
//!     bridge.present(panel);
//! }
//! ```

use crate::tree::{GroupTree, TreeDelta};

/// Applies tree change deltas to a presentation.
///
/// Both row-based list widgets and nested tree widgets implement this trait,
/// enabling generic update loops and test doubles.
pub trait TreeView {
    /// Applies the given [`TreeDelta`], reading current node state from
    /// `tree` as needed.
    fn apply(&mut self, tree: &GroupTree, delta: &TreeDelta);
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::*;
    use crate::bridge::SyncBridge;
    use crate::item::ItemHandle;
    use crate::list::VecList;

    /// Keeps a flat row model with one label per flat position.
    #[derive(Default)]
    struct Rows {
        labels: Vec<String>,
        repaints: usize,
    }

    impl TreeView for Rows {
        fn apply(&mut self, tree: &GroupTree, delta: &TreeDelta) {
            if delta.is_empty() {
                return;
            }
            self.repaints += 1;
            self.labels = tree
                .flat_order()
                .map(|id| {
                    let depth = tree.nested_index(id).map_or(0, |i| i.depth());
                    let name = tree
                        .name(id)
                        .map(String::from)
                        .unwrap_or_else(|| alloc::format!("{:?}", tree.handle(id).unwrap()));
                    alloc::format!("{}{name}", "  ".repeat(depth - 1))
                })
                .collect();
        }
    }

    #[test]
    fn view_follows_bridge_edits() {
        let list = VecList::from_items([ItemHandle::leaf(1), ItemHandle::leaf(2)]);
        let mut bridge = SyncBridge::new(list);
        let mut rows = Rows::default();
        bridge.present(&mut rows);
        assert_eq!(rows.labels, ["Leaf(1)", "Leaf(2)"]);

        let a = bridge.tree().node_for_handle(ItemHandle::leaf(1)).unwrap();
        bridge.request_group(&[a]).unwrap();
        bridge.present(&mut rows);
        assert_eq!(rows.labels, ["Group 1", "  Leaf(1)", "Leaf(2)"]);

        let repaints = rows.repaints;
        bridge.present(&mut rows);
        assert_eq!(rows.repaints, repaints, "empty delta skips the repaint");
    }
}
