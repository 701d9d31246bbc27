// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of a group tree.
//!
//! [`snapshot`] renders everything a caller can observe about a
//! [`GroupTree`] through its public API: nesting, item handles, group names,
//! selection, visibility, and the flat position and nested index of every
//! node. Two
//! snapshots are equal exactly when the trees are indistinguishable, which
//! makes them the comparison of choice for "this edit changed nothing"
//! assertions. [`export`] writes the same value as pretty-printed JSON.
//!
//! Node identities are not included, so a resynced tree that holds the same
//! items in the same shape snapshots identically.

use std::io::{self, Write};

use serde_json::{Value, json};

use strata_core::item::ItemHandle;
use strata_core::tree::{GroupTree, Node, NodeId};

/// Renders `tree` as a JSON value.
///
/// The top-level object has the keys `"len"`, `"children"` (nested nodes
/// under the root), and `"selected"` (flat positions of selected nodes).
#[must_use]
pub fn snapshot(tree: &GroupTree) -> Value {
    let selected: Vec<usize> = tree
        .selected_nodes()
        .into_iter()
        .filter_map(|id| tree.flat_position(id).ok())
        .collect();
    json!({
        "len": tree.len(),
        "children": children(tree, tree.root()),
        "selected": selected,
    })
}

/// Renders a flat item sequence (typically a main list) as a JSON array.
#[must_use]
pub fn items(items: &[ItemHandle]) -> Value {
    Value::Array(items.iter().map(|&h| item(h)).collect())
}

/// Writes [`snapshot`] of `tree` as pretty-printed JSON.
pub fn export(tree: &GroupTree, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &snapshot(tree))?;
    Ok(())
}

fn children(tree: &GroupTree, parent: NodeId) -> Value {
    let Ok(kids) = tree.children(parent) else {
        return Value::Array(Vec::new());
    };
    Value::Array(kids.map(|id| node(tree, id)).collect())
}

fn node(tree: &GroupTree, id: NodeId) -> Value {
    let flat = tree.flat_position(id).ok();
    let index = tree
        .nested_index(id)
        .map(|i| i.as_slice().to_vec())
        .unwrap_or_default();
    match tree.node(id) {
        Ok(Node::Group(group)) => json!({
            "kind": "group",
            "item": item(group.handle()),
            "name": group.name(),
            "flat": flat,
            "index": index,
            "selected": tree.is_selected(id),
            "visible": tree.is_visible(id),
            "children": children(tree, id),
        }),
        Ok(Node::Leaf(leaf)) => json!({
            "kind": "leaf",
            "item": item(leaf.payload()),
            "flat": flat,
            "index": index,
            "selected": tree.is_selected(id),
            "visible": tree.is_visible(id),
        }),
        Err(_) => Value::Null,
    }
}

fn item(handle: ItemHandle) -> Value {
    json!({
        "key": handle.key(),
        "group": handle.is_group(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::index::NestedIndex;

    fn leaf(key: u64) -> ItemHandle {
        ItemHandle::leaf(key)
    }

    /// `root -> [G1[A, B], C]`
    fn nested() -> (GroupTree, NodeId) {
        let mut tree = GroupTree::from_items(&[leaf(1), leaf(2), leaf(3)]);
        let a = tree.node_for_handle(leaf(1)).unwrap();
        let b = tree.node_for_handle(leaf(2)).unwrap();
        let g = tree.group_nodes(&[a, b], None).unwrap();
        (tree, g)
    }

    #[test]
    fn snapshot_shows_nesting_and_indices() {
        let (tree, _) = nested();
        let snap = snapshot(&tree);
        assert_eq!(snap["len"], 4);
        assert_eq!(snap["children"][0]["kind"], "group");
        assert_eq!(snap["children"][0]["name"], "Group 1");
        assert_eq!(snap["children"][0]["flat"], 0);
        assert_eq!(snap["children"][0]["children"][1]["item"]["key"], 2);
        assert_eq!(snap["children"][0]["children"][1]["flat"], 2);
        assert_eq!(snap["children"][0]["children"][1]["index"], json!([0, 1]));
        assert_eq!(snap["children"][1]["index"], json!([1]));
        assert_eq!(snap["children"][1]["flat"], 3);
    }

    #[test]
    fn selection_is_part_of_the_snapshot() {
        let (mut tree, g) = nested();
        let before = snapshot(&tree);
        tree.select(&[g], false);
        let after = snapshot(&tree);
        assert_ne!(before, after);
        assert_eq!(after["selected"], json!([0, 1, 2]));
        assert_eq!(after["children"][0]["children"][0]["selected"], true);
    }

    #[test]
    fn visibility_is_part_of_the_snapshot() {
        let (mut tree, g) = nested();
        assert_eq!(snapshot(&tree)["children"][1]["visible"], true);
        tree.set_visible(&[g], false).unwrap();
        let snap = snapshot(&tree);
        assert_eq!(snap["children"][0]["visible"], false);
        assert_eq!(snap["children"][0]["children"][1]["visible"], false);
        assert_eq!(snap["children"][1]["visible"], true);
    }

    #[test]
    fn rejected_edit_leaves_snapshot_unchanged() {
        let (mut tree, g) = nested();
        let before = snapshot(&tree);
        let inner = tree.node_at_nested(&NestedIndex::from([0, 0])).unwrap();
        assert!(tree.move_node(g, g, 0).is_err());
        assert!(tree.group_nodes(&[NodeId::ROOT, inner], None).is_err());
        assert_eq!(snapshot(&tree), before);
    }

    #[test]
    fn export_produces_valid_json() {
        let (tree, _) = nested();
        let mut out = Vec::new();
        export(&tree, &mut out).unwrap();
        let parsed: Value = serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(parsed, snapshot(&tree));
    }

    #[test]
    fn flat_items_render_in_order() {
        let value = items(&[ItemHandle::group(5), leaf(1)]);
        assert_eq!(
            value,
            json!([{"key": 5, "group": true}, {"key": 1, "group": false}])
        );
    }
}
