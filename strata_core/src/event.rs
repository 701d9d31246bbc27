// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree mutation events.
//!
//! Every structural or selection edit applied to a
//! [`GroupTree`](crate::tree::GroupTree) appends one [`TreeEvent`] to the
//! tree's outbox. Events are self-contained: they carry the flat positions the
//! edit vacated and occupied at the moment it was applied, so they can be
//! translated into main-list operations without consulting the (possibly
//! further mutated) tree.

use alloc::vec::Vec;

use crate::item::ItemHandle;
use crate::tree::NodeId;

/// Which side initiated the edit that produced an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A tree-side request (user gesture, presentation layer).
    #[default]
    Tree,
    /// The bridge, while applying a main-list event. Such tree events are
    /// echoes and must not be translated back to the main list.
    MainList,
}

/// A recorded tree edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEvent {
    /// Which side initiated the edit.
    pub origin: Origin,
    /// What changed.
    pub change: TreeChange,
}

/// The payload of a [`TreeEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeChange {
    /// A leaf or an empty group was inserted.
    NodeCreated {
        /// The new node.
        node: NodeId,
        /// Its main-list item.
        handle: ItemHandle,
        /// Flat position after insertion.
        position: usize,
    },
    /// A node and its whole subtree were deleted.
    NodeRemoved {
        /// The removed subtree root (now stale).
        node: NodeId,
        /// Flat position of the subtree root before removal.
        position: usize,
        /// Items of the removed subtree, in flat order.
        handles: Vec<ItemHandle>,
    },
    /// A node and its subtree were relocated as one contiguous block.
    NodeMoved {
        /// The moved subtree root.
        node: NodeId,
        /// Flat position of the block before the move.
        from: usize,
        /// Flat position of the block after the move.
        to: usize,
        /// Items of the block, in flat order.
        handles: Vec<ItemHandle>,
    },
    /// A new group was formed around existing nodes.
    GroupFormed {
        /// The new group.
        group: NodeId,
        /// Its main-list item.
        handle: ItemHandle,
        /// Direct members, in flat order.
        members: Vec<NodeId>,
        /// Flat positions (before the edit, ascending) of every node that
        /// moved into the group, descendants included.
        vacated: Vec<usize>,
        /// Flat position of the group after the edit.
        position: usize,
        /// Items of the new block (group first), in flat order.
        items: Vec<ItemHandle>,
    },
    /// A group was removed and its children lifted into its place.
    GroupDissolved {
        /// The dissolved group (now stale).
        group: NodeId,
        /// Its main-list item.
        handle: ItemHandle,
        /// Flat position the group occupied.
        position: usize,
    },
    /// The selection was replaced or edited.
    SelectionChanged {
        /// Every selected node, in flat order.
        selected: Vec<NodeId>,
        /// Flat positions of the selected leaves.
        leaf_positions: Vec<usize>,
    },
}

impl TreeChange {
    /// Payload-free category of the change.
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::NodeCreated { .. } => ChangeKind::Added,
            Self::NodeRemoved { .. } => ChangeKind::Removed,
            Self::NodeMoved { .. } => ChangeKind::Moved,
            Self::GroupFormed { .. } => ChangeKind::GroupFormed,
            Self::GroupDissolved { .. } => ChangeKind::GroupDissolved,
            Self::SelectionChanged { .. } => ChangeKind::Selection,
        }
    }
}

/// Payload-free category shared by tree and main-list changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Item or node added.
    Added,
    /// Item or node removed.
    Removed,
    /// Item or node moved.
    Moved,
    /// Selection changed.
    Selection,
    /// Batched main-list splice.
    Batch,
    /// Group formed around existing nodes.
    GroupFormed,
    /// Group dissolved.
    GroupDissolved,
}
