// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node variants stored in a [`GroupTree`](super::GroupTree).

use alloc::string::String;
use alloc::vec::Vec;

use crate::item::ItemHandle;

/// A leaf node tracking exactly one main-list item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupLayerNode {
    pub(crate) payload: ItemHandle,
    pub(crate) visible: bool,
}

impl GroupLayerNode {
    pub(crate) fn new(payload: ItemHandle) -> Self {
        Self {
            payload,
            visible: true,
        }
    }

    /// The main-list item this leaf tracks.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> ItemHandle {
        self.payload
    }
}

/// A container node holding an ordered, gapless run of children.
///
/// A group is also an item of the main list in its own right: `handle` is the
/// entry that occupies the group's flat slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupLayer {
    pub(crate) handle: ItemHandle,
    pub(crate) name: String,
    pub(crate) visible: bool,
    pub(crate) children: Vec<u32>,
}

impl GroupLayer {
    pub(crate) fn new(handle: ItemHandle, name: String) -> Self {
        Self {
            handle,
            name,
            visible: true,
            children: Vec::new(),
        }
    }

    /// The main-list item standing for this group.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> ItemHandle {
        self.handle
    }

    /// Display name of the group.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of direct children.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the group has no children.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A tree element: either a leaf wrapping an item or a group of children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Leaf tracking one main-list item.
    Leaf(GroupLayerNode),
    /// Nested group.
    Group(GroupLayer),
}

impl Node {
    /// Whether this node is a group.
    #[inline]
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// The main-list item occupying this node's flat slot.
    #[must_use]
    pub fn handle(&self) -> ItemHandle {
        match self {
            Self::Leaf(leaf) => leaf.payload,
            Self::Group(group) => group.handle,
        }
    }

    /// Whether the node is shown. New nodes start visible.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.visible,
            Self::Group(group) => group.visible,
        }
    }

    /// Sets the flag and returns whether it changed.
    pub(crate) fn set_visible(&mut self, visible: bool) -> bool {
        let flag = match self {
            Self::Leaf(leaf) => &mut leaf.visible,
            Self::Group(group) => &mut group.visible,
        };
        core::mem::replace(flag, visible) != visible
    }

    /// Returns the group, if this node is one.
    #[must_use]
    pub fn as_group(&self) -> Option<&GroupLayer> {
        match self {
            Self::Group(group) => Some(group),
            Self::Leaf(_) => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupLayer> {
        match self {
            Self::Group(group) => Some(group),
            Self::Leaf(_) => None,
        }
    }

    /// Child slots; empty for leaves.
    pub(crate) fn child_slots(&self) -> &[u32] {
        match self {
            Self::Group(group) => &group.children,
            Self::Leaf(_) => &[],
        }
    }
}
