// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque main-list item handles.

use core::fmt;

/// First key handed out for groups minted by the tree itself.
///
/// Hosts that create their own group items should pick keys below this value.
pub const MINTED_GROUP_KEY_BASE: u64 = 1 << 62;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Kind {
    Leaf,
    Group,
    // Only the root sentinel; hosts cannot construct it.
    Root,
}

/// An opaque reference to an entry of the main list.
///
/// The tree never looks inside an item: it only needs an identity (`key`) and
/// whether the item stands for a group. Two handles are equal only if both the
/// key and the group flag match, so a host may reuse the same key space for
/// leaves and groups.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemHandle {
    key: u64,
    kind: Kind,
}

impl ItemHandle {
    /// Reserved handle of the root sentinel. Never present in a main list.
    pub(crate) const ROOT: Self = Self {
        key: 0,
        kind: Kind::Root,
    };

    /// Creates a handle for a plain (leaf) item.
    #[inline]
    #[must_use]
    pub const fn leaf(key: u64) -> Self {
        Self {
            key,
            kind: Kind::Leaf,
        }
    }

    /// Creates a handle for a group item.
    #[inline]
    #[must_use]
    pub const fn group(key: u64) -> Self {
        Self {
            key,
            kind: Kind::Group,
        }
    }

    /// Returns the host-assigned key.
    #[inline]
    #[must_use]
    pub const fn key(self) -> u64 {
        self.key
    }

    /// Whether the item stands for a group.
    #[inline]
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self.kind, Kind::Group | Kind::Root)
    }
}

impl fmt::Debug for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Leaf => write!(f, "Leaf({})", self.key),
            Kind::Group => write!(f, "Group({})", self.key),
            Kind::Root => f.write_str("Root"),
        }
    }
}
