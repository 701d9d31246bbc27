// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy.
//!
//! Every structural operation validates its inputs before touching the tree,
//! so any error returned here means that neither the tree nor the main list
//! changed. The one exception is [`DesyncError`]: the bridge recovers from it
//! with a full resync before reporting it (see
//! [`SyncBridge`](crate::bridge::SyncBridge)).

use crate::index::NestedIndex;
use crate::item::ItemHandle;
use crate::tree::NodeId;

/// A nested index or flat position does not address a node.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A sibling offset along the path is beyond its group's child count.
    #[error("nested index {index} is out of range")]
    Nested {
        /// The offending index.
        index: NestedIndex,
    },
    /// A flat position is not below the tree's node count.
    #[error("flat position {position} is out of range (len {len})")]
    Flat {
        /// The offending position.
        position: usize,
        /// Number of nodes in the flat order.
        len: usize,
    },
    /// An insertion offset is beyond the destination group's child count.
    #[error("offset {offset} is out of range for a group with {len} children")]
    Offset {
        /// The requested offset.
        offset: usize,
        /// Number of children in the destination.
        len: usize,
    },
    /// The path resolves to a leaf where a group was required.
    #[error("{node:?} is not a group")]
    NotAGroup {
        /// The leaf that was addressed.
        node: NodeId,
    },
}

/// An edit would make a group its own descendant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{node:?} cannot be placed inside {target:?}, which is part of its own subtree")]
pub struct CycleError {
    /// The node being moved or grouped.
    pub node: NodeId,
    /// The group it would have been placed into.
    pub target: NodeId,
}

/// An operation referenced a node that is not (or no longer) in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} is not in the tree")]
pub struct NotFoundError(pub NodeId);

/// The tree and the main list no longer describe the same items.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DesyncError {
    /// The two sides disagree on how many items exist.
    #[error("tree holds {tree} nodes but the main list holds {list} items")]
    LengthMismatch {
        /// Node count of the tree.
        tree: usize,
        /// Item count of the main list.
        list: usize,
    },
    /// The item at a flat position differs between the two sides.
    #[error("position {position}: tree expects {expected:?}, main list has {found:?}")]
    HandleMismatch {
        /// Flat position that was compared.
        position: usize,
        /// Handle the tree holds at that position.
        expected: ItemHandle,
        /// Handle the main list holds there, if any.
        found: Option<ItemHandle>,
    },
    /// A list event referenced a position the tree does not have.
    #[error("main list referenced position {position}, but the tree holds {len} nodes")]
    PositionOutOfRange {
        /// Position carried by the event.
        position: usize,
        /// Node count of the tree.
        len: usize,
    },
    /// A list event introduced an item the tree already tracks.
    #[error("{0:?} is already tracked by the tree")]
    DuplicateHandle(ItemHandle),
    /// A list event could not be mirrored onto the tree.
    #[error("main list event could not be applied to the tree ({0:?})")]
    Unapplicable(ErrorKind),
}

/// Umbrella error for tree and bridge operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// See [`IndexError`].
    #[error(transparent)]
    Index(#[from] IndexError),
    /// See [`CycleError`].
    #[error(transparent)]
    Cycle(#[from] CycleError),
    /// See [`NotFoundError`].
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    /// See [`DesyncError`].
    #[error(transparent)]
    Desync(#[from] DesyncError),
}

impl Error {
    /// The error category, for trace events and presentation feedback.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Index(_) => ErrorKind::Index,
            Self::Cycle(_) => ErrorKind::Cycle,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Desync(_) => ErrorKind::Desync,
        }
    }
}

/// Payload-free category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Out-of-range nested or flat index.
    Index,
    /// Edit would create a cycle.
    Cycle,
    /// Unknown node.
    NotFound,
    /// Tree and main list diverged.
    Desync,
}
