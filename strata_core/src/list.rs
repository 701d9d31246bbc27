// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The main-list contract.
//!
//! The *main list* is the externally owned, authoritative flat sequence of
//! items that a [`GroupTree`](crate::tree::GroupTree) organizes. Hosts adapt
//! their list type by implementing [`MainList`]; [`VecList`] is a complete
//! in-memory implementation used by tests and the sync harness.
//!
//! # Events
//!
//! Every successful mutating call on a [`MainList`] must emit exactly one
//! [`ListEvent`] describing it, carrying the [`EchoTag`] passed to the call
//! unchanged. The [`SyncBridge`](crate::bridge::SyncBridge) tags every
//! operation it issues and uses the tag to recognize (and drop) the resulting
//! event when it comes back, so a tree edit never round-trips into a second
//! tree edit. Changes made by anyone else carry no tag.
//!
//! How events travel from the list to the bridge is up to the host: a
//! callback, a channel, or (as with [`VecList`]) a queue that is drained and
//! pumped by the caller.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::error::DesyncError;
use crate::event::ChangeKind;
use crate::item::ItemHandle;

/// Marks a list operation as issued by the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EchoTag(pub u64);

/// A batched list edit: remove several positions, then insert one contiguous
/// block.
///
/// Batches let a multi-item tree edit (forming a group, moving a subtree)
/// reach the list as one operation, so list observers never see a transient
/// order in which only part of the edit happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListBatch {
    /// Positions to remove, strictly ascending, in pre-edit coordinates.
    pub removals: Vec<usize>,
    /// Where the block is inserted, in post-removal coordinates.
    pub insert_at: usize,
    /// The block to insert, in order.
    pub items: Vec<ItemHandle>,
}

impl ListBatch {
    /// Checks the batch against a list of `len` items.
    pub fn validate(&self, len: usize) -> Result<(), DesyncError> {
        let mut prev = None;
        for &position in &self.removals {
            if position >= len || prev.is_some_and(|p| p >= position) {
                return Err(DesyncError::PositionOutOfRange { position, len });
            }
            prev = Some(position);
        }
        let remaining = len - self.removals.len();
        if self.insert_at > remaining {
            return Err(DesyncError::PositionOutOfRange {
                position: self.insert_at,
                len: remaining,
            });
        }
        Ok(())
    }
}

/// What changed in the main list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListChange {
    /// `handle` was inserted and now sits at `position`.
    ItemAdded {
        /// Position after insertion.
        position: usize,
        /// The new item.
        handle: ItemHandle,
    },
    /// `handle` was removed from `position`.
    ItemRemoved {
        /// Position before removal.
        position: usize,
        /// The removed item.
        handle: ItemHandle,
    },
    /// `handle` was taken out at `from` and reinserted so that it now sits at
    /// `to`.
    ItemMoved {
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
        /// The moved item.
        handle: ItemHandle,
    },
    /// The selection was replaced.
    SelectionChanged {
        /// Selected positions, ascending.
        positions: Vec<usize>,
    },
    /// A [`ListBatch`] was applied.
    Spliced(ListBatch),
}

impl ListChange {
    /// Payload-free category of the change.
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::ItemAdded { .. } => ChangeKind::Added,
            Self::ItemRemoved { .. } => ChangeKind::Removed,
            Self::ItemMoved { .. } => ChangeKind::Moved,
            Self::SelectionChanged { .. } => ChangeKind::Selection,
            Self::Spliced(_) => ChangeKind::Batch,
        }
    }
}

/// A change notification emitted by a [`MainList`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEvent {
    /// The tag passed to the mutating call, if any.
    pub tag: Option<EchoTag>,
    /// What changed.
    pub change: ListChange,
}

/// An ordered, externally owned list of items.
///
/// Positions passed to mutating methods must be in range; implementations
/// reject out-of-range positions with [`DesyncError::PositionOutOfRange`]
/// without changing anything or emitting an event.
pub trait MainList {
    /// Number of items.
    fn len(&self) -> usize;

    /// Whether the list holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `position`.
    fn get(&self, position: usize) -> Option<ItemHandle>;

    /// Every item, in order.
    fn items(&self) -> Vec<ItemHandle> {
        (0..self.len()).filter_map(|p| self.get(p)).collect()
    }

    /// Inserts `handle` so that it ends up at `position`.
    fn insert(
        &mut self,
        position: usize,
        handle: ItemHandle,
        tag: Option<EchoTag>,
    ) -> Result<(), DesyncError>;

    /// Removes the item at `position`.
    fn remove(&mut self, position: usize, tag: Option<EchoTag>) -> Result<(), DesyncError>;

    /// Takes the item at `from` out and reinserts it so that it ends up at
    /// `to`.
    fn move_item(&mut self, from: usize, to: usize, tag: Option<EchoTag>)
    -> Result<(), DesyncError>;

    /// Replaces the selection.
    fn select(&mut self, positions: &[usize], tag: Option<EchoTag>) -> Result<(), DesyncError>;

    /// Applies a batch as one operation.
    fn splice(&mut self, batch: ListBatch, tag: Option<EchoTag>) -> Result<(), DesyncError>;
}

/// An in-memory [`MainList`] that queues its events.
///
/// Besides the [`MainList`] operations (which emit events), `VecList` offers
/// `*_silently` edits that change the items without emitting anything. They
/// model a notification getting lost, which is how desynchronization happens
/// in practice.
#[derive(Clone, Debug, Default)]
pub struct VecList {
    items: Vec<ItemHandle>,
    selected: BTreeSet<ItemHandle>,
    events: Vec<ListEvent>,
}

impl VecList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding `items`, without emitting events.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = ItemHandle>) -> Self {
        Self {
            items: items.into_iter().collect(),
            ..Self::default()
        }
    }

    /// The items, in order.
    #[must_use]
    pub fn as_slice(&self) -> &[ItemHandle] {
        &self.items
    }

    /// Selected positions, ascending.
    #[must_use]
    pub fn selected_positions(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, h)| self.selected.contains(h))
            .map(|(p, _)| p)
            .collect()
    }

    /// Drains queued events, oldest first.
    pub fn take_events(&mut self) -> Vec<ListEvent> {
        core::mem::take(&mut self.events)
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Appends `handle` as an external (untagged) edit.
    pub fn push(&mut self, handle: ItemHandle) {
        let position = self.items.len();
        self.items.push(handle);
        self.emit(None, ListChange::ItemAdded { position, handle });
    }

    /// Inserts without emitting an event.
    pub fn insert_silently(&mut self, position: usize, handle: ItemHandle) -> Result<(), DesyncError> {
        self.check_insert(position)?;
        self.items.insert(position, handle);
        Ok(())
    }

    /// Removes without emitting an event.
    pub fn remove_silently(&mut self, position: usize) -> Result<ItemHandle, DesyncError> {
        self.check(position)?;
        let handle = self.items.remove(position);
        self.selected.remove(&handle);
        Ok(handle)
    }

    /// Swaps two items without emitting an event.
    pub fn swap_silently(&mut self, a: usize, b: usize) -> Result<(), DesyncError> {
        self.check(a)?;
        self.check(b)?;
        self.items.swap(a, b);
        Ok(())
    }

    fn emit(&mut self, tag: Option<EchoTag>, change: ListChange) {
        self.events.push(ListEvent { tag, change });
    }

    fn check(&self, position: usize) -> Result<(), DesyncError> {
        if position < self.items.len() {
            Ok(())
        } else {
            Err(DesyncError::PositionOutOfRange {
                position,
                len: self.items.len(),
            })
        }
    }

    fn check_insert(&self, position: usize) -> Result<(), DesyncError> {
        if position <= self.items.len() {
            Ok(())
        } else {
            Err(DesyncError::PositionOutOfRange {
                position,
                len: self.items.len(),
            })
        }
    }
}

impl MainList for VecList {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, position: usize) -> Option<ItemHandle> {
        self.items.get(position).copied()
    }

    fn items(&self) -> Vec<ItemHandle> {
        self.items.clone()
    }

    fn insert(
        &mut self,
        position: usize,
        handle: ItemHandle,
        tag: Option<EchoTag>,
    ) -> Result<(), DesyncError> {
        self.check_insert(position)?;
        self.items.insert(position, handle);
        self.emit(tag, ListChange::ItemAdded { position, handle });
        Ok(())
    }

    fn remove(&mut self, position: usize, tag: Option<EchoTag>) -> Result<(), DesyncError> {
        self.check(position)?;
        let handle = self.items.remove(position);
        self.selected.remove(&handle);
        self.emit(tag, ListChange::ItemRemoved { position, handle });
        Ok(())
    }

    fn move_item(
        &mut self,
        from: usize,
        to: usize,
        tag: Option<EchoTag>,
    ) -> Result<(), DesyncError> {
        self.check(from)?;
        self.check(to)?;
        let handle = self.items.remove(from);
        self.items.insert(to, handle);
        self.emit(tag, ListChange::ItemMoved { from, to, handle });
        Ok(())
    }

    fn select(&mut self, positions: &[usize], tag: Option<EchoTag>) -> Result<(), DesyncError> {
        for &p in positions {
            self.check(p)?;
        }
        self.selected = positions.iter().map(|&p| self.items[p]).collect();
        let positions = self.selected_positions();
        self.emit(tag, ListChange::SelectionChanged { positions });
        Ok(())
    }

    fn splice(&mut self, batch: ListBatch, tag: Option<EchoTag>) -> Result<(), DesyncError> {
        batch.validate(self.items.len())?;
        for &position in batch.removals.iter().rev() {
            self.items.remove(position);
        }
        let tail = self.items.split_off(batch.insert_at);
        self.items.extend(batch.items.iter().copied());
        self.items.extend(tail);
        self.selected.retain(|h| self.items.contains(h));
        self.emit(tag, ListChange::Spliced(batch));
        Ok(())
    }
}
