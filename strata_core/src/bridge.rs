// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bidirectional synchronization between a [`GroupTree`] and a [`MainList`].
//!
//! The main list is authoritative for which items exist and for their flat
//! order; the tree is authoritative for grouping. [`SyncBridge`] owns both
//! sides and is the only place either of them changes:
//!
//! ```text
//!   request_*() ──► GroupTree ──► TreeEvent ──► MainList op (tagged)
//!                                                   │
//!                    ┌──────────────────────────────┘
//!                    ▼
//!   on_main_list_event() ── tag in flight? ──► drop (echo)
//!                    │
//!                    └── untagged ──► GroupTree (origin = MainList)
//! ```
//!
//! # Echo suppression
//!
//! Every list operation the bridge issues carries a fresh [`EchoTag`], which
//! is recorded as *in flight*. When the list reports the change back, the tag
//! is recognized, retired, and the event is dropped. Conversely, tree events
//! produced while applying a list event are stamped with
//! [`Origin::MainList`] and never translated back. Together these guarantee
//! that one user action causes exactly one change on each side.
//!
//! # Desynchronization
//!
//! Before a request mutates anything, the bridge verifies that both sides hold
//! the same items in the same order. List events are validated against the
//! payload they carry. On a mismatch the tree is rebuilt from the list (see
//! [`GroupTree::rebuild_from`]), a [`BridgeNotice`] is queued, and a
//! [`ResyncEvent`](crate::trace::ResyncEvent) is traced. A request that hit
//! a mismatch is not applied and returns the [`DesyncError`].

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{DesyncError, Error, IndexError};
use crate::event::{ChangeKind, Origin, TreeChange, TreeEvent};
use crate::index::NestedIndex;
use crate::item::ItemHandle;
use crate::list::{EchoTag, ListBatch, ListChange, ListEvent, MainList};
use crate::trace::{
    DispatchEvent, EchoSuppressedEvent, ListEventReceived, NoopSink, RejectedEvent, RequestEvent,
    RequestKind, ResyncEvent, TraceSink, Tracer,
};
use crate::tree::{Children, GroupTree, NodeId, ResyncReport};
use crate::view::TreeView;

/// Runtime knobs for a [`SyncBridge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Whether a selection change reported by the main list replaces the
    /// tree selection (`true`) or is added to it (`false`).
    pub list_selection_replaces: bool,
    /// Whether tree-side selection changes are pushed to the main list.
    pub push_selection: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            list_selection_replaces: true,
            push_selection: true,
        }
    }
}

/// Outcome of [`SyncBridge::on_main_list_event`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListOutcome {
    /// The change was mirrored onto the tree.
    Applied,
    /// The event was the echo of an operation the bridge issued; dropped.
    Echo,
    /// The event could not be mirrored; the tree was rebuilt from the list.
    Resynced(DesyncError),
}

/// A warning-level notification for the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeNotice {
    /// The tree was rebuilt from the main list.
    Resynced {
        /// What was detected.
        cause: DesyncError,
        /// What the rebuild did.
        report: ResyncReport,
    },
}

/// Keeps a [`GroupTree`] and a [`MainList`] consistent.
///
/// See the [module documentation](self) for the protocol.
#[derive(Debug)]
pub struct SyncBridge<L, S = NoopSink> {
    tree: GroupTree,
    list: L,
    options: BridgeOptions,

    // -- Echo tracking --
    next_tag: u64,
    in_flight: BTreeSet<EchoTag>,

    // -- Diagnostics --
    step: u64,
    notices: Vec<BridgeNotice>,
    sink: S,
}

impl<L: MainList> SyncBridge<L> {
    /// Creates a bridge over `list`, building a flat tree from its items.
    pub fn new(list: L) -> Self {
        Self::with_sink(list, NoopSink)
    }
}

impl<L: MainList, S: TraceSink> SyncBridge<L, S> {
    /// Creates a bridge that reports to `sink`.
    pub fn with_sink(list: L, sink: S) -> Self {
        let tree = GroupTree::from_items(&list.items());
        Self {
            tree,
            list,
            options: BridgeOptions::default(),
            next_tag: 0,
            in_flight: BTreeSet::new(),
            step: 0,
            notices: Vec::new(),
            sink,
        }
    }

    /// Replaces the runtime options.
    #[must_use]
    pub fn with_options(mut self, options: BridgeOptions) -> Self {
        self.options = options;
        self
    }

    // -- Read access --

    /// The tree.
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &GroupTree {
        &self.tree
    }

    /// The main list.
    #[inline]
    #[must_use]
    pub fn list(&self) -> &L {
        &self.list
    }

    /// The main list, for external edits. Their events must be delivered
    /// through [`on_main_list_event`](Self::on_main_list_event).
    #[inline]
    pub fn list_mut(&mut self) -> &mut L {
        &mut self.list
    }

    /// The trace sink.
    #[inline]
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The trace sink, mutably.
    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The active options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> BridgeOptions {
        self.options
    }

    /// Number of issued list operations whose echo has not come back yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Children of `node`, in order.
    pub fn children_of(&self, node: NodeId) -> Result<Children<'_>, Error> {
        Ok(self.tree.children(node)?)
    }

    /// See [`GroupTree::nested_to_flat`].
    pub fn nested_to_flat(&self, index: &NestedIndex) -> Result<usize, IndexError> {
        self.tree.nested_to_flat(index)
    }

    /// See [`GroupTree::flat_to_nested`].
    pub fn flat_to_nested(&self, position: usize) -> Result<NestedIndex, IndexError> {
        self.tree.flat_to_nested(position)
    }

    /// Drains queued warning-level notices.
    pub fn take_notices(&mut self) -> Vec<BridgeNotice> {
        core::mem::take(&mut self.notices)
    }

    /// Consumes the bridge, returning its parts.
    pub fn into_parts(self) -> (GroupTree, L, S) {
        (self.tree, self.list, self.sink)
    }

    // -- Presentation --

    /// Drains the tree's change delta into `view`.
    pub fn present(&mut self, view: &mut impl TreeView) {
        let delta = self.tree.take_delta();
        view.apply(&self.tree, &delta);
    }

    // -- Tree-side requests --

    /// Forms a group around `members` at the earliest member's position.
    pub fn request_group(&mut self, members: &[NodeId]) -> Result<NodeId, Error> {
        self.run(RequestKind::Group, |tree| tree.group_nodes(members, None))
    }

    /// Dissolves `group`, lifting its children into its place.
    pub fn request_ungroup(&mut self, group: NodeId) -> Result<Vec<NodeId>, Error> {
        self.run(RequestKind::Ungroup, |tree| tree.dissolve(group))
    }

    /// Moves `node` so that it becomes the child at `destination`.
    ///
    /// The destination is read in the tree as it is *before* the move: the
    /// node is placed into the group at `destination`'s parent path, before
    /// the child currently at its last offset (or last, if the offset equals
    /// the child count).
    pub fn request_move(&mut self, node: NodeId, destination: &NestedIndex) -> Result<(), Error> {
        self.run(RequestKind::Move, |tree| {
            let (dest, offset) = resolve_destination(tree, destination)?;
            tree.move_node(node, dest, offset)
        })
    }

    /// Moves several nodes to `destination`, keeping their flat order.
    pub fn request_move_many(
        &mut self,
        nodes: &[NodeId],
        destination: &NestedIndex,
    ) -> Result<(), Error> {
        self.run(RequestKind::MoveMany, |tree| {
            let (dest, offset) = resolve_destination(tree, destination)?;
            tree.move_nodes(nodes, dest, offset)
        })
    }

    /// Selects `nodes` (with their subtrees); unknown nodes are ignored.
    pub fn request_select(&mut self, nodes: &[NodeId], additive: bool) -> Result<(), Error> {
        self.run(RequestKind::Select, |tree| {
            tree.select(nodes, additive);
            Ok(())
        })
    }

    /// Deselects `nodes` (with their subtrees); unknown nodes are ignored.
    pub fn request_deselect(&mut self, nodes: &[NodeId]) -> Result<(), Error> {
        self.run(RequestKind::Deselect, |tree| {
            tree.deselect(nodes);
            Ok(())
        })
    }

    /// Toggles `nodes`; unknown nodes are ignored.
    pub fn request_toggle(&mut self, nodes: &[NodeId]) -> Result<(), Error> {
        self.run(RequestKind::Toggle, |tree| {
            tree.toggle(nodes);
            Ok(())
        })
    }

    /// Clears the selection.
    pub fn request_clear_selection(&mut self) -> Result<(), Error> {
        self.run(RequestKind::ClearSelection, |tree| {
            tree.clear_selection();
            Ok(())
        })
    }

    /// Deletes `node` and its subtree, returning the removed items.
    pub fn request_delete(&mut self, node: NodeId) -> Result<Vec<ItemHandle>, Error> {
        self.run(RequestKind::Delete, |tree| tree.remove(node))
    }

    /// Inserts a new empty group at `destination` (read like
    /// [`request_move`](Self::request_move)).
    pub fn request_new_group(
        &mut self,
        destination: &NestedIndex,
        name: Option<String>,
    ) -> Result<NodeId, Error> {
        self.run(RequestKind::NewGroup, |tree| {
            let (dest, offset) = resolve_destination(tree, destination)?;
            tree.create_group(dest, offset, name)
        })
    }

    /// Renames `group`. The main list is not involved.
    pub fn request_rename(&mut self, group: NodeId, name: String) -> Result<(), Error> {
        self.run(RequestKind::Rename, |tree| tree.rename(group, name))
    }

    /// Shows or hides `nodes` with their subtrees. The main list is not
    /// involved.
    pub fn request_set_visible(&mut self, nodes: &[NodeId], visible: bool) -> Result<(), Error> {
        self.run(RequestKind::SetVisible, |tree| Ok(tree.set_visible(nodes, visible)?))
    }

    /// Flips the visibility of the leaves among `nodes`; groups are skipped.
    pub fn request_toggle_visibility(&mut self, nodes: &[NodeId]) -> Result<(), Error> {
        self.run(RequestKind::ToggleVisibility, |tree| Ok(tree.toggle_visibility(nodes)?))
    }

    // -- List-side ingestion --

    /// Mirrors a main-list change onto the tree.
    ///
    /// Echoes of the bridge's own operations are dropped. A change that does
    /// not fit the tree triggers a resync and is reported as
    /// [`ListOutcome::Resynced`]; it is never returned as an error.
    pub fn on_main_list_event(&mut self, event: &ListEvent) -> ListOutcome {
        self.step += 1;
        let step = self.step;
        let kind = event.change.kind();
        self.trace().list_event(&ListEventReceived {
            step,
            kind,
            tag: event.tag.map(|t| t.0),
        });

        if let Some(tag) = event.tag
            && self.in_flight.remove(&tag)
        {
            self.trace().echo_suppressed(&EchoSuppressedEvent {
                step,
                tag: tag.0,
                kind,
            });
            return ListOutcome::Echo;
        }

        let previous = self.tree.set_origin(Origin::MainList);
        let result = self.apply_list_change(&event.change);
        self.tree.set_origin(previous);
        self.flush_tree_events();

        match result {
            Ok(()) => ListOutcome::Applied,
            Err(error) => {
                let cause = match error {
                    Error::Desync(cause) => cause,
                    other => DesyncError::Unapplicable(other.kind()),
                };
                self.resync_after(cause.clone());
                ListOutcome::Resynced(cause)
            }
        }
    }

    /// Mirrors a tree event onto the main list.
    ///
    /// Events stamped [`Origin::MainList`] were produced while applying a
    /// list change and are dropped. Every other event becomes exactly one
    /// tagged list operation (none for a move that lands where it started).
    /// A list that rejects the operation has diverged from the tree; the
    /// caller is expected to resync.
    pub fn on_tree_event(&mut self, event: &TreeEvent) -> Result<(), DesyncError> {
        if event.origin == Origin::MainList {
            return Ok(());
        }
        self.translate(&event.change)
    }

    /// Rebuilds the tree from the main list unconditionally.
    pub fn resync(&mut self) -> ResyncReport {
        self.step += 1;
        let report = self.rebuild();
        let _ = self.tree.take_events();
        report
    }

    /// Checks that both sides hold the same items in the same order.
    pub fn check_alignment(&self) -> Result<(), DesyncError> {
        let tree = self.tree.len();
        let list = self.list.len();
        if tree != list {
            return Err(DesyncError::LengthMismatch { tree, list });
        }
        for (position, &slot) in self.tree.traversal_order().iter().enumerate() {
            let expected = self.tree.slot(slot).handle();
            let found = self.list.get(position);
            if found != Some(expected) {
                return Err(DesyncError::HandleMismatch {
                    position,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    // -- Internals --

    fn trace(&mut self) -> Tracer<'_> {
        Tracer::new(&mut self.sink)
    }

    /// Runs a tree-side request: alignment check, tree edit, list dispatch.
    fn run<T>(
        &mut self,
        request: RequestKind,
        edit: impl FnOnce(&mut GroupTree) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.step += 1;
        let step = self.step;
        self.trace().request(&RequestEvent { step, request });

        if let Err(cause) = self.check_alignment() {
            self.resync_after(cause.clone());
            return Err(self.reject(request, cause.into()));
        }

        match edit(&mut self.tree) {
            Ok(value) => {
                self.flush_tree_events();
                Ok(value)
            }
            Err(error) => {
                // Validation failed before anything changed.
                let _ = self.tree.take_events();
                Err(self.reject(request, error))
            }
        }
    }

    fn reject(&mut self, request: RequestKind, error: Error) -> Error {
        let step = self.step;
        self.trace().rejected(&RejectedEvent {
            step,
            request,
            error: error.kind(),
        });
        error
    }

    /// Translates pending tree events into list operations. Events that
    /// originated from the list are dropped.
    fn flush_tree_events(&mut self) {
        for event in self.tree.take_events() {
            if let Err(cause) = self.on_tree_event(&event) {
                // Remaining events describe a tree the list never saw.
                self.resync_after(cause);
                return;
            }
        }
    }

    /// Applies one tree change to the main list as a single tagged operation.
    fn translate(&mut self, change: &TreeChange) -> Result<(), DesyncError> {
        let (tag, kind, items) = match change {
            TreeChange::NodeCreated {
                handle, position, ..
            } => {
                let tag = self.issue_tag();
                self.dispatch(tag, |list| list.insert(*position, *handle, Some(tag)))?;
                (tag, ChangeKind::Added, 1)
            }
            TreeChange::NodeRemoved {
                position, handles, ..
            } => {
                let tag = self.issue_tag();
                if handles.len() == 1 {
                    self.dispatch(tag, |list| list.remove(*position, Some(tag)))?;
                    (tag, ChangeKind::Removed, 1)
                } else {
                    let batch = ListBatch {
                        removals: (*position..*position + handles.len()).collect(),
                        insert_at: *position,
                        items: Vec::new(),
                    };
                    self.dispatch(tag, |list| list.splice(batch, Some(tag)))?;
                    (tag, ChangeKind::Batch, handles.len())
                }
            }
            TreeChange::NodeMoved {
                from, to, handles, ..
            } => {
                if from == to {
                    return Ok(());
                }
                let tag = self.issue_tag();
                if handles.len() == 1 {
                    self.dispatch(tag, |list| list.move_item(*from, *to, Some(tag)))?;
                    (tag, ChangeKind::Moved, 1)
                } else {
                    let batch = ListBatch {
                        removals: (*from..*from + handles.len()).collect(),
                        insert_at: *to,
                        items: handles.clone(),
                    };
                    self.dispatch(tag, |list| list.splice(batch, Some(tag)))?;
                    (tag, ChangeKind::Batch, handles.len())
                }
            }
            TreeChange::GroupFormed {
                vacated,
                position,
                items,
                ..
            } => {
                let tag = self.issue_tag();
                let batch = ListBatch {
                    removals: vacated.clone(),
                    insert_at: *position,
                    items: items.clone(),
                };
                self.dispatch(tag, |list| list.splice(batch, Some(tag)))?;
                (tag, ChangeKind::Batch, items.len())
            }
            TreeChange::GroupDissolved { position, .. } => {
                let tag = self.issue_tag();
                self.dispatch(tag, |list| list.remove(*position, Some(tag)))?;
                (tag, ChangeKind::Removed, 1)
            }
            TreeChange::SelectionChanged { leaf_positions, .. } => {
                if !self.options.push_selection {
                    return Ok(());
                }
                let tag = self.issue_tag();
                self.dispatch(tag, |list| list.select(leaf_positions, Some(tag)))?;
                (tag, ChangeKind::Selection, leaf_positions.len())
            }
        };

        self.trace_dispatch(tag, kind, items);
        Ok(())
    }

    fn issue_tag(&mut self) -> EchoTag {
        let tag = EchoTag(self.next_tag);
        self.next_tag += 1;
        self.in_flight.insert(tag);
        tag
    }

    fn dispatch(
        &mut self,
        tag: EchoTag,
        op: impl FnOnce(&mut L) -> Result<(), DesyncError>,
    ) -> Result<(), DesyncError> {
        op(&mut self.list).inspect_err(|_| {
            self.in_flight.remove(&tag);
        })
    }

    /// Mirrors one list change onto the tree (origin already set).
    fn apply_list_change(&mut self, change: &ListChange) -> Result<(), Error> {
        let len = self.tree.len();
        match change {
            ListChange::ItemAdded { position, handle } => {
                if *position > len {
                    return Err(DesyncError::PositionOutOfRange {
                        position: *position,
                        len,
                    }
                    .into());
                }
                self.insert_at_flat(*position, *handle)?;
            }
            ListChange::ItemRemoved { position, handle } => {
                let node = self.node_holding(*position, *handle)?;
                self.remove_slot(node)?;
            }
            ListChange::ItemMoved { from, to, handle } => {
                if *to >= len {
                    return Err(DesyncError::PositionOutOfRange { position: *to, len }.into());
                }
                let node = self.node_holding(*from, *handle)?;
                self.tree.move_to_flat(node, *to)?;
            }
            ListChange::SelectionChanged { positions } => {
                // Group slots are skipped: selecting one would select its
                // members, which the list did not.
                let mut leaves = Vec::with_capacity(positions.len());
                let mut listed = Vec::with_capacity(positions.len());
                for &position in positions {
                    let node = self
                        .tree
                        .node_at_flat(position)
                        .map_err(|_| DesyncError::PositionOutOfRange { position, len })?;
                    if !self.tree.slot(node.idx).is_group() {
                        leaves.push(node);
                        listed.push(position);
                    }
                }
                let additive = !self.options.list_selection_replaces;
                self.tree.select(&leaves, additive);

                // An additive merge can select more leaves than the list
                // reported; the list has to learn about them.
                let merged = self.tree.selected_leaf_positions();
                if self.options.push_selection && merged != listed {
                    self.push_selection(&merged)?;
                }
            }
            ListChange::Spliced(batch) => {
                batch.validate(len)?;
                let reinserted: BTreeSet<ItemHandle> = batch.items.iter().copied().collect();
                let mut detached = BTreeMap::new();
                for &position in batch.removals.iter().rev() {
                    let node = self.tree.node_at_flat(position)?;
                    let handle = self.tree.slot(node.idx).handle();
                    if reinserted.contains(&handle) {
                        self.tree.detach(node.idx);
                        detached.insert(handle, node.idx);
                    } else {
                        self.remove_slot(node)?;
                    }
                }
                for (i, &handle) in batch.items.iter().enumerate() {
                    let position = batch.insert_at + i;
                    match detached.remove(&handle) {
                        Some(idx) => self.tree.attach_at_flat(idx, position)?,
                        None => self.insert_at_flat(position, handle)?,
                    }
                }
            }
        }
        Ok(())
    }

    /// Pushes the tree's leaf selection to the list as one tagged operation.
    fn push_selection(&mut self, positions: &[usize]) -> Result<(), DesyncError> {
        let tag = self.issue_tag();
        self.dispatch(tag, |list| list.select(positions, Some(tag)))?;
        self.trace_dispatch(tag, ChangeKind::Selection, positions.len());
        Ok(())
    }

    fn trace_dispatch(&mut self, tag: EchoTag, kind: ChangeKind, items: usize) {
        let step = self.step;
        self.trace().dispatch(&DispatchEvent {
            step,
            tag: tag.0,
            kind,
            items: u32::try_from(items).unwrap_or(u32::MAX),
        });
    }

    /// The node at `position`, which must hold `handle`.
    fn node_holding(&self, position: usize, handle: ItemHandle) -> Result<NodeId, DesyncError> {
        let node = self
            .tree
            .node_at_flat(position)
            .map_err(|_| DesyncError::PositionOutOfRange {
                position,
                len: self.tree.len(),
            })?;
        let expected = self.tree.slot(node.idx).handle();
        if expected == handle {
            Ok(node)
        } else {
            Err(DesyncError::HandleMismatch {
                position,
                expected,
                found: Some(handle),
            })
        }
    }

    /// Inserts `handle` so that it ends up at flat `position`.
    fn insert_at_flat(&mut self, position: usize, handle: ItemHandle) -> Result<(), Error> {
        let (parent, offset) = self.tree.insertion_point(position)?;
        let parent = self.tree.id_at(parent);
        self.tree.insert_item(parent, offset, handle)?;
        Ok(())
    }

    /// Removes one flat slot: a leaf is deleted, a group is dissolved so its
    /// children keep their positions.
    fn remove_slot(&mut self, node: NodeId) -> Result<(), Error> {
        if self.tree.slot(node.idx).is_group() {
            self.tree.dissolve(node)?;
        } else {
            self.tree.remove(node)?;
        }
        Ok(())
    }

    fn rebuild(&mut self) -> ResyncReport {
        let items = self.list.items();
        let report = self.tree.rebuild_from(&items);
        let step = self.step;
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        let event = ResyncEvent {
            step,
            removed: count(report.removed.len()),
            created: count(report.created.len()),
            retained: count(report.retained),
        };
        self.trace().resync(&event);
        report
    }

    fn resync_after(&mut self, cause: DesyncError) {
        let report = self.rebuild();
        let _ = self.tree.take_events();
        self.notices.push(BridgeNotice::Resynced { cause, report });
    }
}

/// Splits a destination index into the group it points into and the offset
/// inside that group.
fn resolve_destination(
    tree: &GroupTree,
    destination: &NestedIndex,
) -> Result<(NodeId, usize), Error> {
    let Some((offset, parent)) = destination.split_last() else {
        return Err(IndexError::Nested {
            index: destination.clone(),
        }
        .into());
    };
    if parent.is_empty() {
        return Ok((NodeId::ROOT, offset));
    }
    let parent = tree
        .node_at_nested(&NestedIndex::from(parent))
        .map_err(|_| IndexError::Nested {
            index: destination.clone(),
        })?;
    Ok((parent, offset))
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::error::NotFoundError;
    use crate::list::VecList;

    fn leaf(key: u64) -> ItemHandle {
        ItemHandle::leaf(key)
    }

    fn bridge_abc() -> SyncBridge<VecList> {
        SyncBridge::new(VecList::from_items([leaf(1), leaf(2), leaf(3)]))
    }

    fn id(bridge: &SyncBridge<VecList>, key: u64) -> NodeId {
        bridge.tree().node_for_handle(leaf(key)).unwrap()
    }

    /// Delivers every queued list event and returns the outcomes.
    fn pump(bridge: &mut SyncBridge<VecList>) -> Vec<ListOutcome> {
        let events = bridge.list_mut().take_events();
        events.iter().map(|e| bridge.on_main_list_event(e)).collect()
    }

    fn flat(bridge: &SyncBridge<VecList>) -> Vec<ItemHandle> {
        let tree = bridge.tree();
        tree.flat_order().map(|n| tree.handle(n).unwrap()).collect()
    }

    #[test]
    fn new_bridge_is_aligned() {
        let bridge = bridge_abc();
        assert_eq!(bridge.tree().len(), 3);
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn group_issues_one_batch_and_echo_is_dropped() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();

        let events = bridge.list_mut().take_events();
        assert_eq!(events.len(), 1, "one list operation per tree edit");
        assert!(matches!(events[0].change, ListChange::Spliced(_)));
        let gh = bridge.tree().handle(g).unwrap();
        assert_eq!(bridge.list().as_slice(), &[gh, leaf(1), leaf(2), leaf(3)]);

        let events_before = bridge.tree().len();
        assert_eq!(bridge.on_main_list_event(&events[0]), ListOutcome::Echo);
        assert_eq!(bridge.tree().len(), events_before);
        assert_eq!(bridge.in_flight(), 0);
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn group_then_ungroup_restores_order() {
        let mut bridge = bridge_abc();
        let before = bridge.list().as_slice().to_vec();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        assert!(pump(&mut bridge).iter().all(|o| *o == ListOutcome::Echo));
        bridge.request_ungroup(g).unwrap();
        assert!(pump(&mut bridge).iter().all(|o| *o == ListOutcome::Echo));

        assert_eq!(bridge.list().as_slice(), before.as_slice());
        assert_eq!(flat(&bridge), before);
        let leaves: Vec<_> = bridge.tree().leaf_order().collect();
        assert_eq!(leaves, vec![a, id(&bridge, 2), id(&bridge, 3)]);
    }

    #[test]
    fn move_subtree_uses_splice() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);

        bridge.request_move(g, &NestedIndex::from([2])).unwrap();
        let events = bridge.list_mut().take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].change, ListChange::Spliced(_)));
        assert_eq!(bridge.check_alignment(), Ok(()));
        assert_eq!(bridge.tree().nested_index(g), Ok(NestedIndex::from([1])));
    }

    #[test]
    fn move_single_leaf_uses_move_item() {
        let mut bridge = bridge_abc();
        let a = id(&bridge, 1);
        bridge.request_move(a, &NestedIndex::from([3])).unwrap();
        let events = bridge.list_mut().take_events();
        assert_eq!(
            events[0].change,
            ListChange::ItemMoved {
                from: 0,
                to: 2,
                handle: leaf(1)
            }
        );
        assert_eq!(bridge.list().as_slice(), &[leaf(2), leaf(3), leaf(1)]);
    }

    #[test]
    fn rejected_request_changes_nothing() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);
        let list_before = bridge.list().as_slice().to_vec();

        let err = bridge.request_move(g, &NestedIndex::from([0, 1])).unwrap_err();
        assert!(matches!(err, Error::Cycle(_)), "got {err:?}");
        let err = bridge.request_move(a, &NestedIndex::from([7])).unwrap_err();
        assert!(matches!(err, Error::Index(_)), "got {err:?}");
        let err = bridge.request_move(a, &NestedIndex::from([1, 0])).unwrap_err();
        assert!(matches!(err, Error::Index(_)), "destination inside a leaf: {err:?}");

        assert_eq!(bridge.list().as_slice(), list_before.as_slice());
        assert_eq!(bridge.list().pending_events(), 0);
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn external_insert_lands_at_flat_position() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);

        // [G, A, B, C]: inserting at 2 puts the new item inside G, before B.
        bridge.list_mut().insert(2, leaf(9), None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        let x = id(&bridge, 9);
        assert_eq!(bridge.tree().parent(x), Ok(Some(g)));
        assert_eq!(bridge.tree().flat_position(x), Ok(2));
        assert_eq!(bridge.list().pending_events(), 0, "no echo back to the list");

        bridge.list_mut().push(leaf(10));
        pump(&mut bridge);
        let y = id(&bridge, 10);
        assert_eq!(bridge.tree().parent(y), Ok(Some(NodeId::ROOT)));
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn external_removal_of_group_slot_dissolves() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);

        bridge.list_mut().remove(0, None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        assert!(!bridge.tree().is_alive(g));
        assert_eq!(bridge.tree().parent(a), Ok(Some(NodeId::ROOT)));
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn external_move_of_group_slot_lifts_children() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);

        bridge.list_mut().move_item(0, 3, None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        assert_eq!(bridge.tree().children(g).unwrap().count(), 0);
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn external_selection_maps_positions() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);

        bridge.list_mut().select(&[1, 2], None).unwrap();
        pump(&mut bridge);
        assert!(bridge.tree().is_selected(g), "all children selected");
        assert_eq!(bridge.list().pending_events(), 0, "no echo back to the list");
    }

    #[test]
    fn tree_selection_is_pushed_as_leaf_positions() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);

        bridge.request_select(&[g], false).unwrap();
        assert_eq!(bridge.list().selected_positions(), vec![1, 2]);
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Echo]);
    }

    #[test]
    fn selection_push_can_be_disabled() {
        let mut bridge = bridge_abc().with_options(BridgeOptions {
            push_selection: false,
            ..BridgeOptions::default()
        });
        let a = id(&bridge, 1);
        bridge.request_select(&[a], false).unwrap();
        assert_eq!(bridge.list().pending_events(), 0);
        assert!(bridge.tree().is_selected(a));
    }

    #[test]
    fn silent_list_change_triggers_resync() {
        let mut bridge = bridge_abc();
        bridge.list_mut().swap_silently(0, 2).unwrap();
        let a = id(&bridge, 1);

        let err = bridge.request_select(&[a], false).unwrap_err();
        assert!(matches!(err, Error::Desync(_)), "got {err:?}");
        assert_eq!(bridge.check_alignment(), Ok(()));
        assert_eq!(flat(&bridge), vec![leaf(3), leaf(2), leaf(1)]);
        let notices = bridge.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(!bridge.tree().is_selected(a), "request was not applied");
    }

    #[test]
    fn mismatched_list_event_resyncs() {
        let mut bridge = bridge_abc();
        bridge.list_mut().remove_silently(0).unwrap();
        let event = ListEvent {
            tag: None,
            change: ListChange::ItemRemoved {
                position: 0,
                handle: leaf(2),
            },
        };
        let outcome = bridge.on_main_list_event(&event);
        assert!(matches!(outcome, ListOutcome::Resynced(_)), "got {outcome:?}");
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn delete_removes_block() {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);

        let removed = bridge.request_delete(g).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(bridge.list().as_slice(), &[leaf(3)]);
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Echo]);
    }

    #[test]
    fn new_group_and_rename() {
        let mut bridge = bridge_abc();
        let g = bridge
            .request_new_group(&NestedIndex::from([1]), None)
            .unwrap();
        assert_eq!(bridge.tree().name(g), Some("Group 1"));
        assert_eq!(bridge.list().get(1), bridge.tree().handle(g).ok());
        pump(&mut bridge);

        bridge.request_rename(g, String::from("Foreground")).unwrap();
        assert_eq!(bridge.tree().name(g), Some("Foreground"));
        assert_eq!(bridge.list().pending_events(), 0, "rename is tree-only");
    }

    #[test]
    fn external_splice_is_ingested() {
        let mut bridge = bridge_abc();
        let batch = ListBatch {
            removals: vec![0],
            insert_at: 2,
            items: vec![leaf(1), leaf(7)],
        };
        bridge.list_mut().splice(batch, None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        assert_eq!(flat(&bridge), vec![leaf(2), leaf(3), leaf(1), leaf(7)]);
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn tree_events_from_the_list_are_not_mirrored_back() {
        let mut bridge = bridge_abc();
        let event = TreeEvent {
            origin: Origin::MainList,
            change: TreeChange::NodeRemoved {
                node: id(&bridge, 1),
                position: 0,
                handles: vec![leaf(1)],
            },
        };
        assert_eq!(bridge.on_tree_event(&event), Ok(()));
        assert_eq!(bridge.list().len(), 3);
        assert_eq!(bridge.list().pending_events(), 0);
        assert_eq!(bridge.in_flight(), 0);
    }

    /// `[G, A, B, C]` with `G -> [A, B]`.
    fn bridge_grouped() -> (SyncBridge<VecList>, NodeId) {
        let mut bridge = bridge_abc();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));
        let g = bridge.request_group(&[a, b]).unwrap();
        pump(&mut bridge);
        (bridge, g)
    }

    #[test]
    fn list_selection_of_a_group_slot_selects_no_members() {
        let (mut bridge, g) = bridge_grouped();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));

        bridge.list_mut().select(&[0], None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        for node in [g, a, b] {
            assert!(!bridge.tree().is_selected(node), "{node:?} stays unselected");
        }
        assert!(bridge.tree().selected_leaf_positions().is_empty());

        bridge.list_mut().select(&[0, 3], None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        assert_eq!(bridge.tree().selected_leaf_positions(), vec![3]);
        assert!(!bridge.tree().is_selected(g));
        assert_eq!(bridge.list().pending_events(), 0, "nothing to correct");
        assert_eq!(bridge.in_flight(), 0);
    }

    #[test]
    fn additive_list_selection_is_pushed_back_merged() {
        let mut bridge = bridge_abc().with_options(BridgeOptions {
            list_selection_replaces: false,
            ..BridgeOptions::default()
        });
        let (a, c) = (id(&bridge, 1), id(&bridge, 3));
        bridge.request_select(&[a], false).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Echo]);

        bridge.list_mut().select(&[2], None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        assert!(bridge.tree().is_selected(a));
        assert!(bridge.tree().is_selected(c));
        assert_eq!(bridge.list().selected_positions(), vec![0, 2]);
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Echo]);
        assert_eq!(bridge.in_flight(), 0);
    }

    #[test]
    fn splice_reinserting_a_handle_keeps_its_node() {
        let mut bridge = bridge_abc();
        let a = id(&bridge, 1);
        bridge.request_select(&[a], false).unwrap();
        pump(&mut bridge);

        let batch = ListBatch {
            removals: vec![0],
            insert_at: 2,
            items: vec![leaf(1)],
        };
        bridge.list_mut().splice(batch, None).unwrap();
        assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
        assert_eq!(bridge.tree().node_for_handle(leaf(1)), Some(a), "same node");
        assert!(bridge.tree().is_selected(a));
        assert_eq!(bridge.list().selected_positions(), vec![2]);
        assert_eq!(bridge.tree().selected_leaf_positions(), vec![2]);
        assert_eq!(bridge.check_alignment(), Ok(()));
    }

    #[test]
    fn list_moves_onto_the_same_position_keep_nesting() {
        let (mut bridge, g) = bridge_grouped();
        let (a, b) = (id(&bridge, 1), id(&bridge, 2));

        for position in [0, 2] {
            bridge.list_mut().move_item(position, position, None).unwrap();
            assert_eq!(pump(&mut bridge), vec![ListOutcome::Applied]);
            assert_eq!(bridge.tree().parent(a), Ok(Some(g)), "after move {position}");
            assert_eq!(bridge.tree().parent(b), Ok(Some(g)), "after move {position}");
            assert_eq!(bridge.check_alignment(), Ok(()));
        }
        assert_eq!(bridge.list().pending_events(), 0);
        assert!(bridge.take_notices().is_empty());
    }

    #[test]
    fn visibility_requests_stay_on_the_tree() {
        let (mut bridge, g) = bridge_grouped();
        let (a, b, c) = (id(&bridge, 1), id(&bridge, 2), id(&bridge, 3));
        let _ = bridge.tree.take_delta();

        bridge.request_set_visible(&[g], false).unwrap();
        bridge.request_toggle_visibility(&[g, c]).unwrap();
        assert_eq!(bridge.list().pending_events(), 0, "visibility is tree-only");
        assert_eq!(bridge.in_flight(), 0);
        for node in [g, a, b, c] {
            assert!(!bridge.tree().is_visible(node), "{node:?} hidden");
        }

        let stale = id(&bridge, 3);
        bridge.request_delete(stale).unwrap();
        pump(&mut bridge);
        let err = bridge.request_set_visible(&[a, stale], true).unwrap_err();
        assert_eq!(err, Error::NotFound(NotFoundError(stale)));
        assert!(!bridge.tree().is_visible(a), "rejected request changes nothing");

        let (mut tree, _, _) = bridge.into_parts();
        let delta = tree.take_delta();
        assert_eq!(delta.visibility.len(), 3, "C was deleted");
    }

    #[test]
    fn stale_nodes_are_rejected_without_touching_either_side() {
        let (mut bridge, g) = bridge_grouped();
        let c = id(&bridge, 3);
        bridge.request_delete(c).unwrap();
        pump(&mut bridge);
        let list_before = bridge.list().as_slice().to_vec();
        let a = id(&bridge, 1);

        let err = bridge.request_move(c, &NestedIndex::from([0])).unwrap_err();
        assert_eq!(err, Error::NotFound(NotFoundError(c)));
        let err = bridge.request_group(&[a, c]).unwrap_err();
        assert_eq!(err, Error::NotFound(NotFoundError(c)));
        let err = bridge.request_ungroup(c).unwrap_err();
        assert_eq!(err, Error::NotFound(NotFoundError(c)));

        assert_eq!(bridge.list().as_slice(), list_before.as_slice());
        assert_eq!(bridge.list().pending_events(), 0);
        assert_eq!(bridge.tree().parent(a), Ok(Some(g)));
        assert!(bridge.take_notices().is_empty(), "no resync");
    }
}
