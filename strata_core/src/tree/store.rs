// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot-based node storage with allocation, topology, and event recording.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::error::{CycleError, DesyncError, Error, IndexError, NotFoundError};
use crate::event::{Origin, TreeChange, TreeEvent};
use crate::item::{ItemHandle, MINTED_GROUP_KEY_BASE};

use super::id::{INVALID, NodeId, ROOT_SLOT};
use super::node::{GroupLayer, GroupLayerNode, Node};
use super::traverse::Children;

/// Slot storage for the group tree.
///
/// Nodes are addressed by [`NodeId`] handles. Internally each node occupies a
/// slot in parallel arrays; slot 0 is the root sentinel group. Destroyed nodes
/// are recycled via a free list, and generation counters prevent stale handle
/// access.
///
/// Every public mutation validates its arguments first and returns an
/// [`Error`] without touching the tree if they are rejected. A successful
/// mutation rebuilds the flat-order cache, re-derives group selection, and
/// appends a [`TreeEvent`] to the outbox (see [`take_events`](Self::take_events)).
#[derive(Debug)]
pub struct GroupTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) nodes: Vec<Option<Node>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) handles: BTreeMap<ItemHandle, u32>,
    next_group_key: u64,
    groups_named: u32,

    // -- Selection --
    pub(crate) selection: BTreeSet<NodeId>,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) flat_position: Vec<u32>,
    pub(crate) subtree_len: Vec<u32>,
    pub(crate) traversal_dirty: bool,
    pub(crate) topology_changed: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<NodeId>,

    // -- Event outbox --
    pub(crate) events: Vec<TreeEvent>,
    pub(crate) origin: Origin,
}

impl Default for GroupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTree {
    /// Creates a tree holding only the root sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: alloc::vec![INVALID],
            nodes: alloc::vec![Some(Node::Group(GroupLayer::new(
                ItemHandle::ROOT,
                String::from("root"),
            )))],
            generation: alloc::vec![0],
            free_list: Vec::new(),
            handles: BTreeMap::new(),
            next_group_key: MINTED_GROUP_KEY_BASE,
            groups_named: 0,
            selection: BTreeSet::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            flat_position: alloc::vec![INVALID],
            subtree_len: alloc::vec![0],
            traversal_dirty: false,
            topology_changed: false,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            events: Vec::new(),
            origin: Origin::Tree,
        }
    }

    // -- Query API --

    /// The root sentinel.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the flat order (every leaf and group, excluding the
    /// root sentinel).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.traversal_order.len()
    }

    /// Whether the tree holds no nodes besides the root.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traversal_order.is_empty()
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        let idx = id.idx as usize;
        idx < self.nodes.len() && self.generation[idx] == id.generation && self.nodes[idx].is_some()
    }

    /// Returns the node behind a handle.
    pub fn node(&self, id: NodeId) -> Result<&Node, NotFoundError> {
        let idx = self.resolve(id)?;
        Ok(self.slot(idx))
    }

    /// Returns the parent of a node, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, NotFoundError> {
        let idx = self.resolve(id)?;
        let p = self.parent[idx as usize];
        Ok((p != INVALID).then(|| self.id_at(p)))
    }

    /// Returns an iterator over the direct children of a node, in order.
    ///
    /// Leaves have no children.
    pub fn children(&self, id: NodeId) -> Result<Children<'_>, NotFoundError> {
        let idx = self.resolve(id)?;
        Ok(Children::new(self, self.slot(idx).child_slots()))
    }

    /// Position of a node among its siblings. The root reports 0.
    pub fn sibling_offset(&self, id: NodeId) -> Result<usize, NotFoundError> {
        let idx = self.resolve(id)?;
        Ok(self.offset_in_parent(idx))
    }

    /// The main-list item occupying a node's flat slot.
    pub fn handle(&self, id: NodeId) -> Result<ItemHandle, NotFoundError> {
        Ok(self.node(id)?.handle())
    }

    /// The node tracking `handle`, if any.
    #[must_use]
    pub fn node_for_handle(&self, handle: ItemHandle) -> Option<NodeId> {
        self.handles.get(&handle).map(|&idx| self.id_at(idx))
    }

    /// Whether `handle` is tracked anywhere in the tree.
    #[must_use]
    pub fn is_tracking(&self, handle: ItemHandle) -> bool {
        self.handles.contains_key(&handle)
    }

    /// Name of a group; `None` for leaves and unknown nodes.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).ok()?.as_group().map(GroupLayer::name)
    }

    /// Whether `node` is `ancestor` or lies anywhere below it.
    #[must_use]
    pub fn is_in_subtree(&self, ancestor: NodeId, node: NodeId) -> bool {
        match (self.resolve(ancestor), self.resolve(node)) {
            (Ok(a), Ok(n)) => self.slot_in_subtree(a, n),
            _ => false,
        }
    }

    // -- Mutation API --

    /// Inserts a node for `handle` as child number `offset` of `parent`.
    ///
    /// A leaf handle creates a [`GroupLayerNode`]; a group handle creates an
    /// empty [`GroupLayer`].
    pub fn insert_item(
        &mut self,
        parent: NodeId,
        offset: usize,
        handle: ItemHandle,
    ) -> Result<NodeId, Error> {
        let p = self.resolve_group(parent)?;
        self.check_offset(p, offset)?;
        if self.handles.contains_key(&handle) {
            return Err(DesyncError::DuplicateHandle(handle).into());
        }

        let node = if handle.is_group() {
            Node::Group(GroupLayer::new(handle, self.default_group_name()))
        } else {
            Node::Leaf(GroupLayerNode::new(handle))
        };
        let idx = self.alloc(node);
        self.link(p, offset, idx);
        self.commit();

        let id = self.id_at(idx);
        self.record(TreeChange::NodeCreated {
            node: id,
            handle,
            position: self.flat_position[idx as usize] as usize,
        });
        Ok(id)
    }

    /// Inserts a new, empty group as child number `offset` of `parent`.
    ///
    /// The group's main-list item is minted by the tree. Without a `name` the
    /// group is called `Group <n>`.
    pub fn create_group(
        &mut self,
        parent: NodeId,
        offset: usize,
        name: Option<String>,
    ) -> Result<NodeId, Error> {
        let p = self.resolve_group(parent)?;
        self.check_offset(p, offset)?;

        let handle = self.mint_group_handle();
        let idx = self.alloc_group(handle, name);
        self.link(p, offset, idx);
        self.commit();

        let id = self.id_at(idx);
        self.record(TreeChange::NodeCreated {
            node: id,
            handle,
            position: self.flat_position[idx as usize] as usize,
        });
        Ok(id)
    }

    /// Deletes a node together with its whole subtree.
    ///
    /// Returns the items of the deleted nodes in flat order.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<ItemHandle>, Error> {
        let idx = self.resolve_member(id)?;
        let position = self.flat_position[idx as usize] as usize;
        let slots = self.subtree_slots(idx);
        let handles: Vec<ItemHandle> = slots.iter().map(|&s| self.slot(s).handle()).collect();

        self.unlink(idx);
        for &s in &slots {
            self.free(s);
        }
        self.commit();

        self.record(TreeChange::NodeRemoved {
            node: id,
            position,
            handles: handles.clone(),
        });
        Ok(handles)
    }

    /// Removes a group and lifts its children into its place.
    ///
    /// Returns the lifted children in order. The flat order of every other
    /// node is unchanged.
    pub fn dissolve(&mut self, group: NodeId) -> Result<Vec<NodeId>, Error> {
        let idx = self.resolve_member(group)?;
        if !self.slot(idx).is_group() {
            return Err(IndexError::NotAGroup { node: group }.into());
        }
        let position = self.flat_position[idx as usize] as usize;
        let handle = self.slot(idx).handle();

        let lifted = self.lift_children(idx);
        self.unlink(idx);
        self.free(idx);
        self.commit();

        self.record(TreeChange::GroupDissolved {
            group,
            handle,
            position,
        });
        Ok(lifted.into_iter().map(|s| self.id_at(s)).collect())
    }

    /// Moves a node (with its subtree) into `dest`, before the child that is
    /// currently at `offset`; `offset == len` appends.
    ///
    /// Offsets refer to `dest`'s children *before* the move, so moving a node
    /// to its own offset or to the offset right after it is a no-op.
    pub fn move_node(&mut self, id: NodeId, dest: NodeId, offset: usize) -> Result<(), Error> {
        let idx = self.resolve_member(id)?;
        let d = self.resolve_group(dest)?;
        self.check_offset(d, offset)?;
        if self.slot_in_subtree(idx, d) {
            return Err(CycleError {
                node: id,
                target: dest,
            }
            .into());
        }

        let anchor = self.slot(d).child_slots().get(offset).copied();
        if anchor == Some(idx) {
            return Ok(());
        }
        self.relocate(idx, d, anchor);
        Ok(())
    }

    /// Moves several nodes into `dest`, before the child currently at
    /// `offset`, keeping their relative flat order.
    ///
    /// Nodes that lie below another mover travel with it. Movers already in
    /// `dest` do not count towards `offset`.
    pub fn move_nodes(&mut self, ids: &[NodeId], dest: NodeId, offset: usize) -> Result<(), Error> {
        let d = self.resolve_group(dest)?;
        self.check_offset(d, offset)?;
        let movers = self.outermost_members(ids)?;
        for &m in &movers {
            if self.slot_in_subtree(m, d) {
                return Err(CycleError {
                    node: self.id_at(m),
                    target: dest,
                }
                .into());
            }
        }

        let anchor = self.slot(d).child_slots()[offset..]
            .iter()
            .copied()
            .find(|c| !movers.contains(c));
        for m in movers {
            self.relocate(m, d, anchor);
        }
        Ok(())
    }

    /// Forms a new group around `members` at the position of the earliest
    /// member (in flat order) and returns it.
    ///
    /// Members keep their relative flat order inside the group; members that
    /// lie below another member travel with it. An empty member list appends
    /// an empty group to the root.
    pub fn group_nodes(&mut self, members: &[NodeId], name: Option<String>) -> Result<NodeId, Error> {
        if let Some(&root) = members.iter().find(|m| m.is_root()) {
            return Err(CycleError {
                node: root,
                target: root,
            }
            .into());
        }
        let movers = self.outermost_members(members)?;
        let Some(&first) = movers.first() else {
            let len = self.slot(ROOT_SLOT).child_slots().len();
            return self.create_group(NodeId::ROOT, len, name);
        };

        let mut vacated = Vec::new();
        for &m in &movers {
            let start = self.flat_position[m as usize] as usize;
            vacated.extend(start..start + self.subtree_len[m as usize] as usize);
        }
        vacated.sort_unstable();

        let p = self.parent[first as usize];
        let offset = self.offset_in_parent(first);
        let handle = self.mint_group_handle();
        let g = self.alloc_group(handle, name);
        self.link(p, offset, g);
        for &m in &movers {
            self.unlink(m);
            let end = self.slot(g).child_slots().len();
            self.link(g, end, m);
        }
        self.commit();

        let group = self.id_at(g);
        let position = self.flat_position[g as usize] as usize;
        let items = self
            .subtree_slots(g)
            .into_iter()
            .map(|s| self.slot(s).handle())
            .collect();
        self.record(TreeChange::GroupFormed {
            group,
            handle,
            members: movers.iter().map(|&m| self.id_at(m)).collect(),
            vacated,
            position,
            items,
        });
        Ok(group)
    }

    /// Renames a group.
    pub fn rename(&mut self, group: NodeId, name: String) -> Result<(), Error> {
        let idx = self.resolve_member(group)?;
        let Some(layer) = self.slot_mut(idx).as_group_mut() else {
            return Err(IndexError::NotAGroup { node: group }.into());
        };
        layer.name = name;
        self.dirty.mark(idx, dirty::NAME);
        Ok(())
    }

    /// Relocates a node so that it ends up at flat position `position`,
    /// interpreted in the tree without the node (main-list move semantics).
    ///
    /// A non-empty group only moves its own slot: its children are lifted into
    /// its old place first. Moving a node to the position it already holds
    /// changes nothing and records nothing.
    pub(crate) fn move_to_flat(&mut self, id: NodeId, position: usize) -> Result<(), Error> {
        let idx = self.resolve_member(id)?;
        if position >= self.len() {
            return Err(IndexError::Flat {
                position,
                len: self.len(),
            }
            .into());
        }
        let from = self.flat_position[idx as usize] as usize;
        if from == position {
            return Ok(());
        }

        self.detach(idx);
        self.attach_at_flat(idx, position)?;

        self.record(TreeChange::NodeMoved {
            node: id,
            from,
            to: self.flat_position[idx as usize] as usize,
            handles: alloc::vec![self.slot(idx).handle()],
        });
        Ok(())
    }

    /// Takes a node's slot out of the flat order without destroying it; a
    /// group's children are lifted into its place first. The node keeps its
    /// identity, name, and selection until it is attached again.
    pub(crate) fn detach(&mut self, idx: u32) {
        self.lift_children(idx);
        self.unlink(idx);
        self.commit();
    }

    /// Links a detached node so that it ends up at flat `position`.
    pub(crate) fn attach_at_flat(&mut self, idx: u32, position: usize) -> Result<(), IndexError> {
        let (p, offset) = self.insertion_point(position)?;
        self.link(p, offset, idx);
        self.commit();
        Ok(())
    }

    /// Where a node inserted at flat position `position` has to be linked:
    /// before the node currently at `position`, or appended to the root when
    /// `position == len()`.
    pub(crate) fn insertion_point(&self, position: usize) -> Result<(u32, usize), IndexError> {
        match position.cmp(&self.len()) {
            core::cmp::Ordering::Less => {
                let slot = self.traversal_order[position];
                Ok((self.parent[slot as usize], self.offset_in_parent(slot)))
            }
            core::cmp::Ordering::Equal => {
                Ok((ROOT_SLOT, self.slot(ROOT_SLOT).child_slots().len()))
            }
            core::cmp::Ordering::Greater => Err(IndexError::Flat {
                position,
                len: self.len(),
            }),
        }
    }

    // -- Event outbox --

    /// Drains the recorded [`TreeEvent`]s, oldest first.
    pub fn take_events(&mut self) -> Vec<TreeEvent> {
        core::mem::take(&mut self.events)
    }

    /// Sets the origin stamped onto subsequently recorded events and returns
    /// the previous one.
    pub(crate) fn set_origin(&mut self, origin: Origin) -> Origin {
        core::mem::replace(&mut self.origin, origin)
    }

    pub(crate) fn record(&mut self, change: TreeChange) {
        self.events.push(TreeEvent {
            origin: self.origin,
            change,
        });
    }

    // -- Internal helpers --

    /// Returns the live slot behind `id`.
    pub(crate) fn resolve(&self, id: NodeId) -> Result<u32, NotFoundError> {
        if self.is_alive(id) {
            Ok(id.idx)
        } else {
            Err(NotFoundError(id))
        }
    }

    /// Like [`resolve`](Self::resolve), but rejects the root sentinel, which is
    /// not part of the flat order.
    pub(crate) fn resolve_member(&self, id: NodeId) -> Result<u32, NotFoundError> {
        if id.is_root() {
            return Err(NotFoundError(id));
        }
        self.resolve(id)
    }

    fn resolve_group(&self, id: NodeId) -> Result<u32, Error> {
        let idx = self.resolve(id)?;
        if self.slot(idx).is_group() {
            Ok(idx)
        } else {
            Err(IndexError::NotAGroup { node: id }.into())
        }
    }

    fn check_offset(&self, group: u32, offset: usize) -> Result<(), IndexError> {
        let len = self.slot(group).child_slots().len();
        if offset > len {
            Err(IndexError::Offset { offset, len })
        } else {
            Ok(())
        }
    }

    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the node in a live slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is free; callers only pass slots reached through
    /// topology links or validated handles.
    pub(crate) fn slot(&self, idx: u32) -> &Node {
        self.nodes[idx as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("slot {idx} is not live"))
    }

    pub(crate) fn slot_mut(&mut self, idx: u32) -> &mut Node {
        self.nodes[idx as usize]
            .as_mut()
            .unwrap_or_else(|| panic!("slot {idx} is not live"))
    }

    pub(crate) fn offset_in_parent(&self, idx: u32) -> usize {
        let p = self.parent[idx as usize];
        if p == INVALID {
            return 0;
        }
        self.slot(p)
            .child_slots()
            .iter()
            .position(|&c| c == idx)
            .unwrap_or_else(|| panic!("slot {idx} missing from its parent's children"))
    }

    pub(crate) fn slot_in_subtree(&self, ancestor: u32, mut idx: u32) -> bool {
        loop {
            if idx == ancestor {
                return true;
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return false;
            }
        }
    }

    /// Slots of the subtree rooted at `idx`, in flat order (uses the cache).
    pub(crate) fn subtree_slots(&self, idx: u32) -> Vec<u32> {
        let start = self.flat_position[idx as usize] as usize;
        let len = self.subtree_len[idx as usize] as usize;
        self.traversal_order[start..start + len].to_vec()
    }

    /// Validates `ids`, drops duplicates and nodes lying below another entry,
    /// and returns the remaining slots sorted by flat position.
    fn outermost_members(&self, ids: &[NodeId]) -> Result<Vec<u32>, NotFoundError> {
        let mut slots = BTreeSet::new();
        for &id in ids {
            slots.insert(self.resolve_member(id)?);
        }
        let mut outermost: Vec<u32> = slots
            .iter()
            .copied()
            .filter(|&s| {
                let mut p = self.parent[s as usize];
                while p != INVALID {
                    if slots.contains(&p) {
                        return false;
                    }
                    p = self.parent[p as usize];
                }
                true
            })
            .collect();
        outermost.sort_unstable_by_key(|&s| self.flat_position[s as usize]);
        Ok(outermost)
    }

    /// Unlinks `idx` and relinks it into `dest` before `anchor` (or at the
    /// end), then records the move.
    fn relocate(&mut self, idx: u32, dest: u32, anchor: Option<u32>) {
        let from = self.flat_position[idx as usize] as usize;
        let handles = self
            .subtree_slots(idx)
            .into_iter()
            .map(|s| self.slot(s).handle())
            .collect();

        self.unlink(idx);
        let offset = match anchor {
            Some(a) => self.offset_in_parent(a),
            None => self.slot(dest).child_slots().len(),
        };
        self.link(dest, offset, idx);
        self.commit();

        let to = self.flat_position[idx as usize] as usize;
        if from != to {
            self.record(TreeChange::NodeMoved {
                node: self.id_at(idx),
                from,
                to,
                handles,
            });
        }
    }

    /// Moves all children of `idx` into its parent, right after it.
    fn lift_children(&mut self, idx: u32) -> Vec<u32> {
        let children = match self.slot_mut(idx).as_group_mut() {
            Some(group) => core::mem::take(&mut group.children),
            None => return Vec::new(),
        };
        let p = self.parent[idx as usize];
        let offset = self.offset_in_parent(idx);
        for (i, &c) in children.iter().enumerate() {
            self.parent[c as usize] = INVALID;
            self.dirty.remove_dependency(c, idx, dirty::STRUCTURE);
            self.link(p, offset + 1 + i, c);
        }
        children
    }

    /// Links the detached node `child` into `parent` at `offset`.
    pub(crate) fn link(&mut self, parent: u32, offset: usize, child: u32) {
        debug_assert!(
            self.parent[child as usize] == INVALID,
            "slot {child} is still linked"
        );
        self.parent[child as usize] = parent;
        if let Some(group) = self.slot_mut(parent).as_group_mut() {
            group.children.insert(offset, child);
        }

        let _ = self.dirty.add_dependency(child, parent, dirty::STRUCTURE);
        self.dirty.mark_with(child, dirty::STRUCTURE, &EagerPolicy);
        self.dirty.mark(parent, dirty::STRUCTURE);
        self.traversal_dirty = true;
    }

    /// Removes `idx` from its parent's child list.
    pub(crate) fn unlink(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if p == INVALID {
            return;
        }
        let offset = self.offset_in_parent(idx);
        if let Some(group) = self.slot_mut(p).as_group_mut() {
            group.children.remove(offset);
        }
        self.parent[idx as usize] = INVALID;

        self.dirty.remove_dependency(idx, p, dirty::STRUCTURE);
        // Later siblings shift by one.
        self.dirty.mark_with(p, dirty::STRUCTURE, &EagerPolicy);
        self.traversal_dirty = true;
    }

    pub(crate) fn alloc(&mut self, node: Node) -> u32 {
        let handle = node.handle();
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.nodes[idx as usize] = Some(node);
            self.flat_position[idx as usize] = INVALID;
            self.subtree_len[idx as usize] = 0;
            idx
        } else {
            // Allocate a new slot.
            let idx = u32::try_from(self.nodes.len()).unwrap_or_else(|_| panic!("slot space exhausted"));
            self.parent.push(INVALID);
            self.nodes.push(Some(node));
            self.generation.push(0);
            self.flat_position.push(INVALID);
            self.subtree_len.push(0);
            idx
        };
        self.handles.insert(handle, idx);
        self.pending_added.push(idx);
        idx
    }

    fn alloc_group(&mut self, handle: ItemHandle, name: Option<String>) -> u32 {
        let name = name.unwrap_or_else(|| self.default_group_name());
        self.alloc(Node::Group(GroupLayer::new(handle, name)))
    }

    /// Frees a slot whose node has already been detached from the topology.
    pub(crate) fn free(&mut self, idx: u32) {
        let id = self.id_at(idx);
        if let Some(node) = self.nodes[idx as usize].take() {
            self.handles.remove(&node.handle());
        }
        self.parent[idx as usize] = INVALID;
        self.selection.remove(&id);
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        self.pending_added.retain(|&a| a != idx);
        self.pending_removed.push(id);
        self.traversal_dirty = true;
    }

    /// Mints a group handle, skipping keys a host already put in the tree.
    fn mint_group_handle(&mut self) -> ItemHandle {
        loop {
            let handle = ItemHandle::group(self.next_group_key);
            self.next_group_key += 1;
            if !self.handles.contains_key(&handle) {
                return handle;
            }
        }
    }

    pub(super) fn default_group_name(&mut self) -> String {
        self.groups_named += 1;
        format!("Group {}", self.groups_named)
    }

    /// Brings the flat-order cache and the group selection state up to date
    /// after a topology edit.
    pub(crate) fn commit(&mut self) {
        if self.traversal_dirty {
            self.rebuild_traversal_order();
            self.topology_changed = true;
            self.traversal_dirty = false;
        }
        self.reconcile_selection();
    }
}
