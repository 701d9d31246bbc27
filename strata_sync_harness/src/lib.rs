// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable session driver and consistency grading for sync scenarios.
//!
//! A [`Session`] owns a [`SyncBridge`] over an in-memory [`VecList`] and plays
//! the role of the host: after every request or external list edit it pumps
//! the list's queued events back into the bridge, the way a real host
//! delivers change notifications. [`check`] inspects a bridge for every
//! invariant that must hold between two operations, and [`grade`] folds the
//! result and the session counters into a single verdict.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

use strata_core::bridge::{BridgeNotice, ListOutcome, SyncBridge};
use strata_core::error::{DesyncError, Error};
use strata_core::index::NestedIndex;
use strata_core::item::ItemHandle;
use strata_core::list::{MainList, VecList};
use strata_core::trace::{NoopSink, TraceSink};
use strata_core::tree::{GroupTree, NodeId};

/// Counters accumulated by a [`Session`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Tree-side requests issued.
    pub requests: u64,
    /// Requests that returned an error.
    pub rejected: u64,
    /// List events mirrored onto the tree.
    pub applied: u64,
    /// List events dropped as echoes.
    pub echoes: u64,
    /// Resyncs, whether triggered by a request or by a list event.
    pub resyncs: u64,
}

/// Drives a [`SyncBridge`] over a [`VecList`] like a host would.
#[derive(Debug)]
pub struct Session<S = NoopSink> {
    bridge: SyncBridge<VecList, S>,
    stats: SessionStats,
}

impl Session {
    /// Starts a session over a list holding `items`.
    pub fn new(items: impl IntoIterator<Item = ItemHandle>) -> Self {
        Self::with_sink(items, NoopSink)
    }
}

impl<S: TraceSink> Session<S> {
    /// Starts a session whose bridge reports to `sink`.
    pub fn with_sink(items: impl IntoIterator<Item = ItemHandle>, sink: S) -> Self {
        Self {
            bridge: SyncBridge::with_sink(VecList::from_items(items), sink),
            stats: SessionStats::default(),
        }
    }

    /// The bridge.
    #[must_use]
    pub fn bridge(&self) -> &SyncBridge<VecList, S> {
        &self.bridge
    }

    /// The tree side.
    #[must_use]
    pub fn tree(&self) -> &GroupTree {
        self.bridge.tree()
    }

    /// The list side.
    #[must_use]
    pub fn list(&self) -> &VecList {
        self.bridge.list()
    }

    /// Direct access to the list, bypassing the pump.
    ///
    /// Use the `*_silently` edits of [`VecList`] to simulate lost
    /// notifications.
    pub fn list_mut(&mut self) -> &mut VecList {
        self.bridge.list_mut()
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The node tracking `handle`.
    #[must_use]
    pub fn node(&self, handle: ItemHandle) -> Option<NodeId> {
        self.tree().node_for_handle(handle)
    }

    /// Items of the tree in flat order.
    #[must_use]
    pub fn tree_items(&self) -> Vec<ItemHandle> {
        let tree = self.tree();
        tree.flat_order()
            .filter_map(|id| tree.handle(id).ok())
            .collect()
    }

    /// Runs a request against the bridge, then pumps list events.
    pub fn request<T>(
        &mut self,
        request: impl FnOnce(&mut SyncBridge<VecList, S>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.stats.requests += 1;
        let result = request(&mut self.bridge);
        match &result {
            Ok(_) => {}
            Err(Error::Desync(_)) => {
                self.stats.rejected += 1;
                self.stats.resyncs += 1;
            }
            Err(_) => self.stats.rejected += 1,
        }
        self.pump();
        result
    }

    /// Applies an external edit to the list, then pumps list events.
    pub fn external(
        &mut self,
        edit: impl FnOnce(&mut VecList) -> Result<(), DesyncError>,
    ) -> Result<Vec<ListOutcome>, DesyncError> {
        edit(self.bridge.list_mut())?;
        Ok(self.pump())
    }

    /// Delivers queued list events until none are left.
    pub fn pump(&mut self) -> Vec<ListOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let events = self.bridge.list_mut().take_events();
            if events.is_empty() {
                return outcomes;
            }
            for event in &events {
                let outcome = self.bridge.on_main_list_event(event);
                match outcome {
                    ListOutcome::Applied => self.stats.applied += 1,
                    ListOutcome::Echo => self.stats.echoes += 1,
                    ListOutcome::Resynced(_) => self.stats.resyncs += 1,
                }
                outcomes.push(outcome);
            }
        }
    }

    /// Drains the bridge's notices.
    pub fn take_notices(&mut self) -> Vec<BridgeNotice> {
        self.bridge.take_notices()
    }

    /// Runs [`check`] on the bridge.
    #[must_use]
    pub fn check(&self) -> Vec<Violation> {
        check(&self.bridge)
    }

    /// Ends the session and returns the bridge.
    pub fn into_bridge(self) -> SyncBridge<VecList, S> {
        self.bridge
    }
}

/// An invariant that does not hold between two operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// The two sides hold different items or orders.
    Misaligned(DesyncError),
    /// Converting a flat position to a nested index and back did not return
    /// the same position.
    RoundTrip {
        /// Starting flat position.
        position: usize,
        /// Nested index it converted to, if any.
        index: Option<NestedIndex>,
    },
    /// The node at a flat position reports a different position, or a
    /// position past the end resolves to a node.
    Coverage {
        /// Flat position that was checked.
        position: usize,
    },
    /// A non-empty group's selection disagrees with its children.
    IncoherentGroup {
        /// The offending group.
        group: NodeId,
    },
    /// The tree and the list select different leaves. Group slots are
    /// ignored on both sides.
    SelectionMismatch {
        /// Flat positions of the leaves the tree selects.
        tree: Vec<usize>,
        /// Flat positions of the leaves the list selects.
        list: Vec<usize>,
    },
    /// Echo tags are still waiting after the list went quiet.
    EchoesInFlight(usize),
    /// The list still holds undelivered events.
    UnpumpedEvents(usize),
}

/// Checks every between-operations invariant of `bridge`.
#[must_use]
pub fn check<S: TraceSink>(bridge: &SyncBridge<VecList, S>) -> Vec<Violation> {
    let mut violations = Vec::new();
    let tree = bridge.tree();
    let list = bridge.list();

    if let Err(cause) = bridge.check_alignment() {
        violations.push(Violation::Misaligned(cause));
    }

    let len = tree.len();
    for position in 0..len {
        let index = tree.flat_to_nested(position).ok();
        let back = index.as_ref().and_then(|i| tree.nested_to_flat(i).ok());
        if back != Some(position) {
            violations.push(Violation::RoundTrip { position, index });
        }
        let reported = tree
            .node_at_flat(position)
            .ok()
            .and_then(|id| tree.flat_position(id).ok());
        if reported != Some(position) {
            violations.push(Violation::Coverage { position });
        }
    }
    if tree.node_at_flat(len).is_ok() {
        violations.push(Violation::Coverage { position: len });
    }

    for group in tree.flat_order() {
        let Ok(children) = tree.children(group) else {
            continue;
        };
        if children.len() == 0 {
            continue;
        }
        let all = children.clone().all(|c| tree.is_selected(c));
        if tree.is_selected(group) != all {
            violations.push(Violation::IncoherentGroup { group });
        }
    }

    let tree_leaves = tree.selected_leaf_positions();
    let list_leaves: Vec<usize> = list
        .selected_positions()
        .into_iter()
        .filter(|&p| list.get(p).is_some_and(|h| !h.is_group()))
        .collect();
    if tree_leaves != list_leaves {
        violations.push(Violation::SelectionMismatch {
            tree: tree_leaves,
            list: list_leaves,
        });
    }

    if list.pending_events() > 0 {
        violations.push(Violation::UnpumpedEvents(list.pending_events()));
    } else if bridge.in_flight() > 0 {
        violations.push(Violation::EchoesInFlight(bridge.in_flight()));
    }

    violations
}

/// Overall verdict for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consistency {
    /// No violations and no resyncs.
    Clean,
    /// No violations, but the bridge had to resync at least once.
    Recovered,
    /// At least one invariant does not hold.
    Broken,
}

impl Consistency {
    /// Returns a short label for reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Recovered => "recovered",
            Self::Broken => "broken",
        }
    }
}

/// Grades a session from its counters and the latest [`check`] result.
#[must_use]
pub fn grade(stats: &SessionStats, violations: &[Violation]) -> Consistency {
    if !violations.is_empty() {
        Consistency::Broken
    } else if stats.resyncs > 0 {
        Consistency::Recovered
    } else {
        Consistency::Clean
    }
}
