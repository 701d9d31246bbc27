// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested layer groups kept in sync with a flat, externally owned item list.
//!
//! `strata_core` lets a user organize the items of a flat *main list* into an
//! arbitrarily nested tree of groups, while the list and the tree stay
//! consistent in both directions. It is `no_std` compatible (with `alloc`)
//! and stores nodes in slot arrays with generational handles.
//!
//! # Architecture
//!
//! ```text
//!   request_*()                          external list edit
//!       │                                       │
//!       ▼                                       ▼
//!   SyncBridge ──► GroupTree ──► TreeEvent ──► MainList ──► ListEvent
//!       ▲                │                                     │
//!       │                ▼                                     │
//!       │           take_delta() ──► TreeView::apply()         │
//!       └──────────────── on_main_list_event() ◄───────────────┘
//! ```
//!
//! **[`tree`]**: Slot-based group tree with generational [`NodeId`]
//! handles. Leaves wrap one main-list item; groups are items themselves and
//! own an ordered run of children.
//!
//! **[`index`]**: The flat-position convention (pre-order, group before its
//! children, every node one slot) and conversions to and from
//! [`NestedIndex`] paths.
//!
//! **[`selection`]**: Downward and upward selection propagation.
//!
//! **[`visibility`]**: Per-node visibility flags, set downward over subtrees.
//!
//! **[`bridge`]**: The [`SyncBridge`] protocol translating tree edits into
//! tagged list operations and list events into tree edits, with echo
//! suppression and resync on divergence.
//!
//! **[`list`]**: The [`MainList`] contract plus the in-memory
//! [`VecList`](list::VecList).
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! STRUCTURE propagates to descendants; SELECTION, NAME, and VISIBILITY are
//! local-only.
//!
//! **[`view`]**: The [`TreeView`](view::TreeView) trait that presentation
//! layers implement to consume change deltas.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! bridge instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//!
//! [`NodeId`]: tree::NodeId
//! [`NestedIndex`]: index::NestedIndex
//! [`SyncBridge`]: bridge::SyncBridge
//! [`MainList`]: list::MainList

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod bridge;
pub mod dirty;
pub mod error;
pub mod event;
pub mod index;
pub mod item;
pub mod list;
pub mod selection;
pub mod trace;
pub mod tree;
pub mod view;
pub mod visibility;
