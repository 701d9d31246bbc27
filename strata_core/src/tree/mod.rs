// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Group tree data model.
//!
//! A *group tree* arranges the items of a flat main list into nested groups.
//! Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed, preventing use-after-free bugs at the API level.
//! - A main-list item ([`ItemHandle`](crate::item::ItemHandle)). Leaves
//!   ([`GroupLayerNode`]) wrap one item each; groups ([`GroupLayer`]) are
//!   items in their own right and own an ordered run of children.
//! - Topology: a parent link and, for groups, an ordered child list.
//!
//! The *flat order* is the depth-first pre-order of the tree with the root
//! sentinel omitted; it is the order in which the main list holds the items.
//! A group immediately precedes its descendants, which occupy a contiguous
//! run of positions.
//!
//! # Dirty tracking
//!
//! Mutations automatically mark the corresponding dirty channel (see
//! [`dirty`](crate::dirty)):
//!
//! - **STRUCTURE**: propagates to all descendants, since a node's nested
//!   index depends on every ancestor's offset.
//! - **SELECTION** / **NAME** / **VISIBILITY**: local-only; only the flipped
//!   or renamed node is marked.

mod delta;
mod id;
mod node;
mod rebuild;
mod store;
mod traverse;

pub use delta::TreeDelta;
pub use id::{INVALID, NodeId};
pub(crate) use id::ROOT_SLOT;
pub use node::{GroupLayer, GroupLayerNode, Node};
pub use rebuild::ResyncReport;
pub use store::GroupTree;
pub use traverse::{Children, FlatOrder};
