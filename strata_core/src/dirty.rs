// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Strata uses multi-channel dirty tracking (via [`understory_dirty`]) to tell
//! the presentation layer which rows need repainting. Each channel represents
//! an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`STRUCTURE`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) along child-to-parent
//!   dependency edges. Moving a group changes the nested index of every
//!   descendant, so marking the group marks its whole subtree.
//!
//! - **Local-only**: [`SELECTION`], [`NAME`], and [`VISIBILITY`] are marked
//!   per node. The selection and visibility edits already mark every node
//!   whose state flips, so no graph propagation is needed.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Each
//! [`GroupTree::take_delta`](crate::tree::GroupTree::take_delta) call drains
//! all channels into a [`TreeDelta`](crate::tree::TreeDelta), which
//! presentation layers [consume](crate::view::TreeView::apply).

use understory_dirty::Channel;

/// Parent, position, or nested index changed.
pub const STRUCTURE: Channel = Channel::new(0);

/// Selection state flipped.
pub const SELECTION: Channel = Channel::new(1);

/// Group name changed.
pub const NAME: Channel = Channel::new(2);

/// Visibility flag flipped.
pub const VISIBILITY: Channel = Channel::new(3);
