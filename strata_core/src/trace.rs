// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the sync bridge.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`SyncBridge`](crate::bridge::SyncBridge) calls at each step of the
//! protocol. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Every event carries the bridge's `step`: a counter that increases once per
//! request or ingested list event, so a recorded trace can be regrouped by
//! the operation that caused it.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::error::ErrorKind;
use crate::event::ChangeKind;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which tree-side request entry point was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Form a group around nodes.
    Group,
    /// Dissolve a group.
    Ungroup,
    /// Move one node to a nested index.
    Move,
    /// Move several nodes to a nested index.
    MoveMany,
    /// Select nodes.
    Select,
    /// Deselect nodes.
    Deselect,
    /// Toggle nodes.
    Toggle,
    /// Clear the selection.
    ClearSelection,
    /// Delete nodes with their subtrees.
    Delete,
    /// Insert a new empty group.
    NewGroup,
    /// Rename a group.
    Rename,
    /// Show or hide nodes with their subtrees.
    SetVisible,
    /// Flip the visibility of leaves.
    ToggleVisibility,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a tree-side request enters the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestEvent {
    /// Bridge step counter.
    pub step: u64,
    /// Which request.
    pub request: RequestKind,
}

/// Emitted when a request is rejected by validation. Nothing changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RejectedEvent {
    /// Bridge step counter.
    pub step: u64,
    /// Which request.
    pub request: RequestKind,
    /// Why it was rejected.
    pub error: ErrorKind,
}

/// Emitted when a tree change is applied to the main list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchEvent {
    /// Bridge step counter.
    pub step: u64,
    /// Echo tag attached to the list operation.
    pub tag: u64,
    /// Category of the list operation.
    pub kind: ChangeKind,
    /// Number of items the operation carried.
    pub items: u32,
}

/// Emitted when a main-list event reaches the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListEventReceived {
    /// Bridge step counter.
    pub step: u64,
    /// Category of the list change.
    pub kind: ChangeKind,
    /// Echo tag carried by the event, if any.
    pub tag: Option<u64>,
}

/// Emitted when a list event is recognized as the echo of an operation the
/// bridge issued itself, and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EchoSuppressedEvent {
    /// Bridge step counter.
    pub step: u64,
    /// The matched tag.
    pub tag: u64,
    /// Category of the dropped change.
    pub kind: ChangeKind,
}

/// Emitted (at warning level) after the tree was rebuilt from the main list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResyncEvent {
    /// Bridge step counter.
    pub step: u64,
    /// Nodes destroyed by the rebuild.
    pub removed: u32,
    /// Nodes created by the rebuild.
    pub created: u32,
    /// Nodes that survived the rebuild.
    pub retained: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the sync bridge.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a tree-side request enters the bridge.
    fn on_request(&mut self, e: &RequestEvent) {
        _ = e;
    }

    /// Called when a request is rejected.
    fn on_rejected(&mut self, e: &RejectedEvent) {
        _ = e;
    }

    /// Called when a tree change is applied to the main list.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called when a main-list event arrives.
    fn on_list_event(&mut self, e: &ListEventReceived) {
        _ = e;
    }

    /// Called when an echo is dropped.
    fn on_echo_suppressed(&mut self, e: &EchoSuppressedEvent) {
        _ = e;
    }

    /// Called after a resync.
    fn on_resync(&mut self, e: &ResyncEvent) {
        _ = e;
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn on_request(&mut self, e: &RequestEvent) {
        (**self).on_request(e);
    }

    fn on_rejected(&mut self, e: &RejectedEvent) {
        (**self).on_rejected(e);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        (**self).on_dispatch(e);
    }

    fn on_list_event(&mut self, e: &ListEventReceived) {
        (**self).on_list_event(e);
    }

    fn on_echo_suppressed(&mut self, e: &EchoSuppressedEvent) {
        (**self).on_echo_suppressed(e);
    }

    fn on_resync(&mut self, e: &ResyncEvent) {
        (**self).on_resync(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RequestEvent`].
    #[inline]
    pub fn request(&mut self, e: &RequestEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_request(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RejectedEvent`].
    #[inline]
    pub fn rejected(&mut self, e: &RejectedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_rejected(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&mut self, e: &DispatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dispatch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ListEventReceived`].
    #[inline]
    pub fn list_event(&mut self, e: &ListEventReceived) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_list_event(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EchoSuppressedEvent`].
    #[inline]
    pub fn echo_suppressed(&mut self, e: &EchoSuppressedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_echo_suppressed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ResyncEvent`].
    #[inline]
    pub fn resync(&mut self, e: &ResyncEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_resync(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
