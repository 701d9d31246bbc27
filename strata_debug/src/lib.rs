// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON snapshots for strata diagnostics.
//!
//! This crate provides [`TraceSink`](strata_core::trace::TraceSink)
//! implementations for development and post-mortem analysis, plus a tree
//! dump for tests and bug reports:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`snapshot`]: a JSON rendering of a
//!   [`GroupTree`](strata_core::tree::GroupTree) (nesting, names, items,
//!   selection) that compares equal exactly when two trees are
//!   indistinguishable through the public API.

pub mod pretty;
pub mod recorder;
pub mod snapshot;
