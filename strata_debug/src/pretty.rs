// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Every line
//! starts with the bridge step so that the events of one request or list
//! event can be read together.

use std::io::Write;

use strata_core::trace::{
    DispatchEvent, EchoSuppressedEvent, ListEventReceived, RejectedEvent, RequestEvent,
    ResyncEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_request(&mut self, e: &RequestEvent) {
        let _ = writeln!(self.writer, "[{}] request {:?}", e.step, e.request);
    }

    fn on_rejected(&mut self, e: &RejectedEvent) {
        let _ = writeln!(
            self.writer,
            "[{}] rejected {:?}: {:?}",
            e.step, e.request, e.error,
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let _ = writeln!(
            self.writer,
            "[{}] dispatch #{} {:?} items={}",
            e.step, e.tag, e.kind, e.items,
        );
    }

    fn on_list_event(&mut self, e: &ListEventReceived) {
        match e.tag {
            Some(tag) => {
                let _ = writeln!(self.writer, "[{}] list {:?} #{tag}", e.step, e.kind);
            }
            None => {
                let _ = writeln!(self.writer, "[{}] list {:?} untagged", e.step, e.kind);
            }
        }
    }

    fn on_echo_suppressed(&mut self, e: &EchoSuppressedEvent) {
        let _ = writeln!(self.writer, "[{}] echo #{} {:?}", e.step, e.tag, e.kind);
    }

    fn on_resync(&mut self, e: &ResyncEvent) {
        let _ = writeln!(
            self.writer,
            "[{}] RESYNC removed={} created={} retained={}",
            e.step, e.removed, e.created, e.retained,
        );
    }
}
