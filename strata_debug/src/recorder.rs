// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use strata_core::error::ErrorKind;
use strata_core::event::ChangeKind;
use strata_core::trace::{
    DispatchEvent, EchoSuppressedEvent, ListEventReceived, RejectedEvent, RequestEvent,
    RequestKind, ResyncEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_REQUEST: u8 = 1;
const TAG_REJECTED: u8 = 2;
const TAG_DISPATCH: u8 = 3;
const TAG_LIST_EVENT: u8 = 4;
const TAG_ECHO_SUPPRESSED: u8 = 5;
const TAG_RESYNC: u8 = 6;

const REQUEST_KINDS: [RequestKind; 13] = [
    RequestKind::Group,
    RequestKind::Ungroup,
    RequestKind::Move,
    RequestKind::MoveMany,
    RequestKind::Select,
    RequestKind::Deselect,
    RequestKind::Toggle,
    RequestKind::ClearSelection,
    RequestKind::Delete,
    RequestKind::NewGroup,
    RequestKind::Rename,
    RequestKind::SetVisible,
    RequestKind::ToggleVisibility,
];

const CHANGE_KINDS: [ChangeKind; 7] = [
    ChangeKind::Added,
    ChangeKind::Removed,
    ChangeKind::Moved,
    ChangeKind::Selection,
    ChangeKind::Batch,
    ChangeKind::GroupFormed,
    ChangeKind::GroupDissolved,
];

const ERROR_KINDS: [ErrorKind; 4] = [
    ErrorKind::Index,
    ErrorKind::Cycle,
    ErrorKind::NotFound,
    ErrorKind::Desync,
];

/// Position of `value` in its code table.
#[expect(
    clippy::cast_possible_truncation,
    reason = "code tables have fewer than 256 entries"
)]
fn code_of<T: PartialEq>(table: &[T], value: &T) -> u8 {
    table.iter().position(|v| v == value).map_or(u8::MAX, |i| i as u8)
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_request(&mut self, r: RequestKind) {
        self.write_u8(code_of(&REQUEST_KINDS, &r));
    }

    fn write_change(&mut self, k: ChangeKind) {
        self.write_u8(code_of(&CHANGE_KINDS, &k));
    }

    fn write_error(&mut self, k: ErrorKind) {
        self.write_u8(code_of(&ERROR_KINDS, &k));
    }
}

impl TraceSink for RecorderSink {
    fn on_request(&mut self, e: &RequestEvent) {
        self.write_u8(TAG_REQUEST);
        self.write_u64(e.step);
        self.write_request(e.request);
    }

    fn on_rejected(&mut self, e: &RejectedEvent) {
        self.write_u8(TAG_REJECTED);
        self.write_u64(e.step);
        self.write_request(e.request);
        self.write_error(e.error);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.write_u8(TAG_DISPATCH);
        self.write_u64(e.step);
        self.write_u64(e.tag);
        self.write_change(e.kind);
        self.write_u32(e.items);
    }

    fn on_list_event(&mut self, e: &ListEventReceived) {
        self.write_u8(TAG_LIST_EVENT);
        self.write_u64(e.step);
        self.write_change(e.kind);
        self.write_option_u64(e.tag);
    }

    fn on_echo_suppressed(&mut self, e: &EchoSuppressedEvent) {
        self.write_u8(TAG_ECHO_SUPPRESSED);
        self.write_u64(e.step);
        self.write_u64(e.tag);
        self.write_change(e.kind);
    }

    fn on_resync(&mut self, e: &ResyncEvent) {
        self.write_u8(TAG_RESYNC);
        self.write_u64(e.step);
        self.write_u32(e.removed);
        self.write_u32(e.created);
        self.write_u32(e.retained);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`RequestEvent`].
    Request(RequestEvent),
    /// A [`RejectedEvent`].
    Rejected(RejectedEvent),
    /// A [`DispatchEvent`].
    Dispatch(DispatchEvent),
    /// A [`ListEventReceived`].
    ListEvent(ListEventReceived),
    /// An [`EchoSuppressedEvent`].
    EchoSuppressed(EchoSuppressedEvent),
    /// A [`ResyncEvent`].
    Resync(ResyncEvent),
}

impl RecordedEvent {
    /// The bridge step the event belongs to.
    #[must_use]
    pub fn step(&self) -> u64 {
        match self {
            Self::Request(e) => e.step,
            Self::Rejected(e) => e.step,
            Self::Dispatch(e) => e.step,
            Self::ListEvent(e) => e.step,
            Self::EchoSuppressed(e) => e.step,
            Self::Resync(e) => e.step,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_request(&mut self) -> Option<RequestKind> {
        REQUEST_KINDS.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_change(&mut self) -> Option<ChangeKind> {
        CHANGE_KINDS.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_error(&mut self) -> Option<ErrorKind> {
        ERROR_KINDS.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_request(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Request(RequestEvent {
            step: self.read_u64()?,
            request: self.read_request()?,
        }))
    }

    fn decode_rejected(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Rejected(RejectedEvent {
            step: self.read_u64()?,
            request: self.read_request()?,
            error: self.read_error()?,
        }))
    }

    fn decode_dispatch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Dispatch(DispatchEvent {
            step: self.read_u64()?,
            tag: self.read_u64()?,
            kind: self.read_change()?,
            items: self.read_u32()?,
        }))
    }

    fn decode_list_event(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ListEvent(ListEventReceived {
            step: self.read_u64()?,
            kind: self.read_change()?,
            tag: self.read_option_u64()?,
        }))
    }

    fn decode_echo_suppressed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EchoSuppressed(EchoSuppressedEvent {
            step: self.read_u64()?,
            tag: self.read_u64()?,
            kind: self.read_change()?,
        }))
    }

    fn decode_resync(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Resync(ResyncEvent {
            step: self.read_u64()?,
            removed: self.read_u32()?,
            created: self.read_u32()?,
            retained: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_REQUEST => self.decode_request(),
            TAG_REJECTED => self.decode_rejected(),
            TAG_DISPATCH => self.decode_dispatch(),
            TAG_LIST_EVENT => self.decode_list_event(),
            TAG_ECHO_SUPPRESSED => self.decode_echo_suppressed(),
            TAG_RESYNC => self.decode_resync(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
