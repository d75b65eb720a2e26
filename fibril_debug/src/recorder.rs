// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use fibril_core::trace::{
    RenderScheduledEvent, RenderSummary, SliceEvent, SliceOutcome, TraceSink, UnitOfWorkEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_RENDER_SCHEDULED: u8 = 1;
const TAG_SLICE: u8 = 2;
const TAG_UNIT_OF_WORK: u8 = 3;
const TAG_RENDER_SUMMARY: u8 = 4;

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

    fn write_outcome(&mut self, o: SliceOutcome) {
        self.write_u8(match o {
            SliceOutcome::Idle => 0,
            SliceOutcome::Yielded => 1,
            SliceOutcome::Completed => 2,
            SliceOutcome::Failed => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_render_scheduled(&mut self, e: &RenderScheduledEvent) {
        self.write_u8(TAG_RENDER_SCHEDULED);
        self.write_u64(e.render_index);
        self.write_u32(e.discarded_fibers);
    }

    fn on_slice(&mut self, e: &SliceEvent) {
        self.write_u8(TAG_SLICE);
        self.write_u64(e.render_index);
        self.write_u32(e.units);
        self.write_outcome(e.outcome);
    }

    fn on_unit_of_work(&mut self, e: &UnitOfWorkEvent) {
        self.write_u8(TAG_UNIT_OF_WORK);
        self.write_u64(e.render_index);
        self.write_u32(e.fiber_index);
        self.write_u8(u8::from(e.materialized));
        self.write_u32(e.placed);
        self.write_u32(e.updated);
        self.write_u32(e.deleted);
    }

    fn on_render_summary(&mut self, s: &RenderSummary) {
        self.write_u8(TAG_RENDER_SUMMARY);
        self.write_u64(s.render_index);
        self.write_u32(s.slices);
        self.write_u32(s.units);
        self.write_u32(s.placements);
        self.write_u32(s.updates);
        self.write_u32(s.deletions);
        self.write_u32(s.property_ops);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`RenderScheduledEvent`].
    RenderScheduled(RenderScheduledEvent),
    /// A [`SliceEvent`].
    Slice(SliceEvent),
    /// A [`UnitOfWorkEvent`].
    UnitOfWork(UnitOfWorkEvent),
    /// A [`RenderSummary`].
    RenderSummary(RenderSummary),
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
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_outcome(&mut self) -> Option<SliceOutcome> {
        Some(match self.read_u8()? {
            0 => SliceOutcome::Idle,
            1 => SliceOutcome::Yielded,
            2 => SliceOutcome::Completed,
            _ => SliceOutcome::Failed,
        })
    }

    fn decode_render_scheduled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderScheduled(RenderScheduledEvent {
            render_index: self.read_u64()?,
            discarded_fibers: self.read_u32()?,
        }))
    }

    fn decode_slice(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Slice(SliceEvent {
            render_index: self.read_u64()?,
            units: self.read_u32()?,
            outcome: self.read_outcome()?,
        }))
    }

    fn decode_unit_of_work(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UnitOfWork(UnitOfWorkEvent {
            render_index: self.read_u64()?,
            fiber_index: self.read_u32()?,
            materialized: self.read_u8()? != 0,
            placed: self.read_u32()?,
            updated: self.read_u32()?,
            deleted: self.read_u32()?,
        }))
    }

    fn decode_render_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderSummary(RenderSummary {
            render_index: self.read_u64()?,
            slices: self.read_u32()?,
            units: self.read_u32()?,
            placements: self.read_u32()?,
            updates: self.read_u32()?,
            deletions: self.read_u32()?,
            property_ops: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_RENDER_SCHEDULED => self.decode_render_scheduled(),
            TAG_SLICE => self.decode_slice(),
            TAG_UNIT_OF_WORK => self.decode_unit_of_work(),
            TAG_RENDER_SUMMARY => self.decode_render_summary(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fibril_core::element::Element;
    use fibril_core::trace::Tracer;
    use fibril_core::work_loop::{Renderer, WorkLoopConfig, WorkStatus};
    use fibril_harness::MemoryHost;
    use fibril_harness::deadline::Unlimited;

    fn record_stepwise_render() -> Vec<RecordedEvent> {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let mut renderer = Renderer::new(WorkLoopConfig::stepwise());
        renderer.render(Element::bare("ul", [Element::bare("li", ["a"])]), root);

        let mut rec = RecorderSink::new();
        loop {
            let status = renderer
                .work_loop_traced(&mut host, &Unlimited, &mut Tracer::new(&mut rec))
                .unwrap();
            if matches!(status, WorkStatus::Committed(_)) {
                break;
            }
        }
        decode(rec.as_bytes()).collect()
    }

    #[test]
    fn records_a_stepwise_render() {
        let events = record_stepwise_render();
        assert_eq!(
            events[0],
            RecordedEvent::RenderScheduled(RenderScheduledEvent {
                render_index: 1,
                discarded_fibers: 0,
            })
        );

        let slices: Vec<&SliceEvent> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Slice(s) => Some(s),
                _ => None,
            })
            .collect();
        // root, ul, li, text: one unit each.
        assert_eq!(slices.len(), 4);
        assert!(slices.iter().all(|s| s.units == 1), "got {slices:?}");
        assert_eq!(slices[3].outcome, SliceOutcome::Completed);

        match events.last() {
            Some(RecordedEvent::RenderSummary(s)) => {
                assert_eq!(s.slices, 4);
                assert_eq!(s.units, 4);
                assert_eq!(s.placements, 3);
                assert_eq!(s.deletions, 0);
            }
            other => panic!("expected RenderSummary, got {other:?}"),
        }
    }

    #[test]
    fn unit_events_precede_their_slice() {
        let events = record_stepwise_render();
        let kinds: Vec<u8> = events
            .iter()
            .map(|e| match e {
                RecordedEvent::RenderScheduled(_) => TAG_RENDER_SCHEDULED,
                RecordedEvent::Slice(_) => TAG_SLICE,
                RecordedEvent::UnitOfWork(_) => TAG_UNIT_OF_WORK,
                RecordedEvent::RenderSummary(_) => TAG_RENDER_SUMMARY,
            })
            .collect();
        assert_eq!(kinds, [1, 3, 2, 3, 2, 3, 2, 3, 2, 4]);
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_slice(&SliceEvent {
            render_index: 1,
            units: 2,
            outcome: SliceOutcome::Failed,
        });
        rec.on_slice(&SliceEvent {
            render_index: 1,
            units: 3,
            outcome: SliceOutcome::Yielded,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
        assert!(
            matches!(
                events[0],
                RecordedEvent::Slice(SliceEvent {
                    outcome: SliceOutcome::Failed,
                    ..
                })
            ),
            "got {events:?}"
        );
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
