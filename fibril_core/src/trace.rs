// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the work loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! renderer calls as it schedules, slices and commits work. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates per-fiber [`UnitOfWorkEvent`]s
//!   and the corresponding `TraceSink` method.

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How a [`work_loop`](crate::work_loop::Renderer::work_loop) slice ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SliceOutcome {
    /// Nothing was scheduled.
    Idle,
    /// The deadline or unit cap was reached with work left.
    Yielded,
    /// The traversal finished and the tree was committed.
    Completed,
    /// Reconciliation failed and the work-in-progress tree was discarded.
    Failed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted at the start of the first slice after a render was scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderScheduledEvent {
    /// Monotonic render counter.
    pub render_index: u64,
    /// Fibers of an uncommitted tree that the new render discarded.
    pub discarded_fibers: u32,
}

/// Emitted at the end of every slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceEvent {
    /// Render counter.
    pub render_index: u64,
    /// Units of work performed in this slice.
    pub units: u32,
    /// How the slice ended.
    pub outcome: SliceOutcome,
}

/// Emitted after each unit of work (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitOfWorkEvent {
    /// Render counter.
    pub render_index: u64,
    /// Slot index of the fiber that was processed.
    pub fiber_index: u32,
    /// Whether a host node was created for the fiber.
    pub materialized: bool,
    /// Child fibers tagged PLACEMENT.
    pub placed: u32,
    /// Child fibers tagged UPDATE.
    pub updated: u32,
    /// Old child fibers tagged DELETION.
    pub deleted: u32,
}

/// Per-render totals, emitted once the render commits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Render counter.
    pub render_index: u64,
    /// Slices the render took, including the committing one.
    pub slices: u32,
    /// Units of work performed.
    pub units: u32,
    /// Host nodes inserted.
    pub placements: u32,
    /// Updated fibers whose props changed.
    pub updates: u32,
    /// Deleted fibers that removed host nodes.
    pub deletions: u32,
    /// Property operations issued during commit.
    pub property_ops: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the renderer.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a newly scheduled render starts running.
    fn on_render_scheduled(&mut self, e: &RenderScheduledEvent) {
        _ = e;
    }

    /// Called at the end of each slice.
    fn on_slice(&mut self, e: &SliceEvent) {
        _ = e;
    }

    /// Called after each unit of work (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_unit_of_work(&mut self, e: &UnitOfWorkEvent) {
        _ = e;
    }

    /// Called with per-render totals at commit.
    fn on_render_summary(&mut self, s: &RenderSummary) {
        _ = s;
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

    /// Emits a [`RenderScheduledEvent`].
    #[inline]
    pub fn render_scheduled(&mut self, e: &RenderScheduledEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_scheduled(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SliceEvent`].
    #[inline]
    pub fn slice(&mut self, e: &SliceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slice(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`UnitOfWorkEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn unit_of_work(&mut self, e: &UnitOfWorkEvent) {
        if let Some(s) = &mut self.sink {
            s.on_unit_of_work(e);
        }
    }

    /// Emits a [`RenderSummary`].
    #[inline]
    pub fn render_summary(&mut self, s: &RenderSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_render_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_slice() -> SliceEvent {
        SliceEvent {
            render_index: 3,
            units: 12,
            outcome: SliceOutcome::Yielded,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_render_scheduled(&RenderScheduledEvent {
            render_index: 1,
            discarded_fibers: 0,
        });
        sink.on_slice(&sample_slice());
        sink.on_render_summary(&RenderSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.slice(&sample_slice());
        tracer.render_summary(&RenderSummary::default());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            slices: Vec<(u64, u32)>,
        }
        impl TraceSink for RecordingSink {
            fn on_slice(&mut self, e: &SliceEvent) {
                self.slices.push((e.render_index, e.units));
            }
        }

        let mut sink = RecordingSink { slices: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.slice(&sample_slice());
        drop(tracer);
        assert_eq!(sink.slices, &[(3, 12)], "slice reached the sink");
    }
}
