// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use fibril_core::trace::{
    RenderScheduledEvent, RenderSummary, SliceEvent, SliceOutcome, TraceSink, UnitOfWorkEvent,
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

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn outcome_name(outcome: SliceOutcome) -> &'static str {
    match outcome {
        SliceOutcome::Idle => "idle",
        SliceOutcome::Yielded => "yield",
        SliceOutcome::Completed => "done",
        SliceOutcome::Failed => "FAILED",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_render_scheduled(&mut self, e: &RenderScheduledEvent) {
        let _ = writeln!(
            self.writer,
            "[schedule] render={} discarded={}",
            e.render_index, e.discarded_fibers,
        );
    }

    fn on_slice(&mut self, e: &SliceEvent) {
        let _ = writeln!(
            self.writer,
            "[slice] render={} units={} {}",
            e.render_index,
            e.units,
            outcome_name(e.outcome),
        );
    }

    fn on_unit_of_work(&mut self, e: &UnitOfWorkEvent) {
        let created = if e.materialized { " +node" } else { "" };
        let _ = writeln!(
            self.writer,
            "[unit] render={} fiber={}{created} children: +{} ~{} -{}",
            e.render_index, e.fiber_index, e.placed, e.updated, e.deleted,
        );
    }

    fn on_render_summary(&mut self, s: &RenderSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] render={} slices={} units={} placed={} updated={} \
             deleted={} props={}",
            s.render_index,
            s.slices,
            s.units,
            s.placements,
            s.updates,
            s.deletions,
            s.property_ops,
        );
    }
}
