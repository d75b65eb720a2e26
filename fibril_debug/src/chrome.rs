// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Recordings carry no wall-clock time. The exporter lays events out on a
//! virtual timeline where every unit of work advances the clock by
//! `us_per_unit` microseconds, and each slice starts a new idle period one
//! unit after the previous slice ended.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Slices become complete (`"X"`) events on thread 0; units of work are
/// instants on thread 1.
pub fn export(bytes: &[u8], us_per_unit: f64, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut clock = 0.0_f64;
    let mut slice_start = 0.0_f64;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::RenderScheduled(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RenderScheduled",
                    "cat": "Renderer",
                    "ts": clock,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "render_index": e.render_index,
                        "discarded_fibers": e.discarded_fibers,
                    }
                }));
            }
            RecordedEvent::UnitOfWork(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "UnitOfWork",
                    "cat": "Reconcile",
                    "ts": clock,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "render_index": e.render_index,
                        "fiber": e.fiber_index,
                        "materialized": e.materialized,
                        "placed": e.placed,
                        "updated": e.updated,
                        "deleted": e.deleted,
                    }
                }));
                clock += us_per_unit;
            }
            RecordedEvent::Slice(e) => {
                let dur = f64::from(e.units) * us_per_unit;
                // Slices without unit events (non-rich recordings) still
                // occupy their share of the timeline.
                let end = clock.max(slice_start + dur);
                events.push(json!({
                    "ph": "X",
                    "name": format!("{:?}", e.outcome),
                    "cat": "Slice",
                    "ts": slice_start,
                    "dur": end - slice_start,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "render_index": e.render_index,
                        "units": e.units,
                    }
                }));
                clock = end + us_per_unit;
                slice_start = clock;
            }
            RecordedEvent::RenderSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RenderSummary",
                    "cat": "Summary",
                    "ts": clock,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "render_index": s.render_index,
                        "slices": s.slices,
                        "units": s.units,
                        "placements": s.placements,
                        "updates": s.updates,
                        "deletions": s.deletions,
                        "property_ops": s.property_ops,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use fibril_core::trace::{RenderScheduledEvent, SliceEvent, SliceOutcome, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_render_scheduled(&RenderScheduledEvent {
            render_index: 1,
            discarded_fibers: 0,
        });
        rec.on_slice(&SliceEvent {
            render_index: 1,
            units: 4,
            outcome: SliceOutcome::Yielded,
        });
        rec.on_slice(&SliceEvent {
            render_index: 1,
            units: 2,
            outcome: SliceOutcome::Completed,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), 10.0, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "RenderScheduled");

        assert_eq!(parsed[1]["ph"], "X");
        assert_eq!(parsed[1]["name"], "Yielded");
        assert_eq!(parsed[1]["ts"], 0.0);
        assert_eq!(parsed[1]["dur"], 40.0);

        // The next slice starts one unit after the previous one ended.
        assert_eq!(parsed[2]["name"], "Completed");
        assert_eq!(parsed[2]["ts"], 50.0);
        assert_eq!(parsed[2]["dur"], 20.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], 1.0, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
