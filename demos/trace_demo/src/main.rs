// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated idle-callback loop that exercises the tracing and diagnostics
//! pipeline.
//!
//! Renders a growing todo list into a [`MemoryHost`] over several updates,
//! each driven by idle periods of a fixed simulated length. Events go to both
//! a [`PrettyPrintSink`](fibril_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](fibril_debug::recorder::RecorderSink); the recording is
//! then exported as a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;

use fibril_core::element::Element;
use fibril_core::props::{Handler, Props};
use fibril_core::trace::{
    RenderScheduledEvent, RenderSummary, SliceEvent, TraceSink, Tracer, UnitOfWorkEvent,
};
use fibril_core::work_loop::{Renderer, WorkLoopConfig, WorkStatus};

use fibril_debug::pretty::PrettyPrintSink;
use fibril_debug::recorder::RecorderSink;
use fibril_harness::MemoryHost;
use fibril_harness::deadline::FixedBudget;

/// Simulated idle period handed to every slice.
const IDLE_PERIOD: Duration = Duration::from_millis(5);
/// Simulated cost of one unit of work.
const UNIT_COST: Duration = Duration::from_micros(700);

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_render_scheduled(&mut self, e: &RenderScheduledEvent) {
        self.a.on_render_scheduled(e);
        self.b.on_render_scheduled(e);
    }

    fn on_slice(&mut self, e: &SliceEvent) {
        self.a.on_slice(e);
        self.b.on_slice(e);
    }

    fn on_unit_of_work(&mut self, e: &UnitOfWorkEvent) {
        self.a.on_unit_of_work(e);
        self.b.on_unit_of_work(e);
    }

    fn on_render_summary(&mut self, s: &RenderSummary) {
        self.a.on_render_summary(s);
        self.b.on_render_summary(s);
    }
}

fn todo_app(items: &[&str], done: usize) -> Element {
    let rows = items.iter().enumerate().map(|(i, item)| {
        let class = if i < done { "done" } else { "open" };
        Element::new(
            "li",
            Props::new()
                .with("class", class)
                .on("click", Handler::new(|_| {})),
            [*item],
        )
    });
    Element::new(
        "section",
        Props::new().with("id", "todos"),
        [
            Element::bare("h1", [format!("{} left", items.len() - done)]),
            Element::bare("ul", rows.collect::<Vec<_>>()),
        ],
    )
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    // -- host and renderer -------------------------------------------------
    let mut host = MemoryHost::new();
    let container = host.create_container("app");
    let mut renderer = Renderer::new(WorkLoopConfig::idle_callback());

    let updates: [(&[&str], usize); 4] = [
        (&["milk", "eggs", "flour"], 0),
        (&["milk", "eggs", "flour", "sugar"], 1),
        (&["milk", "eggs", "flour", "sugar"], 3),
        (&["eggs", "sugar"], 1),
    ];

    for (items, done) in updates {
        renderer.render(todo_app(items, done), container);

        // -- simulated idle callbacks --------------------------------------
        loop {
            let deadline = FixedBudget::new(IDLE_PERIOD, UNIT_COST);
            let mut tee = Tee {
                a: &mut pretty,
                b: &mut recorder,
            };
            let status = renderer
                .work_loop_traced(&mut host, &deadline, &mut Tracer::new(&mut tee))
                .expect("todo elements are well formed");
            if let WorkStatus::Committed(summary) = status {
                println!(
                    "  committed: {} placed, {} updated, {} removed",
                    summary.placed.len(),
                    summary.updated.len(),
                    summary.removed.len(),
                );
                break;
            }
        }
        println!("  host: {}", host.dump(container));
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    fibril_debug::chrome::export(
        recorder.as_bytes(),
        UNIT_COST.as_secs_f64() * 1e6,
        &mut writer,
    )
    .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} renders)", updates.len());
}
