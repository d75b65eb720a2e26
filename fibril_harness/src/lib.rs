// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host tree, scripted idle deadlines and end-to-end scenarios.
//!
//! [`MemoryHost`] is a [`HostAdapter`](fibril_core::host::HostAdapter) over a
//! plain arena with an operation log; [`deadline`] has idle deadlines with
//! scripted behaviour. [`run_to_commit`] drives a renderer slice by slice
//! until its pending render commits.

#![no_std]

extern crate alloc;

pub mod deadline;
mod memory;

use alloc::string::String;
use core::fmt::Write as _;

use fibril_core::commit::CommitSummary;
use fibril_core::error::RenderError;
use fibril_core::fiber::{FiberId, FiberStore};
use fibril_core::host::IdleDeadline;
use fibril_core::work_loop::{Renderer, WorkStatus};

pub use memory::{HostOp, MemoryHost, NodeId};

/// Outcome of [`run_to_commit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Drive {
    /// What the commit did.
    pub summary: CommitSummary,
    /// Slices it took, including the committing one.
    pub slices: u32,
    /// Host log length after each yielded slice.
    pub log_after_yield: alloc::vec::Vec<usize>,
}

/// Runs slices until the pending render commits.
///
/// Returns `Ok(None)` if nothing was scheduled.
///
/// # Errors
///
/// Propagates the first [`RenderError`].
pub fn run_to_commit(
    renderer: &mut Renderer<NodeId>,
    host: &mut MemoryHost,
    deadline: &dyn IdleDeadline,
) -> Result<Option<Drive>, RenderError> {
    let mut slices = 0;
    let mut log_after_yield = alloc::vec::Vec::new();
    loop {
        slices += 1;
        match renderer.work_loop(host, deadline)? {
            WorkStatus::Idle => return Ok(None),
            WorkStatus::Pending => log_after_yield.push(host.log().len()),
            WorkStatus::Committed(summary) => {
                return Ok(Some(Drive {
                    summary,
                    slices,
                    log_after_yield,
                }));
            }
        }
    }
}

/// Indented outline of a fiber subtree: one line per fiber with its kind
/// and effect tag.
#[must_use]
pub fn fiber_outline<N>(fibers: &FiberStore<N>, root: FiberId) -> String {
    let mut out = String::new();
    for id in fibers.subtree(root) {
        let mut depth = 0;
        let mut p = fibers.parent(id);
        while let Some(parent) = p {
            depth += 1;
            p = fibers.parent(parent);
        }
        let kind = fibers
            .kind(id)
            .map_or_else(|| String::from("(root)"), alloc::string::ToString::to_string);
        let _ = writeln!(out, "{:indent$}{kind} {:?}", "", fibers.effect(id), indent = depth * 2);
    }
    out
}
