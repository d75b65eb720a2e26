// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber tree, reconciler, cooperative work loop and commit engine for
//! incremental UI trees.
//!
//! `fibril_core` turns declarative [`Element`](element::Element) trees into
//! the minimal set of mutations on a persistent host tree. It is `no_std`
//! compatible (with `alloc`) and keeps fibers in struct-of-arrays storage
//! addressed by generational index handles.
//!
//! # Architecture
//!
//! A render is computed incrementally and applied atomically:
//!
//! ```text
//!   Element tree
//!       │
//!       ▼
//!   Renderer::render() ──► synthetic root fiber (alternate = current root)
//!                                │
//!                 ┌──────────────┘
//!                 ▼
//!   Renderer::work_loop(host, deadline)        (repeated, one fiber per unit)
//!       perform unit ──► reconcile children ──► effect tags + dirty marks
//!                 │
//!                 ▼  traversal complete
//!   commit: deletions ──► placements / prop updates ──► promote to current
//! ```
//!
//! **[`element`]**: Immutable element descriptions with automatic text
//! wrapping.
//!
//! **[`props`]**: Property bags and the ordered property diff.
//!
//! **[`fiber`]**: Struct-of-arrays fiber tree with generational handles,
//! shared by the current and work-in-progress trees.
//!
//! **[`effect`]**: Effect tags and multi-channel dirty tracking via
//! `understory_dirty`. PLACEMENT and PROPS are local; SUBTREE propagates to
//! ancestors so the commit can skip clean subtrees.
//!
//! **[`work_loop`]**: The [`Renderer`](work_loop::Renderer) session and its
//! cooperative, deadline-driven loop.
//!
//! **[`commit`]**: The uninterruptible commit pass and its
//! [`CommitSummary`](commit::CommitSummary).
//!
//! **[`host`]**: The [`HostAdapter`](host::HostAdapter) and
//! [`IdleDeadline`](host::IdleDeadline) traits that backends implement.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! work-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-fiber
//!   unit-of-work events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod commit;
pub mod effect;
pub mod element;
pub mod error;
pub mod fiber;
pub mod host;
pub mod props;
mod reconcile;
pub mod trace;
pub mod work_loop;

#[cfg(test)]
mod test_host;
