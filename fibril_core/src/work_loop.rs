// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative work-loop scheduling.
//!
//! A [`Renderer`] owns the fiber trees of one render root and everything the
//! loop needs between slices. A render is scheduled with
//! [`render`](Renderer::render) and then driven by repeated
//! [`work_loop`](Renderer::work_loop) calls, each processing fibers one at a
//! time until the [`IdleDeadline`] runs low. When the traversal completes the
//! same call commits the tree.
//!
//! Suspension only happens between whole units of work: a fiber's child
//! chain is fully built before control can return to the caller.

use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use crate::commit::CommitSummary;
use crate::effect::{self, EffectTag};
use crate::element::Element;
use crate::error::RenderError;
use crate::fiber::{FiberId, FiberStore, INVALID};
use crate::host::{HostAdapter, IdleDeadline};
use crate::props::{self, Props};
use crate::reconcile;
use crate::trace::{RenderScheduledEvent, SliceEvent, SliceOutcome, Tracer};

/// Configuration for the [`Renderer`] work loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkLoopConfig {
    /// Keep working only while the deadline reports at least this much time.
    pub yield_threshold: Duration,
    /// Upper bound on units of work per slice, if any.
    pub max_units_per_slice: Option<u32>,
}

impl WorkLoopConfig {
    /// Browser idle-callback convention: yield once less than 1 ms remains.
    #[must_use]
    pub const fn idle_callback() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            max_units_per_slice: None,
        }
    }

    /// One unit of work per slice, regardless of the deadline.
    ///
    /// Useful for exercising interruption and for step-by-step debugging.
    #[must_use]
    pub const fn stepwise() -> Self {
        Self {
            yield_threshold: Duration::ZERO,
            max_units_per_slice: Some(1),
        }
    }
}

impl Default for WorkLoopConfig {
    fn default() -> Self {
        Self::idle_callback()
    }
}

/// Result of one [`work_loop`](Renderer::work_loop) slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing is scheduled.
    Idle,
    /// The slice yielded with work left; request another idle slot.
    Pending,
    /// The traversal completed and the tree was committed.
    Committed(CommitSummary),
}

/// Per-render counters for tracing.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RenderStats {
    pub(crate) slices: u32,
    pub(crate) units: u32,
}

/// A render session: current tree, work-in-progress tree and loop state.
///
/// `N` is the host node type of the [`HostAdapter`] the renderer drives.
pub struct Renderer<N> {
    pub(crate) config: WorkLoopConfig,
    pub(crate) fibers: FiberStore<N>,

    pub(crate) next_unit_of_work: u32,
    pub(crate) wip_root: u32,
    pub(crate) current_root: u32,
    pub(crate) deletions: Vec<FiberId>,

    /// Host nodes of discarded work, released at the next opportunity.
    pub(crate) pending_release: Vec<N>,

    pub(crate) render_index: u64,
    pub(crate) stats: RenderStats,
    pub(crate) scheduled: Option<RenderScheduledEvent>,
}

impl<N> fmt::Debug for Renderer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("fibers", &self.fibers)
            .field("next_unit_of_work", &self.next_unit_of_work)
            .field("wip_root", &self.wip_root)
            .field("current_root", &self.current_root)
            .field("deletions", &self.deletions)
            .field("pending_release", &self.pending_release.len())
            .field("render_index", &self.render_index)
            .finish_non_exhaustive()
    }
}

impl<N: Clone> Default for Renderer<N> {
    fn default() -> Self {
        Self::new(WorkLoopConfig::default())
    }
}

impl<N: Clone> Renderer<N> {
    /// Creates a renderer with nothing scheduled.
    #[must_use]
    pub fn new(config: WorkLoopConfig) -> Self {
        Self {
            config,
            fibers: FiberStore::new(),
            next_unit_of_work: INVALID,
            wip_root: INVALID,
            current_root: INVALID,
            deletions: Vec::new(),
            pending_release: Vec::new(),
            render_index: 0,
            stats: RenderStats::default(),
            scheduled: None,
        }
    }

    /// Returns the work-loop configuration.
    #[must_use]
    pub fn config(&self) -> WorkLoopConfig {
        self.config
    }

    /// Renders `element` into `container`.
    ///
    /// Equivalent to [`schedule_update`](Self::schedule_update); the work
    /// happens in subsequent [`work_loop`](Self::work_loop) calls.
    pub fn render(&mut self, element: Element, container: N) {
        self.schedule_update(element, container);
    }

    /// Starts a new render of `root_element` into `container`.
    ///
    /// Any uncommitted work-in-progress tree is discarded first: its fibers
    /// are freed, DELETION tags it placed on the current tree are cleared,
    /// and host nodes created for its placements are queued for release.
    pub fn schedule_update(&mut self, root_element: Element, container: N) {
        let discarded_fibers = if self.wip_root == INVALID {
            0
        } else {
            self.discard_work_in_progress()
        };

        let root = self.fibers.create_root(root_element, container);
        self.fibers.alternate[root.idx as usize] = self.current_root;
        self.deletions.clear();
        self.wip_root = root.idx;
        self.next_unit_of_work = root.idx;

        self.render_index += 1;
        self.stats = RenderStats::default();
        self.scheduled = Some(RenderScheduledEvent {
            render_index: self.render_index,
            discarded_fibers,
        });
    }

    /// Runs one slice of work. See [`work_loop_traced`](Self::work_loop_traced).
    ///
    /// # Errors
    ///
    /// See [`work_loop_traced`](Self::work_loop_traced).
    pub fn work_loop<H>(
        &mut self,
        host: &mut H,
        deadline: &dyn IdleDeadline,
    ) -> Result<WorkStatus, RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        self.work_loop_traced(host, deadline, &mut Tracer::none())
    }

    /// Runs one slice of work, reporting to `tracer`.
    ///
    /// At least one unit of work is performed. After that, work continues
    /// while units remain, the deadline reports at least
    /// [`yield_threshold`](WorkLoopConfig::yield_threshold) and the per-slice
    /// cap is not reached. If the traversal completes, the tree is committed
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns the first [`RenderError`] raised by reconciliation or commit.
    /// A reconciliation error discards the work-in-progress tree; the current
    /// tree and the host tree are left as they were.
    pub fn work_loop_traced<H>(
        &mut self,
        host: &mut H,
        deadline: &dyn IdleDeadline,
        tracer: &mut Tracer<'_>,
    ) -> Result<WorkStatus, RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        self.release_pending(host);
        if let Some(e) = self.scheduled.take() {
            tracer.render_scheduled(&e);
        }

        if self.wip_root == INVALID {
            tracer.slice(&SliceEvent {
                render_index: self.render_index,
                units: 0,
                outcome: SliceOutcome::Idle,
            });
            return Ok(WorkStatus::Idle);
        }

        let mut units = 0_u32;
        while self.next_unit_of_work != INVALID {
            if let Err(err) = self.perform_unit_of_work(host, tracer) {
                self.stats.units += units;
                tracer.slice(&SliceEvent {
                    render_index: self.render_index,
                    units,
                    outcome: SliceOutcome::Failed,
                });
                self.discard_work_in_progress();
                return Err(err);
            }
            units += 1;

            if self
                .config
                .max_units_per_slice
                .is_some_and(|cap| units >= cap)
            {
                break;
            }
            if deadline.time_remaining() < self.config.yield_threshold {
                break;
            }
        }

        self.stats.slices += 1;
        self.stats.units += units;

        if self.next_unit_of_work != INVALID {
            tracer.slice(&SliceEvent {
                render_index: self.render_index,
                units,
                outcome: SliceOutcome::Yielded,
            });
            return Ok(WorkStatus::Pending);
        }

        tracer.slice(&SliceEvent {
            render_index: self.render_index,
            units,
            outcome: SliceOutcome::Completed,
        });
        let summary = self.commit_root_traced(host, tracer)?;
        Ok(WorkStatus::Committed(summary))
    }

    /// Performs exactly one unit of work without committing.
    ///
    /// Returns the next unit, or `None` once the traversal is complete (the
    /// tree can then be committed with [`commit_root`](Self::commit_root)).
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] for malformed elements. Unlike
    /// [`work_loop`](Self::work_loop), the work-in-progress tree is kept.
    pub fn perform_next_unit<H>(&mut self, host: &mut H) -> Result<Option<FiberId>, RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        if self.next_unit_of_work != INVALID {
            self.perform_unit_of_work(host, &mut Tracer::none())?;
            self.stats.units += 1;
        }
        Ok(self.next_unit())
    }

    /// Processes `next_unit_of_work` and advances it.
    fn perform_unit_of_work<H>(
        &mut self,
        host: &mut H,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        let idx = self.next_unit_of_work;
        let i = idx as usize;

        let materialized = self.fibers.host[i].is_none();
        if materialized {
            let Some(kind) = &self.fibers.kind[i] else {
                return Err(RenderError::MissingKind {
                    fiber: self.fibers.id_at(idx),
                });
            };
            let node = host.create_node(kind);
            props::reconcile(host, &node, &Props::new(), &self.fibers.props[i]);
            self.fibers.host[i] = Some(node);
        }

        let children = core::mem::replace(
            &mut self.fibers.pending_children[i],
            Vec::new().into(),
        );
        let diff = match reconcile::reconcile_children(
            &mut self.fibers,
            idx,
            &children,
            &mut self.deletions,
        ) {
            Ok(diff) => diff,
            Err(err) => {
                // Validation runs before any fiber is touched.
                self.fibers.pending_children[i] = children;
                return Err(err);
            }
        };

        #[cfg(feature = "trace-rich")]
        tracer.unit_of_work(&crate::trace::UnitOfWorkEvent {
            render_index: self.render_index,
            fiber_index: idx,
            materialized,
            placed: diff.placed,
            updated: diff.updated,
            deleted: diff.deleted,
        });
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = (tracer, materialized, diff);
        }

        self.next_unit_of_work = self.fibers.next_preorder(idx, self.wip_root);
        Ok(())
    }

    /// Frees the work-in-progress tree. Returns the number of fibers freed.
    fn discard_work_in_progress(&mut self) -> u32 {
        for idx in self.fibers.subtree_indices(self.wip_root) {
            let i = idx as usize;
            if self.fibers.effect[i] == Some(EffectTag::Placement)
                && let Some(node) = self.fibers.host[i].take()
            {
                self.pending_release.push(node);
            }
        }

        for id in self.deletions.drain(..) {
            if self.fibers.is_alive(id) {
                self.fibers.effect[id.idx as usize] = None;
            }
        }

        let _ = self.fibers.drain(effect::PLACEMENT);
        let _ = self.fibers.drain(effect::PROPS);
        let _ = self.fibers.drain(effect::SUBTREE);

        let freed = self.fibers.destroy_tree(self.wip_root);
        self.wip_root = INVALID;
        self.next_unit_of_work = INVALID;
        freed
    }

    /// Hands queued host nodes back to the host.
    pub(crate) fn release_pending<H>(&mut self, host: &mut H)
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        for node in self.pending_release.drain(..) {
            host.release_node(node);
        }
    }

    // -- Queries --

    /// Returns `true` when no render is in progress.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.wip_root == INVALID
    }

    /// Returns `true` while a render is scheduled but not yet committed.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.wip_root != INVALID
    }

    /// Returns `true` once the traversal of the pending render has finished.
    #[must_use]
    pub fn is_traversal_complete(&self) -> bool {
        self.wip_root != INVALID && self.next_unit_of_work == INVALID
    }

    /// The next fiber to process, if any.
    #[must_use]
    pub fn next_unit(&self) -> Option<FiberId> {
        (self.next_unit_of_work != INVALID).then(|| self.fibers.id_at(self.next_unit_of_work))
    }

    /// Root of the committed tree, if any render has committed.
    #[must_use]
    pub fn current_root(&self) -> Option<FiberId> {
        (self.current_root != INVALID).then(|| self.fibers.id_at(self.current_root))
    }

    /// Root of the pending tree, if any.
    #[must_use]
    pub fn work_in_progress_root(&self) -> Option<FiberId> {
        (self.wip_root != INVALID).then(|| self.fibers.id_at(self.wip_root))
    }

    /// Old fibers the pending render will remove.
    #[must_use]
    pub fn deletions(&self) -> &[FiberId] {
        &self.deletions
    }

    /// Monotonic counter of scheduled renders.
    #[must_use]
    pub fn render_index(&self) -> u64 {
        self.render_index
    }

    /// Read access to the fiber arena.
    #[must_use]
    pub fn fibers(&self) -> &FiberStore<N> {
        &self.fibers
    }
}
