// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atomic commit of a finished work-in-progress tree.
//!
//! The commit runs in one uninterrupted pass:
//!
//! 1. host nodes of discarded work are released;
//! 2. every fiber on the deletion list has its host node (or, for a fiber
//!    without one, its nearest host-bearing descendants) removed from the
//!    nearest ancestor host node, and every host node of the deleted subtree
//!    is released;
//! 3. a pre-order walk over the new tree applies placements and property
//!    updates, skipping subtrees that carry no effect;
//! 4. the previous tree is freed and the new one becomes current.

use alloc::vec::Vec;

use crate::effect::{self, EffectTag};
use crate::error::RenderError;
use crate::fiber::{FiberId, INVALID};
use crate::host::HostAdapter;
use crate::props;
use crate::trace::{RenderSummary, Tracer};
use crate::work_loop::{RenderStats, Renderer};

/// What a commit did to the host tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Fibers whose host node was inserted.
    pub placed: Vec<FiberId>,
    /// Updated fibers whose props changed.
    pub updated: Vec<FiberId>,
    /// Deleted fibers that removed at least one host node.
    ///
    /// These belong to the retired tree and are stale once the commit
    /// returns.
    pub removed: Vec<FiberId>,
    /// Property operations issued by the commit.
    pub property_ops: u32,
}

impl CommitSummary {
    /// Returns `true` if the commit did not touch the host tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

impl<N: Clone> Renderer<N> {
    /// Commits the finished work-in-progress tree.
    ///
    /// # Errors
    ///
    /// - [`RenderError::NothingToCommit`] if no render is pending.
    /// - [`RenderError::CommitBeforeComplete`] if the traversal has not
    ///   finished.
    /// - [`RenderError::OrphanFiber`] / [`RenderError::UnresolvedHostParent`]
    ///   if a fiber cannot be attached to the host tree.
    pub fn commit_root<H>(&mut self, host: &mut H) -> Result<CommitSummary, RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        self.commit_root_traced(host, &mut Tracer::none())
    }

    /// Like [`commit_root`](Self::commit_root), emitting a [`RenderSummary`].
    ///
    /// # Errors
    ///
    /// See [`commit_root`](Self::commit_root).
    pub fn commit_root_traced<H>(
        &mut self,
        host: &mut H,
        tracer: &mut Tracer<'_>,
    ) -> Result<CommitSummary, RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        if self.wip_root == INVALID {
            return Err(RenderError::NothingToCommit);
        }
        if self.next_unit_of_work != INVALID {
            return Err(RenderError::CommitBeforeComplete);
        }

        self.release_pending(host);

        let mut summary = CommitSummary::default();

        let deletions = core::mem::take(&mut self.deletions);
        for id in &deletions {
            self.commit_deletion(host, *id, &mut summary)?;
        }

        self.commit_work(host, &mut summary)?;

        // -- Finalization --
        let new_root = self.wip_root;
        for idx in self.fibers.subtree_indices(new_root) {
            self.fibers.alternate[idx as usize] = INVALID;
            self.fibers.effect[idx as usize] = None;
        }
        if self.current_root != INVALID {
            self.fibers.destroy_tree(self.current_root);
        }
        self.current_root = new_root;
        self.wip_root = INVALID;
        self.next_unit_of_work = INVALID;

        let stats = core::mem::take(&mut self.stats);
        tracer.render_summary(&self.render_summary(stats, &summary));

        Ok(summary)
    }

    /// Removes one deleted fiber's host nodes and releases its subtree's.
    fn commit_deletion<H>(
        &mut self,
        host: &mut H,
        id: FiberId,
        summary: &mut CommitSummary,
    ) -> Result<(), RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        self.fibers.validate(id);
        let idx = id.idx;

        let targets = self.host_roots(idx);
        if targets.is_empty() {
            return Ok(());
        }

        if self.fibers.parent[idx as usize] == INVALID {
            return Err(RenderError::OrphanFiber { fiber: id });
        }
        let Some(parent) = self.fibers.host_ancestor(idx).cloned() else {
            return Err(RenderError::UnresolvedHostParent { fiber: id });
        };

        for node in &targets {
            host.remove_child(&parent, node);
        }
        for i in self.fibers.subtree_indices(idx) {
            if let Some(node) = self.fibers.host[i as usize].take() {
                host.release_node(node);
            }
        }
        summary.removed.push(id);
        Ok(())
    }

    /// Host nodes that represent `idx` in its parent: its own, or those of
    /// its nearest host-bearing descendants.
    fn host_roots(&self, idx: u32) -> Vec<N> {
        if let Some(node) = &self.fibers.host[idx as usize] {
            return alloc::vec![node.clone()];
        }
        let mut out = Vec::new();
        let mut stack = Vec::new();
        let first = self.fibers.child[idx as usize];
        if first != INVALID {
            stack.push(first);
        }
        while let Some(i) = stack.pop() {
            let sibling = self.fibers.sibling[i as usize];
            if sibling != INVALID {
                stack.push(sibling);
            }
            if let Some(node) = &self.fibers.host[i as usize] {
                out.push(node.clone());
            } else {
                let child = self.fibers.child[i as usize];
                if child != INVALID {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Applies placements and updates of the new tree.
    fn commit_work<H>(&mut self, host: &mut H, summary: &mut CommitSummary) -> Result<(), RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        let _ = self.fibers.drain(effect::PLACEMENT);
        let props_changed = self.fibers.drain_mask(effect::PROPS);
        let has_effects = self.fibers.drain_mask(effect::SUBTREE);
        let marked = |idx: u32, mask: &[bool]| mask.get(idx as usize).copied().unwrap_or(false);

        let mut stack = Vec::new();
        let first = self.fibers.child[self.wip_root as usize];
        if first != INVALID {
            stack.push(first);
        }

        while let Some(idx) = stack.pop() {
            // Sibling first so the child pops next (pre-order).
            let sibling = self.fibers.sibling[idx as usize];
            if sibling != INVALID {
                stack.push(sibling);
            }
            if !marked(idx, &has_effects) {
                continue;
            }

            match self.fibers.effect[idx as usize] {
                Some(EffectTag::Placement) => {
                    self.commit_placement(host, idx)?;
                    summary.placed.push(self.fibers.id_at(idx));
                }
                Some(EffectTag::Update) if marked(idx, &props_changed) => {
                    let i = idx as usize;
                    let alternate = self.fibers.alternate[i];
                    if let Some(node) = &self.fibers.host[i]
                        && alternate != INVALID
                    {
                        summary.property_ops += props::reconcile(
                            host,
                            node,
                            &self.fibers.props[alternate as usize],
                            &self.fibers.props[i],
                        );
                        summary.updated.push(self.fibers.id_at(idx));
                    }
                }
                _ => {}
            }

            let child = self.fibers.child[idx as usize];
            if child != INVALID {
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Inserts a placed fiber's host node before the next present sibling,
    /// or appends it.
    fn commit_placement<H>(&self, host: &mut H, idx: u32) -> Result<(), RenderError>
    where
        H: HostAdapter<Node = N> + ?Sized,
    {
        let id = self.fibers.id_at(idx);
        if self.fibers.parent[idx as usize] == INVALID {
            return Err(RenderError::OrphanFiber { fiber: id });
        }
        let Some(node) = &self.fibers.host[idx as usize] else {
            return Err(RenderError::CommitBeforeComplete);
        };
        let Some(parent) = self.fibers.host_ancestor(idx) else {
            return Err(RenderError::UnresolvedHostParent { fiber: id });
        };

        let mut s = self.fibers.sibling[idx as usize];
        while s != INVALID {
            if self.fibers.effect[s as usize] == Some(EffectTag::Update)
                && let Some(before) = &self.fibers.host[s as usize]
            {
                host.insert_before(parent, node, before);
                return Ok(());
            }
            s = self.fibers.sibling[s as usize];
        }
        host.append_child(parent, node);
        Ok(())
    }

    fn render_summary(&self, stats: RenderStats, summary: &CommitSummary) -> RenderSummary {
        let count = |v: &[FiberId]| u32::try_from(v.len()).unwrap_or(u32::MAX);
        RenderSummary {
            render_index: self.render_index,
            slices: stats.slices.max(1),
            units: stats.units,
            placements: count(&summary.placed),
            updates: count(&summary.updated),
            deletions: count(&summary.removed),
            property_ops: summary.property_ops,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use core::time::Duration;

    use super::*;
    use crate::element::Element;
    use crate::props::{Handler, Props};
    use crate::test_host::{Op, TestHost};
    use crate::work_loop::{WorkLoopConfig, WorkStatus};

    fn run(r: &mut Renderer<u32>, host: &mut TestHost) -> CommitSummary {
        let unlimited = || Duration::from_secs(1);
        match r.work_loop(host, &unlimited).unwrap() {
            WorkStatus::Committed(summary) => summary,
            other => panic!("expected a commit, got {other:?}"),
        }
    }

    /// Runs the traversal to completion without committing.
    fn finish_traversal(r: &mut Renderer<u32>, host: &mut TestHost) {
        while r.perform_next_unit(host).unwrap().is_some() {}
    }

    fn removals(host: &TestHost) -> Vec<(u32, u32)> {
        host.ops
            .iter()
            .filter_map(|op| match op {
                Op::Remove { parent, child } => Some((*parent, *child)),
                _ => None,
            })
            .collect()
    }

    fn row(items: &[&str]) -> Element {
        Element::bare(
            "div",
            items
                .iter()
                .map(|tag| Element::leaf(*tag, Props::new()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn commit_requires_finished_traversal() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::stepwise());
        assert_eq!(r.commit_root(&mut host), Err(RenderError::NothingToCommit));

        r.render(row(&["a"]), container);
        assert_eq!(
            r.commit_root(&mut host),
            Err(RenderError::CommitBeforeComplete)
        );
    }

    #[test]
    fn same_tree_twice_is_a_no_op() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        let f = Handler::new(|_| {});
        let tree = || {
            Element::new(
                "div",
                Props::new().with("title", "x").with("onClick", f.clone()),
                [Element::bare("p", ["hi"])],
            )
        };

        r.render(tree(), container);
        let _ = run(&mut r, &mut host);
        let ops = host.ops.len();

        r.render(tree(), container);
        let summary = run(&mut r, &mut host);
        assert!(summary.is_empty(), "no host work: {summary:?}");
        assert_eq!(summary.property_ops, 0);
        assert_eq!(host.ops.len(), ops, "no host call at all");
    }

    #[test]
    fn insertion_appends_after_existing_children() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a"]), container);
        let _ = run(&mut r, &mut host);

        r.render(row(&["a", "b"]), container);
        let summary = run(&mut r, &mut host);
        assert_eq!(summary.placed.len(), 1);
        assert!(summary.removed.is_empty());

        let div = host.children_of(container)[0];
        assert_eq!(host.kinds(&host.children_of(div)), vec!["a", "b"]);
    }

    #[test]
    fn deletion_removes_and_releases() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a", "b"]), container);
        let _ = run(&mut r, &mut host);
        let div = host.children_of(container)[0];
        let b = host.children_of(div)[1];

        r.render(row(&["a"]), container);
        let summary = run(&mut r, &mut host);
        assert_eq!(summary.removed.len(), 1);
        assert_eq!(host.kinds(&host.children_of(div)), vec!["a"]);
        assert_eq!(host.released, vec![b]);
    }

    #[test]
    fn mid_list_type_change_keeps_order() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a", "b", "c"]), container);
        let _ = run(&mut r, &mut host);
        let div = host.children_of(container)[0];

        r.render(row(&["a", "x", "c"]), container);
        let summary = run(&mut r, &mut host);
        assert_eq!(summary.placed.len(), 1);
        assert_eq!(summary.removed.len(), 1);
        assert_eq!(host.kinds(&host.children_of(div)), vec!["a", "x", "c"]);
        assert!(
            host.ops.iter().any(|op| matches!(op, Op::InsertBefore { .. })),
            "x lands before c"
        );
    }

    #[test]
    fn changed_props_are_reconciled_on_the_same_node() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(Element::leaf("div", Props::new().with("title", "x")), container);
        let _ = run(&mut r, &mut host);
        let div = host.children_of(container)[0];

        r.render(Element::leaf("div", Props::new().with("class", "y")), container);
        let summary = run(&mut r, &mut host);
        assert_eq!(summary.updated.len(), 1);
        assert_eq!(summary.property_ops, 2, "clear title, set class");
        assert_eq!(host.children_of(container), vec![div], "node is reused");
    }

    #[test]
    fn alternates_are_cleared_and_old_tree_freed() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a", "b"]), container);
        let _ = run(&mut r, &mut host);
        let first = r.fibers().live_count();

        r.render(row(&["a", "b"]), container);
        let _ = run(&mut r, &mut host);
        assert_eq!(r.fibers().live_count(), first, "exactly one tree is live");

        let root = r.current_root().unwrap();
        for id in r.fibers().subtree(root) {
            assert_eq!(r.fibers().alternate(id), None);
            assert_eq!(r.fibers().effect(id), None);
        }
    }

    #[test]
    fn hostless_deletion_removes_nearest_host_descendants() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(
            Element::bare("div", [Element::bare("section", ["a", "b"])]),
            container,
        );
        let _ = run(&mut r, &mut host);
        let div = host.children_of(container)[0];
        let section = host.children_of(div)[0];
        let texts = host.children_of(section);

        r.render(row(&[]), container);
        finish_traversal(&mut r, &mut host);
        assert_eq!(r.deletions.len(), 1);
        let deleted = r.deletions[0];
        r.fibers.host[deleted.idx as usize] = None;

        let summary = r.commit_root(&mut host).unwrap();
        assert_eq!(summary.removed, vec![deleted]);
        assert_eq!(
            removals(&host),
            texts.iter().map(|t| (div, *t)).collect::<Vec<_>>()
        );
        assert_eq!(host.released, texts);
    }

    #[test]
    fn hostless_leaf_deletion_is_a_no_op() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a", "b"]), container);
        let _ = run(&mut r, &mut host);

        r.render(row(&["a"]), container);
        finish_traversal(&mut r, &mut host);
        let deleted = r.deletions[0];
        r.fibers.host[deleted.idx as usize] = None;

        let summary = r.commit_root(&mut host).unwrap();
        assert!(summary.removed.is_empty());
        assert!(removals(&host).is_empty());
        assert!(host.released.is_empty());
        assert_eq!(r.fibers().live_count(), 3, "old tree is still freed");
    }

    #[test]
    fn deletion_without_parent_is_an_orphan() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a", "b"]), container);
        let _ = run(&mut r, &mut host);

        r.render(row(&["a"]), container);
        finish_traversal(&mut r, &mut host);
        let deleted = r.deletions[0];
        r.fibers.parent[deleted.idx as usize] = INVALID;

        assert_eq!(
            r.commit_root(&mut host),
            Err(RenderError::OrphanFiber { fiber: deleted })
        );
        assert!(removals(&host).is_empty());
    }

    #[test]
    fn deletion_without_host_ancestor_is_unresolved() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a", "b"]), container);
        let _ = run(&mut r, &mut host);

        r.render(row(&["a"]), container);
        finish_traversal(&mut r, &mut host);
        let deleted = r.deletions[0];
        let mut p = r.fibers.parent[deleted.idx as usize];
        while p != INVALID {
            r.fibers.host[p as usize] = None;
            p = r.fibers.parent[p as usize];
        }

        assert_eq!(
            r.commit_root(&mut host),
            Err(RenderError::UnresolvedHostParent { fiber: deleted })
        );
    }

    #[test]
    fn placement_without_parent_is_an_orphan() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a"]), container);
        finish_traversal(&mut r, &mut host);

        let wip = r.wip_root as usize;
        let div = r.fibers.child[wip];
        r.fibers.parent[div as usize] = INVALID;
        assert_eq!(
            r.commit_root(&mut host),
            Err(RenderError::OrphanFiber {
                fiber: r.fibers.id_at(div)
            })
        );
        assert!(!host.ops.iter().any(Op::is_attach));
    }

    #[test]
    fn placement_without_host_ancestor_is_unresolved() {
        let mut host = TestHost::default();
        let container = host.container();
        let mut r = Renderer::new(WorkLoopConfig::default());
        r.render(row(&["a"]), container);
        finish_traversal(&mut r, &mut host);

        let wip = r.wip_root;
        r.fibers.host[wip as usize] = None;
        let div = r.fibers.child[wip as usize];
        assert_eq!(
            r.commit_root(&mut host),
            Err(RenderError::UnresolvedHostParent {
                fiber: r.fibers.id_at(div)
            })
        );
    }
}
