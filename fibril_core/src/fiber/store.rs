// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays fiber storage with allocation, topology, and effect bookkeeping.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use understory_dirty::{Channel, CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{FiberId, INVALID};
use super::traverse::{Children, Subtree};
use crate::effect::{self, EffectTag};
use crate::element::{Element, Kind};
use crate::props::Props;

/// Struct-of-arrays storage for the fibers of every live tree.
///
/// Fibers are addressed by [`FiberId`] handles. The current tree and the
/// work-in-progress tree share one store; a retired tree's slots are recycled
/// via a free list and generation counters make its old handles stale.
///
/// `N` is the host node type of the adapter the fibers are rendered into.
pub struct FiberStore<N> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) child: Vec<u32>,
    pub(crate) sibling: Vec<u32>,
    pub(crate) alternate: Vec<u32>,

    // -- Element data (copied from the producing element) --
    pub(crate) kind: Vec<Option<Kind>>,
    pub(crate) props: Vec<Rc<Props>>,
    pub(crate) pending_children: Vec<Rc<[Element]>>,

    // -- Host binding and effects --
    pub(crate) host: Vec<Option<N>>,
    pub(crate) effect: Vec<Option<EffectTag>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    empty_props: Rc<Props>,
    empty_children: Rc<[Element]>,
}

impl<N> Default for FiberStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for FiberStore<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiberStore")
            .field("live", &self.live_count())
            .field("slots", &self.len)
            .finish_non_exhaustive()
    }
}

impl<N> FiberStore<N> {
    /// Creates an empty fiber store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            child: Vec::new(),
            sibling: Vec::new(),
            alternate: Vec::new(),
            kind: Vec::new(),
            props: Vec::new(),
            pending_children: Vec::new(),
            host: Vec::new(),
            effect: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            empty_props: Rc::new(Props::new()),
            empty_children: Vec::new().into(),
        }
    }

    // -- Allocation API --

    /// Creates a detached fiber with no host node and no effect.
    ///
    /// `kind` is `None` only for a synthetic root.
    pub(crate) fn create(
        &mut self,
        kind: Option<Kind>,
        props: Rc<Props>,
        children: Rc<[Element]>,
    ) -> FiberId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped on destroy.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.child[i] = INVALID;
            self.sibling[i] = INVALID;
            self.alternate[i] = INVALID;
            self.kind[i] = kind;
            self.props[i] = props;
            self.pending_children[i] = children;
            self.host[i] = None;
            self.effect[i] = None;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.child.push(INVALID);
            self.sibling.push(INVALID);
            self.alternate.push(INVALID);
            self.kind.push(kind);
            self.props.push(props);
            self.pending_children.push(children);
            self.host.push(None);
            self.effect.push(None);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Creates a synthetic root whose sole pending child is `element`.
    pub(crate) fn create_root(&mut self, element: Element, container: N) -> FiberId {
        let children: Rc<[Element]> = alloc::vec![element].into();
        let props = Rc::clone(&self.empty_props);
        let root = self.create(None, props, children);
        self.host[root.idx as usize] = Some(container);
        root
    }

    /// Frees one slot, dropping its element data and host handle.
    ///
    /// Topology of neighbouring fibers is not touched; callers free whole
    /// trees at once.
    pub(crate) fn destroy(&mut self, idx: u32) {
        let i = idx as usize;
        debug_assert!(self.alive[i], "fiber slot {idx} freed twice");

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.alive[i] = false;

        self.parent[i] = INVALID;
        self.child[i] = INVALID;
        self.sibling[i] = INVALID;
        self.alternate[i] = INVALID;
        self.kind[i] = None;
        self.props[i] = Rc::clone(&self.empty_props);
        self.pending_children[i] = Rc::clone(&self.empty_children);
        self.host[i] = None;
        self.effect[i] = None;

        self.free_list.push(idx);
    }

    /// Frees `root` and every fiber below it. Returns the number freed.
    pub(crate) fn destroy_tree(&mut self, root: u32) -> u32 {
        let doomed = self.subtree_indices(root);
        for &idx in &doomed {
            self.destroy(idx);
        }
        u32::try_from(doomed.len()).unwrap_or(u32::MAX)
    }

    /// Returns whether the given handle refers to a live fiber.
    #[must_use]
    pub fn is_alive(&self, id: FiberId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Number of live fibers across all trees.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    // -- Topology --

    /// Appends `child` to `parent`'s chain, after `prev` (or first if `prev`
    /// is [`INVALID`]).
    pub(crate) fn link(&mut self, parent: u32, prev: u32, child: u32) {
        self.parent[child as usize] = parent;
        if prev == INVALID {
            self.child[parent as usize] = child;
        } else {
            self.sibling[prev as usize] = child;
        }
        // The parent's SUBTREE mark depends on the child's.
        let _ = self.dirty.add_dependency(parent, child, effect::SUBTREE);
    }

    /// Next fiber in pre-order, staying within the subtree rooted at `root`.
    pub(crate) fn next_preorder(&self, idx: u32, root: u32) -> u32 {
        let first = self.child[idx as usize];
        if first != INVALID {
            return first;
        }
        let mut f = idx;
        while f != root && f != INVALID {
            let next = self.sibling[f as usize];
            if next != INVALID {
                return next;
            }
            f = self.parent[f as usize];
        }
        INVALID
    }

    /// Slot indices of `root` and its descendants, in pre-order.
    pub(crate) fn subtree_indices(&self, root: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut idx = root;
        while idx != INVALID {
            out.push(idx);
            idx = self.next_preorder(idx, root);
        }
        out
    }

    /// Nearest ancestor of `idx` (excluding `idx`) that owns a host node.
    pub(crate) fn host_ancestor(&self, idx: u32) -> Option<&N> {
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            if let Some(node) = &self.host[p as usize] {
                return Some(node);
            }
            p = self.parent[p as usize];
        }
        None
    }

    /// Handle for a live slot index.
    pub(crate) fn id_at(&self, idx: u32) -> FiberId {
        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Converts an index field into an optional handle.
    fn opt_id(&self, idx: u32) -> Option<FiberId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    // -- Dirty tracking --

    /// Records a placement on a linked fiber.
    pub(crate) fn mark_placement(&mut self, idx: u32) {
        self.dirty.mark(idx, effect::PLACEMENT);
        self.dirty.mark_with(idx, effect::SUBTREE, &EagerPolicy);
    }

    /// Records a props change on a linked, updated fiber.
    pub(crate) fn mark_props(&mut self, idx: u32) {
        self.dirty.mark(idx, effect::PROPS);
        self.dirty.mark_with(idx, effect::SUBTREE, &EagerPolicy);
    }

    /// Drains one channel in deterministic order.
    pub(crate) fn drain(&mut self, channel: Channel) -> Vec<u32> {
        self.dirty.drain(channel).deterministic().run().collect()
    }

    /// Drains one channel into a per-slot membership table.
    pub(crate) fn drain_mask(&mut self, channel: Channel) -> Vec<bool> {
        let mut mask = alloc::vec![false; self.len as usize];
        for idx in self.drain(channel) {
            if let Some(slot) = mask.get_mut(idx as usize) {
                *slot = true;
            }
        }
        mask
    }

    // -- Getters --

    /// Returns the fiber's kind, or `None` for a synthetic root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn kind(&self, id: FiberId) -> Option<&Kind> {
        self.validate(id);
        self.kind[id.idx as usize].as_ref()
    }

    /// Returns the fiber's props (the "next" props after reconciliation).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn props(&self, id: FiberId) -> &Props {
        self.validate(id);
        &self.props[id.idx as usize]
    }

    /// Returns the fiber's host node, if materialized.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn host(&self, id: FiberId) -> Option<&N> {
        self.validate(id);
        self.host[id.idx as usize].as_ref()
    }

    /// Returns the fiber's effect tag.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn effect(&self, id: FiberId) -> Option<EffectTag> {
        self.validate(id);
        self.effect[id.idx as usize]
    }

    /// Returns the parent of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.opt_id(self.parent[id.idx as usize])
    }

    /// Returns the first child of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn child(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.opt_id(self.child[id.idx as usize])
    }

    /// Returns the next sibling of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn sibling(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.opt_id(self.sibling[id.idx as usize])
    }

    /// Returns the same-position fiber of the previous committed tree.
    ///
    /// Only set while a work-in-progress tree is pending.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn alternate(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.opt_id(self.alternate[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn children(&self, id: FiberId) -> Children<'_, N> {
        self.validate(id);
        Children::new(self, self.child[id.idx as usize])
    }

    /// Returns a pre-order iterator over a fiber and its descendants.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn subtree(&self, id: FiberId) -> Subtree<'_, N> {
        self.validate(id);
        Subtree::new(self, id.idx)
    }

    // -- Internal helpers --

    /// Validates that a handle is not stale.
    pub(crate) fn validate(&self, id: FiberId) {
        assert!(
            self.is_alive(id),
            "stale FiberId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn leaf(store: &mut FiberStore<u32>, tag: &str) -> FiberId {
        store.create(
            Some(Kind::host(tag)),
            Rc::new(Props::new()),
            Vec::new().into(),
        )
    }

    #[test]
    fn create_and_destroy() {
        let mut store = FiberStore::<u32>::new();
        let id = leaf(&mut store, "div");
        assert!(store.is_alive(id));
        store.destroy(id.idx);
        assert!(!store.is_alive(id));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = FiberStore::<u32>::new();
        let id1 = leaf(&mut store, "div");
        store.destroy(id1.idx);
        let id2 = leaf(&mut store, "span");
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx, "slot is recycled");
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn link_builds_ordered_chain() {
        let mut store = FiberStore::<u32>::new();
        let root = store.create_root(Element::text("x"), 0);
        let a = leaf(&mut store, "a");
        let b = leaf(&mut store, "b");
        store.link(root.idx, INVALID, a.idx);
        store.link(root.idx, a.idx, b.idx);

        let kids: Vec<_> = store.children(root).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(store.parent(b), Some(root));
        assert_eq!(store.sibling(a), Some(b));
        assert_eq!(store.host(root), Some(&0));
        assert!(store.kind(root).is_none(), "synthetic root has no kind");
    }

    #[test]
    fn subtree_is_preorder_and_bounded() {
        let mut store = FiberStore::<u32>::new();
        let root = store.create_root(Element::text("x"), 0);
        let a = leaf(&mut store, "a");
        let a1 = leaf(&mut store, "a1");
        let b = leaf(&mut store, "b");
        store.link(root.idx, INVALID, a.idx);
        store.link(a.idx, INVALID, a1.idx);
        store.link(root.idx, a.idx, b.idx);

        let all: Vec<_> = store.subtree(root).collect();
        assert_eq!(all, vec![root, a, a1, b]);
        let only_a: Vec<_> = store.subtree(a).collect();
        assert_eq!(only_a, vec![a, a1], "siblings of the subtree root are excluded");
    }

    #[test]
    fn destroy_tree_frees_everything() {
        let mut store = FiberStore::<u32>::new();
        let root = store.create_root(Element::text("x"), 0);
        let a = leaf(&mut store, "a");
        let b = leaf(&mut store, "b");
        store.link(root.idx, INVALID, a.idx);
        store.link(a.idx, INVALID, b.idx);
        assert_eq!(store.destroy_tree(root.idx), 3);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.free_list.len(), 3);
    }

    #[test]
    fn subtree_mark_reaches_ancestors() {
        let mut store = FiberStore::<u32>::new();
        let root = store.create_root(Element::text("x"), 0);
        let a = leaf(&mut store, "a");
        let a1 = leaf(&mut store, "a1");
        let b = leaf(&mut store, "b");
        store.link(root.idx, INVALID, a.idx);
        store.link(a.idx, INVALID, a1.idx);
        store.link(root.idx, a.idx, b.idx);

        store.mark_props(a1.idx);
        let subtree = store.drain_mask(effect::SUBTREE);
        assert!(subtree[a1.idx as usize]);
        assert!(subtree[a.idx as usize], "parent is marked");
        assert!(subtree[root.idx as usize], "root is marked");
        assert!(!subtree[b.idx as usize], "unrelated sibling stays clean");

        let props = store.drain(effect::PROPS);
        assert_eq!(props, vec![a1.idx], "PROPS is local-only");
    }

    #[test]
    fn host_ancestor_skips_hostless_fibers() {
        let mut store = FiberStore::<u32>::new();
        let root = store.create_root(Element::text("x"), 7);
        let a = leaf(&mut store, "a");
        let b = leaf(&mut store, "b");
        store.link(root.idx, INVALID, a.idx);
        store.link(a.idx, INVALID, b.idx);
        assert_eq!(store.host_ancestor(b.idx), Some(&7));
        store.host[a.idx as usize] = Some(9);
        assert_eq!(store.host_ancestor(b.idx), Some(&9));
    }

    #[test]
    #[should_panic(expected = "stale FiberId")]
    fn destroyed_handle_panics_on_props() {
        let mut store = FiberStore::<u32>::new();
        let id = leaf(&mut store, "div");
        store.destroy(id.idx);
        let _ = store.props(id);
    }

    #[test]
    #[should_panic(expected = "stale FiberId")]
    fn destroyed_handle_panics_on_children() {
        let mut store = FiberStore::<u32>::new();
        let id = leaf(&mut store, "div");
        store.destroy(id.idx);
        let _ = store.children(id);
    }
}
