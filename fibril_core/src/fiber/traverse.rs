// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{FiberId, INVALID};
use super::store::FiberStore;

/// An iterator over the direct children of a fiber.
///
/// Created by [`FiberStore::children`].
pub struct Children<'a, N> {
    store: &'a FiberStore<N>,
    current: u32,
}

impl<'a, N> Children<'a, N> {
    pub(crate) fn new(store: &'a FiberStore<N>, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl<N> core::fmt::Debug for Children<'_, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Children")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// A pre-order iterator over a fiber and its descendants.
///
/// Created by [`FiberStore::subtree`]. Uses the parent links to climb back
/// up, so it needs no stack.
pub struct Subtree<'a, N> {
    store: &'a FiberStore<N>,
    root: u32,
    current: u32,
}

impl<'a, N> Subtree<'a, N> {
    pub(crate) fn new(store: &'a FiberStore<N>, root: u32) -> Self {
        Self {
            store,
            root,
            current: root,
        }
    }
}

impl<N> core::fmt::Debug for Subtree<'_, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subtree")
            .field("root", &self.root)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<N> Iterator for Subtree<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_preorder(idx, self.root);
        Some(self.store.id_at(idx))
    }
}
