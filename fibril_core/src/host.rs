// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! Fibril never touches a concrete node type. Everything it does to the
//! host tree goes through a [`HostAdapter`]; everything it needs to know
//! about time comes from an [`IdleDeadline`].
//!
//! # Crate boundaries
//!
//! `fibril_core` owns the element model, reconciliation, the work loop and
//! this contract module. Backend crates implement [`HostAdapter`] for a real
//! node tree (e.g. the DOM) and own the idle-callback registration that
//! drives [`Renderer::work_loop`](crate::work_loop::Renderer::work_loop).
//!
//! # Driving a render
//!
//! ```rust,ignore
//! renderer.render(app(), container);
//!
//! fn on_idle(deadline: &dyn IdleDeadline) {
//!     match renderer.work_loop(&mut host, deadline) {
//!         Ok(WorkStatus::Pending) => request_idle_callback(on_idle),
//!         Ok(WorkStatus::Committed(_) | WorkStatus::Idle) => {}
//!         Err(e) => report(e),
//!     }
//! }
//! ```

use core::time::Duration;

use crate::element::Kind;
use crate::props::{Handler, PropValue};

/// Creates, mutates and removes nodes of a host tree.
///
/// The host is assumed not to fail. Nodes are cloned freely (the current and
/// work-in-progress fibers of one position share a node), so `Node` is
/// expected to be a cheap handle.
pub trait HostAdapter {
    /// Handle to a host node.
    type Node: Clone;

    /// Creates a detached node of the given kind.
    fn create_node(&mut self, kind: &Kind) -> Self::Node;

    /// Writes a property.
    fn set_property(&mut self, node: &Self::Node, name: &str, value: &PropValue);

    /// Resets a property to an empty value.
    fn clear_property(&mut self, node: &Self::Node, name: &str);

    /// Installs an event listener.
    fn add_event_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

    /// Removes a previously installed event listener.
    fn remove_event_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Removes `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Inserts `child` into `parent` immediately before `before`.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, before: &Self::Node);

    /// Called once a node will never be used again.
    ///
    /// Covers nodes of deleted subtrees (after removal) and nodes that were
    /// created for a discarded work-in-progress tree.
    fn release_node(&mut self, node: Self::Node) {
        _ = node;
    }
}

/// Reports how much idle time is left in the current slice.
pub trait IdleDeadline {
    /// Remaining idle time.
    fn time_remaining(&self) -> Duration;
}

impl<F: Fn() -> Duration> IdleDeadline for F {
    fn time_remaining(&self) -> Duration {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_deadlines() {
        let fixed = || Duration::from_millis(5);
        assert_eq!(fixed.time_remaining(), Duration::from_millis(5));
        let dyn_deadline: &dyn IdleDeadline = &|| Duration::ZERO;
        assert_eq!(dyn_deadline.time_remaining(), Duration::ZERO);
    }
}
