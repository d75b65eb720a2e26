// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber tree data model.
//!
//! A *fiber* is the unit of work of a render and the record of the effects it
//! produced. Each fiber has:
//!
//! - An identity ([`FiberId`]): a generational handle that becomes stale when
//!   the tree it belongs to is retired.
//! - Topology: `parent`, first `child` and next `sibling` links forming an
//!   ordered tree that mirrors the elements that produced it.
//! - An `alternate` link to the same-position fiber of the previous committed
//!   tree, set only while a work-in-progress tree is pending.
//! - Element data (kind and props) copied from its element, at most one host
//!   node, and at most one [`EffectTag`](crate::effect::EffectTag).
//!
//! The current and work-in-progress trees live side by side in one
//! struct-of-arrays [`FiberStore`].
//!
//! # Dirty tracking
//!
//! Reconciliation marks the channels in [`effect`](crate::effect):
//!
//! - **PLACEMENT** / **PROPS**: local-only; the fiber needing the host
//!   mutation.
//! - **SUBTREE**: propagates to every ancestor so the commit walk can skip
//!   clean subtrees.

mod id;
mod store;
mod traverse;

pub use id::{FiberId, INVALID};
pub use store::FiberStore;
pub use traverse::{Children, Subtree};
