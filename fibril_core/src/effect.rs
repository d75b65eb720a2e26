// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect tags and dirty-tracking channel constants.
//!
//! Every fiber of a work-in-progress tree carries at most one [`EffectTag`].
//! Alongside the tags, reconciliation records effects in multi-channel dirty
//! tracking (via [`understory_dirty`]) so that the commit can find them
//! without visiting the whole tree.
//!
//! # Propagation semantics
//!
//! - **Local**: [`PLACEMENT`] and [`PROPS`] are marked with the default
//!   policy. Only the fiber that needs the host mutation appears in the
//!   drain output.
//!
//! - **Propagating**: [`SUBTREE`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) with dependency edges from
//!   parent to child. Marking a fiber marks every ancestor up to the root, so
//!   the commit walk can skip any subtree whose root is not marked.
//!
//! Deletions are not tracked here: they live on the old tree and are listed
//! explicitly in the renderer's deletion list.

use understory_dirty::Channel;

/// Effect recorded on a fiber during reconciliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// The fiber's host node is new and must be inserted.
    Placement,
    /// The fiber reuses its alternate's host node; props may need updating.
    Update,
    /// The fiber belongs to the current tree and has no replacement.
    Deletion,
}

/// A fiber needs its host node inserted.
pub const PLACEMENT: Channel = Channel::new(0);

/// An updated fiber whose props differ from its alternate's.
pub const PROPS: Channel = Channel::new(1);

/// The fiber or one of its descendants carries an effect.
pub const SUBTREE: Channel = Channel::new(2);
