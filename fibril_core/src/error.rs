// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render errors.

use alloc::string::String;
use core::fmt;

use crate::fiber::FiberId;

/// Errors reported by reconciliation and commit.
///
/// Malformed-element variants are raised while a unit of work reconciles the
/// children of a fiber; the work loop then discards the in-progress tree and
/// leaves the current tree and the host untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// A host element with an empty tag name.
    EmptyKind,
    /// A text element that carries child elements.
    TextWithChildren,
    /// A property bag containing the reserved `children` name.
    ReservedChildrenProp,
    /// An `on*` property whose value is not a handler.
    HandlerNotCallable {
        /// The offending property name.
        name: String,
    },
    /// A non-root fiber without a kind.
    MissingKind {
        /// The fiber.
        fiber: FiberId,
    },
    /// A non-root fiber without a parent.
    OrphanFiber {
        /// The fiber.
        fiber: FiberId,
    },
    /// No ancestor of the fiber owns a host node.
    UnresolvedHostParent {
        /// The fiber.
        fiber: FiberId,
    },
    /// Commit was requested while the traversal still had work left.
    CommitBeforeComplete,
    /// Commit was requested with no work-in-progress tree.
    NothingToCommit,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKind => f.write_str("element has an empty kind"),
            Self::TextWithChildren => f.write_str("text element cannot have children"),
            Self::ReservedChildrenProp => {
                f.write_str("`children` is reserved and cannot be passed as a property")
            }
            Self::HandlerNotCallable { name } => {
                write!(f, "event property `{name}` is not a handler")
            }
            Self::MissingKind { fiber } => write!(f, "{fiber:?} has no kind"),
            Self::OrphanFiber { fiber } => write!(f, "{fiber:?} has no parent"),
            Self::UnresolvedHostParent { fiber } => {
                write!(f, "no ancestor of {fiber:?} owns a host node")
            }
            Self::CommitBeforeComplete => {
                f.write_str("cannot commit before the traversal is complete")
            }
            Self::NothingToCommit => f.write_str("no work-in-progress tree to commit"),
        }
    }
}

impl core::error::Error for RenderError {}
