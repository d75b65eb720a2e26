// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional child reconciliation.
//!
//! Walks the new child elements of a work-in-progress fiber and the previous
//! chain (`alternate.child`) in lock step. At each position:
//!
//! - same kind on both sides: an UPDATE fiber reusing the old host node;
//! - a new element of a different kind (or no old fiber): a PLACEMENT fiber;
//! - an old fiber of a different kind (or no element): the old fiber is
//!   tagged DELETION in place and queued on the deletion list.
//!
//! A type change yields both a placement and a deletion. Children are not
//! keyed, so reordering same-kind children shows up as updates.

use alloc::string::String;
use alloc::vec::Vec;

use crate::effect::EffectTag;
use crate::element::{Element, Kind};
use crate::error::RenderError;
use crate::fiber::{FiberId, FiberStore, INVALID};
use crate::props::{self, PropValue};

/// Counts of what one reconciliation produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ChildDiff {
    pub(crate) placed: u32,
    pub(crate) updated: u32,
    pub(crate) deleted: u32,
}

/// Rejects elements the host could not represent.
pub(crate) fn validate(element: &Element) -> Result<(), RenderError> {
    match element.kind() {
        Kind::Host(name) if name.is_empty() => return Err(RenderError::EmptyKind),
        Kind::Text if !element.children().is_empty() => {
            return Err(RenderError::TextWithChildren);
        }
        _ => {}
    }
    for (name, value) in element.props().iter() {
        if name == props::CHILDREN {
            return Err(RenderError::ReservedChildrenProp);
        }
        if props::is_event(name) && !matches!(value, PropValue::Handler(_)) {
            return Err(RenderError::HandlerNotCallable {
                name: String::from(name),
            });
        }
    }
    Ok(())
}

/// Builds the child chain of `wip` from `elements`.
///
/// Every element is validated before any fiber is created, so a malformed
/// child leaves the store untouched.
pub(crate) fn reconcile_children<N: Clone>(
    fibers: &mut FiberStore<N>,
    wip: u32,
    elements: &[Element],
    deletions: &mut Vec<FiberId>,
) -> Result<ChildDiff, RenderError> {
    for element in elements {
        validate(element)?;
    }

    let mut diff = ChildDiff::default();
    let alternate = fibers.alternate[wip as usize];
    let mut old = if alternate == INVALID {
        INVALID
    } else {
        fibers.child[alternate as usize]
    };
    let mut prev = INVALID;
    let mut elements = elements.iter();

    loop {
        let element = elements.next();
        if element.is_none() && old == INVALID {
            break;
        }

        let same_kind = match element {
            Some(e) if old != INVALID => fibers.kind[old as usize].as_ref() == Some(e.kind()),
            _ => false,
        };

        let mut emitted = INVALID;
        if let Some(e) = element
            && same_kind
        {
            let id = fibers.create(Some(e.kind().clone()), e.shared_props(), e.shared_children());
            let (o, n) = (old as usize, id.idx as usize);
            fibers.host[n] = fibers.host[o].clone();
            fibers.alternate[n] = old;
            fibers.effect[n] = Some(EffectTag::Update);
            emitted = id.idx;
            diff.updated += 1;
        } else {
            if let Some(e) = element {
                let id =
                    fibers.create(Some(e.kind().clone()), e.shared_props(), e.shared_children());
                fibers.effect[id.idx as usize] = Some(EffectTag::Placement);
                emitted = id.idx;
                diff.placed += 1;
            }
            if old != INVALID {
                fibers.effect[old as usize] = Some(EffectTag::Deletion);
                deletions.push(fibers.id_at(old));
                diff.deleted += 1;
            }
        }

        if old != INVALID {
            old = fibers.sibling[old as usize];
        }

        if emitted != INVALID {
            fibers.link(wip, prev, emitted);
            prev = emitted;
            // Marks propagate along the edge `link` just added.
            match fibers.effect[emitted as usize] {
                Some(EffectTag::Placement) => fibers.mark_placement(emitted),
                Some(EffectTag::Update) if props_changed(fibers, emitted) => {
                    fibers.mark_props(emitted);
                }
                _ => {}
            }
        }
    }

    Ok(diff)
}

fn props_changed<N>(fibers: &FiberStore<N>, idx: u32) -> bool {
    let alternate = fibers.alternate[idx as usize];
    let next = &fibers.props[idx as usize];
    let prev = &fibers.props[alternate as usize];
    !alloc::rc::Rc::ptr_eq(prev, next) && prev != next
}
