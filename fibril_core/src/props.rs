// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property bags and property reconciliation.
//!
//! [`Props`] maps property names to [`PropValue`]s. Names starting with `on`
//! are event-handler properties: `onClick` installs a listener for the
//! `click` event (see [`event_name`]).
//!
//! [`diff`] compares a previous and a next property set for one node and
//! produces the ordered [`PropOp`]s that bring the host node from one to the
//! other:
//!
//! 1. listeners that disappeared or changed are removed,
//! 2. plain properties that disappeared are cleared,
//! 3. plain properties that are new or changed are set,
//! 4. listeners that are new or changed are added.
//!
//! Comparison is per-key inequality; there is no structural diffing of
//! values. Handlers compare by identity.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::host::HostAdapter;

/// Reserved name that must never appear in a [`Props`] bag.
pub const CHILDREN: &str = "children";

/// An event callback.
///
/// The host passes its native event object as `&dyn Any`. Two handlers are
/// equal only if they share the same allocation, so re-creating a closure on
/// every render registers as a change.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&dyn Any)>);

impl Handler {
    /// Wraps a callback.
    pub fn new(f: impl Fn(&dyn Any) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback with a host event.
    pub fn call(&self, event: &dyn Any) {
        (self.0)(event);
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A single property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// A string value.
    Str(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Bool(bool),
    /// An event handler (only meaningful under an `on*` name).
    Handler(Handler),
}

impl PropValue {
    /// Returns the string value, if this is a [`PropValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the handler, if this is a [`PropValue::Handler`].
    #[must_use]
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(h) => Some(h),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Handler> for PropValue {
    fn from(h: Handler) -> Self {
        Self::Handler(h)
    }
}

/// Returns `true` if `name` follows the event-handler naming convention.
#[must_use]
pub fn is_event(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

/// Maps an event-handler property name to its event name (`onClick` → `click`).
#[must_use]
pub fn event_name(name: &str) -> String {
    name.get(2..).unwrap_or_default().to_lowercase()
}

/// A property bag, iterated in name order.
#[derive(Clone, Default, PartialEq)]
pub struct Props {
    entries: BTreeMap<String, PropValue>,
}

impl Props {
    /// Creates an empty property bag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style event handler insert: `on("click", h)` stores `onClick`.
    #[must_use]
    pub fn on(self, event: &str, handler: Handler) -> Self {
        let mut name = String::from("on");
        let mut chars = event.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
        self.with(name, handler)
    }

    /// Inserts or replaces a property, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropValue>,
    ) -> Option<PropValue> {
        self.entries.insert(name.into(), value.into())
    }

    /// Returns the value of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(name)
    }

    /// Returns `true` if the property is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// One host mutation produced by [`diff`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropOp<'a> {
    /// Remove a previously installed listener.
    RemoveListener {
        /// Event name, e.g. `click`.
        event: String,
        /// The handler that was installed.
        handler: &'a Handler,
    },
    /// Reset a property to an empty value.
    Clear {
        /// Property name.
        name: &'a str,
    },
    /// Write a property.
    Set {
        /// Property name.
        name: &'a str,
        /// New value.
        value: &'a PropValue,
    },
    /// Install a listener.
    AddListener {
        /// Event name, e.g. `click`.
        event: String,
        /// The handler to install.
        handler: &'a Handler,
    },
}

/// Computes the operations that turn `prev` into `next` on one host node.
#[must_use]
pub fn diff<'a>(prev: &'a Props, next: &'a Props) -> Vec<PropOp<'a>> {
    let mut ops = Vec::new();

    for (name, old) in prev.iter() {
        if !is_event(name) {
            continue;
        }
        let changed = next.get(name) != Some(old);
        if changed && let Some(handler) = old.as_handler() {
            ops.push(PropOp::RemoveListener {
                event: event_name(name),
                handler,
            });
        }
    }

    for (name, _) in prev.iter() {
        if is_event(name) || name == CHILDREN {
            continue;
        }
        if !next.contains(name) {
            ops.push(PropOp::Clear { name });
        }
    }

    for (name, value) in next.iter() {
        if is_event(name) || name == CHILDREN {
            continue;
        }
        if prev.get(name) != Some(value) {
            ops.push(PropOp::Set { name, value });
        }
    }

    for (name, value) in next.iter() {
        if !is_event(name) {
            continue;
        }
        if prev.get(name) != Some(value)
            && let Some(handler) = value.as_handler()
        {
            ops.push(PropOp::AddListener {
                event: event_name(name),
                handler,
            });
        }
    }

    ops
}

/// Applies `ops` to `node` and returns how many host calls were made.
pub fn apply<H: HostAdapter + ?Sized>(host: &mut H, node: &H::Node, ops: &[PropOp<'_>]) -> u32 {
    let mut count = 0;
    for op in ops {
        match op {
            PropOp::RemoveListener { event, handler } => {
                host.remove_event_listener(node, event, handler);
            }
            PropOp::Clear { name } => host.clear_property(node, name),
            PropOp::Set { name, value } => host.set_property(node, name, value),
            PropOp::AddListener { event, handler } => {
                host.add_event_listener(node, event, handler);
            }
        }
        count += 1;
    }
    count
}

/// Diffs and applies in one go. Returns the number of host calls made.
pub fn reconcile<H: HostAdapter + ?Sized>(
    host: &mut H,
    node: &H::Node,
    prev: &Props,
    next: &Props,
) -> u32 {
    if core::ptr::eq(prev, next) {
        return 0;
    }
    apply(host, node, &diff(prev, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Handler::new(|_| {})
    }

    #[test]
    fn event_naming() {
        assert!(is_event("onClick"));
        assert!(!is_event("on"));
        assert!(!is_event("title"));
        assert_eq!(event_name("onClick"), "click");
        assert_eq!(event_name("onMouseDown"), "mousedown");
    }

    #[test]
    fn on_builder_capitalizes() {
        let h = noop();
        let props = Props::new().on("click", h.clone());
        assert_eq!(props.get("onClick"), Some(&PropValue::Handler(h)));
    }

    #[test]
    fn handlers_compare_by_identity() {
        let f = noop();
        let g = noop();
        assert_eq!(f, f.clone());
        assert_ne!(f, g, "distinct closures are distinct handlers");
    }

    #[test]
    fn diff_follows_removal_then_write_order() {
        let f = noop();
        let g = noop();
        let prev = Props::new().with("onClick", f.clone()).with("title", "x");
        let next = Props::new().with("onClick", g.clone()).with("class", "y");

        let ops = diff(&prev, &next);
        assert_eq!(
            ops,
            alloc::vec![
                PropOp::RemoveListener {
                    event: "click".into(),
                    handler: &f,
                },
                PropOp::Clear { name: "title" },
                PropOp::Set {
                    name: "class",
                    value: &PropValue::Str("y".into()),
                },
                PropOp::AddListener {
                    event: "click".into(),
                    handler: &g,
                },
            ]
        );
    }

    #[test]
    fn equal_props_produce_nothing() {
        let f = noop();
        let a = Props::new().with("title", "x").with("onClick", f.clone());
        let b = Props::new().with("title", "x").with("onClick", f);
        assert!(diff(&a, &b).is_empty(), "equal props must not produce ops");
    }

    #[test]
    fn unchanged_handler_stays_installed() {
        let f = noop();
        let prev = Props::new().with("onClick", f.clone()).with("title", "x");
        let next = Props::new().with("onClick", f).with("title", "z");
        let ops = diff(&prev, &next);
        assert_eq!(ops.len(), 1, "only the title write: {ops:?}");
        assert!(matches!(ops[0], PropOp::Set { name: "title", .. }));
    }

    #[test]
    fn diff_from_empty_sets_everything() {
        let f = noop();
        let next = Props::new().with("id", "main").with("onInput", f);
        let ops = diff(&Props::new(), &next);
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], PropOp::Set { name: "id", .. }));
        assert!(matches!(ops[1], PropOp::AddListener { ref event, .. } if event == "input"));
    }
}
