// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory host tree.
//!
//! [`MemoryHost`] implements [`HostAdapter`] over a flat arena of nodes and
//! keeps a log of every call it receives. It checks the host contract as it
//! goes: attaching a node that already has a parent, removing a node from a
//! parent it is not in, or touching a released node all panic.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::fmt::{self, Write as _};

use fibril_core::element::{Kind, NODE_VALUE};
use fibril_core::host::HostAdapter;
use fibril_core::props::{Handler, PropValue};

/// Handle to a node of a [`MemoryHost`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// One recorded host call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    /// `create_node`.
    Create {
        /// The new node.
        node: NodeId,
        /// Its kind, as displayed by [`Kind`].
        kind: String,
    },
    /// `set_property`.
    SetProperty {
        /// Target node.
        node: NodeId,
        /// Property name.
        name: String,
    },
    /// `clear_property`.
    ClearProperty {
        /// Target node.
        node: NodeId,
        /// Property name.
        name: String,
    },
    /// `add_event_listener`.
    AddListener {
        /// Target node.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// `remove_event_listener`.
    RemoveListener {
        /// Target node.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// `append_child`.
    AppendChild {
        /// Parent node.
        parent: NodeId,
        /// Appended node.
        child: NodeId,
    },
    /// `remove_child`.
    RemoveChild {
        /// Parent node.
        parent: NodeId,
        /// Removed node.
        child: NodeId,
    },
    /// `insert_before`.
    InsertBefore {
        /// Parent node.
        parent: NodeId,
        /// Inserted node.
        child: NodeId,
        /// Reference sibling.
        before: NodeId,
    },
    /// `release_node`.
    Release {
        /// Released node.
        node: NodeId,
    },
}

impl HostOp {
    /// Returns `true` for calls that change the shape of the tree.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AppendChild { .. } | Self::RemoveChild { .. } | Self::InsertBefore { .. }
        )
    }

    /// Returns `true` for property and listener calls.
    #[must_use]
    pub fn is_property(&self) -> bool {
        matches!(
            self,
            Self::SetProperty { .. }
                | Self::ClearProperty { .. }
                | Self::AddListener { .. }
                | Self::RemoveListener { .. }
        )
    }
}

#[derive(Debug)]
struct NodeData {
    /// `None` for containers.
    kind: Option<Kind>,
    label: String,
    properties: BTreeMap<String, PropValue>,
    listeners: Vec<(String, Handler)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    released: bool,
}

/// In-memory [`HostAdapter`] with an operation log.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<NodeData>,
    log: Vec<HostOp>,
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container node to render into. Not logged.
    pub fn create_container(&mut self, label: &str) -> NodeId {
        self.alloc(None, label.to_string())
    }

    fn alloc(&mut self, kind: Option<Kind>, label: String) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData {
            kind,
            label,
            properties: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
            released: false,
        });
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        let data = &self.nodes[id.0 as usize];
        assert!(!data.released, "{id:?} used after release");
        data
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        let data = &mut self.nodes[id.0 as usize];
        assert!(!data.released, "{id:?} used after release");
        data
    }

    // -- Queries --

    /// Children of a node, in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Parent of a node, if attached.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Kind label of a node (`#text` for text nodes, the label for
    /// containers).
    #[must_use]
    pub fn label(&self, id: NodeId) -> &str {
        &self.node(id).label
    }

    /// Kind of a node, `None` for containers.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&Kind> {
        self.node(id).kind.as_ref()
    }

    /// Current value of a property.
    #[must_use]
    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.node(id).properties.get(name)
    }

    /// Content of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.property(id, NODE_VALUE).and_then(PropValue::as_str)
    }

    /// Number of listeners installed for `event`.
    #[must_use]
    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.node(id)
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .count()
    }

    /// Invokes every listener for `event` on `id`. Returns how many ran.
    pub fn dispatch(&self, id: NodeId, event: &str, payload: &dyn Any) -> usize {
        let handlers: Vec<Handler> = self
            .node(id)
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, h)| h.clone())
            .collect();
        for h in &handlers {
            h.call(payload);
        }
        handlers.len()
    }

    /// Returns `true` once the node has been released.
    #[must_use]
    pub fn is_released(&self, id: NodeId) -> bool {
        self.nodes[id.0 as usize].released
    }

    /// Number of nodes ever created, containers included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every host call received so far.
    #[must_use]
    pub fn log(&self) -> &[HostOp] {
        &self.log
    }

    /// Returns and clears the log.
    pub fn take_log(&mut self) -> Vec<HostOp> {
        core::mem::take(&mut self.log)
    }

    /// Serializes the subtree below `id` (excluding `id` itself).
    ///
    /// Elements print as `<tag name=value>…</tag>`, text as `"content"`.
    #[must_use]
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(&mut out, *child);
        }
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        let data = self.node(id);
        if matches!(data.kind, Some(Kind::Text)) {
            let _ = write!(out, "{:?}", self.text(id).unwrap_or_default());
            return;
        }
        let _ = write!(out, "<{}", data.label);
        for (name, value) in &data.properties {
            let _ = match value {
                PropValue::Str(s) => write!(out, " {name}={s:?}"),
                PropValue::Number(n) => write!(out, " {name}={n}"),
                PropValue::Bool(b) => write!(out, " {name}={b}"),
                PropValue::Handler(_) => write!(out, " {name}=fn"),
            };
        }
        for (event, _) in &data.listeners {
            let _ = write!(out, " @{event}");
        }
        out.push('>');
        for child in &data.children {
            self.write_node(out, *child);
        }
        let _ = write!(out, "</{}>", data.label);
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let list = &mut self.node_mut(parent).children;
        let Some(at) = list.iter().position(|c| *c == child) else {
            panic!("{child:?} is not a child of {parent:?}");
        };
        list.remove(at);
        self.node_mut(child).parent = None;
    }

    fn attach_check(&self, parent: NodeId, child: NodeId) {
        assert!(
            self.node(child).parent.is_none(),
            "{child:?} is already attached"
        );
        assert!(
            !self.is_ancestor(child, parent),
            "{child:?} would become its own ancestor"
        );
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cur = Some(of);
        while let Some(n) = cur {
            if n == candidate {
                return true;
            }
            cur = self.nodes[n.0 as usize].parent;
        }
        false
    }
}

impl HostAdapter for MemoryHost {
    type Node = NodeId;

    fn create_node(&mut self, kind: &Kind) -> NodeId {
        let id = self.alloc(Some(kind.clone()), kind.to_string());
        self.log.push(HostOp::Create {
            node: id,
            kind: kind.to_string(),
        });
        id
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: &PropValue) {
        self.node_mut(*node)
            .properties
            .insert(name.to_string(), value.clone());
        self.log.push(HostOp::SetProperty {
            node: *node,
            name: name.to_string(),
        });
    }

    fn clear_property(&mut self, node: &NodeId, name: &str) {
        self.node_mut(*node).properties.remove(name);
        self.log.push(HostOp::ClearProperty {
            node: *node,
            name: name.to_string(),
        });
    }

    fn add_event_listener(&mut self, node: &NodeId, event: &str, handler: &Handler) {
        self.node_mut(*node)
            .listeners
            .push((event.to_string(), handler.clone()));
        self.log.push(HostOp::AddListener {
            node: *node,
            event: event.to_string(),
        });
    }

    fn remove_event_listener(&mut self, node: &NodeId, event: &str, handler: &Handler) {
        let listeners = &mut self.node_mut(*node).listeners;
        let Some(at) = listeners
            .iter()
            .position(|(e, h)| e == event && h == handler)
        else {
            panic!("no `{event}` listener with that handler on {node:?}");
        };
        listeners.remove(at);
        self.log.push(HostOp::RemoveListener {
            node: *node,
            event: event.to_string(),
        });
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach_check(*parent, *child);
        self.node_mut(*parent).children.push(*child);
        self.node_mut(*child).parent = Some(*parent);
        self.log.push(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(*parent, *child);
        self.log.push(HostOp::RemoveChild {
            parent: *parent,
            child: *child,
        });
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, before: &NodeId) {
        self.attach_check(*parent, *child);
        let list = &mut self.node_mut(*parent).children;
        let Some(at) = list.iter().position(|c| c == before) else {
            panic!("{before:?} is not a child of {parent:?}");
        };
        list.insert(at, *child);
        self.node_mut(*child).parent = Some(*parent);
        self.log.push(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            before: *before,
        });
    }

    fn release_node(&mut self, node: NodeId) {
        // Descendants of a removed subtree stay attached to released parents.
        let parent = self.node(node).parent;
        assert!(
            parent.is_none_or(|p| self.nodes[p.0 as usize].released),
            "{node:?} released while attached to a live node"
        );
        let data = self.node_mut(node);
        data.released = true;
        data.listeners.clear();
        self.log.push(HostOp::Release { node });
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;

    #[test]
    fn builds_and_dumps_a_tree() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let div = host.create_node(&Kind::host("div"));
        let text = host.create_node(&Kind::Text);
        host.set_property(&div, "title", &PropValue::from("x"));
        host.set_property(&text, NODE_VALUE, &PropValue::from("hi"));
        host.append_child(&root, &div);
        host.append_child(&div, &text);

        assert_eq!(host.dump(root), r#"<div title="x">"hi"</div>"#);
        assert_eq!(host.text(text), Some("hi"));
        assert_eq!(host.parent(text), Some(div));
        assert_eq!(host.log().len(), 6);
    }

    #[test]
    fn insert_before_and_remove() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let a = host.create_node(&Kind::host("a"));
        let b = host.create_node(&Kind::host("b"));
        host.append_child(&root, &b);
        host.insert_before(&root, &a, &b);
        assert_eq!(host.children(root), &[a, b]);
        host.remove_child(&root, &a);
        assert_eq!(host.children(root), &[b]);
        assert_eq!(host.parent(a), None);
    }

    #[test]
    fn listeners_dispatch_and_remove_by_identity() {
        let mut host = MemoryHost::new();
        let button = host.create_node(&Kind::host("button"));
        let hits = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&hits);
        let f = Handler::new(move |_| counter.set(counter.get() + 1));
        host.add_event_listener(&button, "click", &f);

        assert_eq!(host.dispatch(button, "click", &()), 1);
        assert_eq!(hits.get(), 1);
        host.remove_event_listener(&button, "click", &f);
        assert_eq!(host.listener_count(button, "click"), 0);
    }

    #[test]
    #[should_panic(expected = "is already attached")]
    fn double_attach_panics() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let a = host.create_node(&Kind::host("a"));
        host.append_child(&root, &a);
        host.append_child(&root, &a);
    }

    #[test]
    #[should_panic(expected = "used after release")]
    fn released_nodes_are_dead() {
        let mut host = MemoryHost::new();
        let a = host.create_node(&Kind::host("a"));
        host.release_node(a);
        let _ = host.children(a);
    }
}
