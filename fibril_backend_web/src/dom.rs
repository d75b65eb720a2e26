// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM host adapter.
//!
//! [`DomHost`] implements [`HostAdapter`] over live DOM nodes. Properties are
//! assigned as JavaScript properties (`node[name] = value`), so `className`,
//! `value` or `nodeValue` behave as they do in script. Event handlers are
//! wrapped in [`Closure`]s owned by the host until they are removed or their
//! node is released.

use alloc::string::String;
use alloc::vec::Vec;

use fibril_core::element::Kind;
use fibril_core::host::HostAdapter;
use fibril_core::props::{Handler, PropValue};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use web_sys::{Document, Event, Node};

type ListenerClosure = Closure<dyn FnMut(Event)>;

struct Listener {
    node: Node,
    event: String,
    handler: Handler,
    closure: ListenerClosure,
}

/// [`HostAdapter`] that creates and mutates DOM nodes of one document.
pub struct DomHost {
    document: Document,
    listeners: Vec<Listener>,
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("document", &"Document")
            .field("listeners_len", &self.listeners.len())
            .finish()
    }
}

impl DomHost {
    /// Creates a host that builds nodes with `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            listeners: Vec::new(),
        }
    }

    /// Returns the document nodes are created in.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of event listeners currently installed.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn detach_listener(listener: &Listener) {
        let _ = listener.node.remove_event_listener_with_callback(
            &listener.event,
            listener.closure.as_ref().unchecked_ref(),
        );
    }
}

fn to_js(value: &PropValue) -> JsValue {
    match value {
        PropValue::Str(s) => JsValue::from_str(s),
        PropValue::Number(n) => JsValue::from_f64(*n),
        PropValue::Bool(b) => JsValue::from_bool(*b),
        // Handlers are routed to listeners; a stray one clears the slot.
        PropValue::Handler(_) => JsValue::NULL,
    }
}

impl HostAdapter for DomHost {
    type Node = Node;

    fn create_node(&mut self, kind: &Kind) -> Node {
        match kind {
            Kind::Text => self.document.create_text_node("").into(),
            Kind::Host(tag) => match self.document.create_element(tag) {
                Ok(element) => element.into(),
                // Invalid tag names keep their position as a comment.
                Err(_) => self.document.create_comment(tag).into(),
            },
        }
    }

    fn set_property(&mut self, node: &Node, name: &str, value: &PropValue) {
        let _ = js_sys::Reflect::set(node, &JsValue::from_str(name), &to_js(value));
    }

    fn clear_property(&mut self, node: &Node, name: &str) {
        let _ = js_sys::Reflect::set(node, &JsValue::from_str(name), &JsValue::from_str(""));
    }

    fn add_event_listener(&mut self, node: &Node, event: &str, handler: &Handler) {
        let callback = handler.clone();
        let closure: ListenerClosure = Closure::new(move |e: Event| callback.call(&e));
        let _ = node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        self.listeners.push(Listener {
            node: node.clone(),
            event: event.into(),
            handler: handler.clone(),
            closure,
        });
    }

    fn remove_event_listener(&mut self, node: &Node, event: &str, handler: &Handler) {
        let found = self
            .listeners
            .iter()
            .position(|l| l.node == *node && l.event == event && l.handler == *handler);
        if let Some(at) = found {
            let listener = self.listeners.swap_remove(at);
            Self::detach_listener(&listener);
        }
    }

    fn append_child(&mut self, parent: &Node, child: &Node) {
        let _ = parent.append_child(child);
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) {
        let _ = parent.remove_child(child);
    }

    fn insert_before(&mut self, parent: &Node, child: &Node, before: &Node) {
        let _ = parent.insert_before(child, Some(before));
    }

    fn release_node(&mut self, node: Node) {
        self.listeners.retain(|l| {
            if l.node == node {
                Self::detach_listener(l);
                false
            } else {
                true
            }
        });
    }
}

