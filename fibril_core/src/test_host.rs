// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal recording host for unit tests.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::element::Kind;
use crate::host::HostAdapter;
use crate::props::{Handler, PropValue};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Create { node: u32, kind: String },
    Set { node: u32, name: String },
    Clear { node: u32, name: String },
    Listen { node: u32, event: String },
    Unlisten { node: u32, event: String },
    Append { parent: u32, child: u32 },
    Remove { parent: u32, child: u32 },
    InsertBefore { parent: u32, child: u32, before: u32 },
}

impl Op {
    pub(crate) fn is_attach(&self) -> bool {
        matches!(self, Self::Append { .. } | Self::InsertBefore { .. })
    }
}

/// Nodes are indices; index 0 is created by [`TestHost::container`].
#[derive(Debug, Default)]
pub(crate) struct TestHost {
    kinds: Vec<String>,
    children: Vec<Vec<u32>>,
    pub(crate) ops: Vec<Op>,
    pub(crate) released: Vec<u32>,
}

impl TestHost {
    fn alloc(&mut self, kind: String) -> u32 {
        let node = u32::try_from(self.kinds.len()).expect("node count fits u32");
        self.kinds.push(kind);
        self.children.push(Vec::new());
        node
    }

    pub(crate) fn container(&mut self) -> u32 {
        self.alloc("#container".to_string())
    }

    pub(crate) fn children_of(&self, node: u32) -> Vec<u32> {
        self.children[node as usize].clone()
    }

    pub(crate) fn kinds(&self, nodes: &[u32]) -> Vec<&str> {
        nodes.iter().map(|n| self.kinds[*n as usize].as_str()).collect()
    }
}

impl HostAdapter for TestHost {
    type Node = u32;

    fn create_node(&mut self, kind: &Kind) -> u32 {
        let node = self.alloc(kind.to_string());
        self.ops.push(Op::Create {
            node,
            kind: kind.to_string(),
        });
        node
    }

    fn set_property(&mut self, node: &u32, name: &str, _value: &PropValue) {
        self.ops.push(Op::Set {
            node: *node,
            name: name.into(),
        });
    }

    fn clear_property(&mut self, node: &u32, name: &str) {
        self.ops.push(Op::Clear {
            node: *node,
            name: name.into(),
        });
    }

    fn add_event_listener(&mut self, node: &u32, event: &str, _handler: &Handler) {
        self.ops.push(Op::Listen {
            node: *node,
            event: event.into(),
        });
    }

    fn remove_event_listener(&mut self, node: &u32, event: &str, _handler: &Handler) {
        self.ops.push(Op::Unlisten {
            node: *node,
            event: event.into(),
        });
    }

    fn append_child(&mut self, parent: &u32, child: &u32) {
        self.children[*parent as usize].push(*child);
        self.ops.push(Op::Append {
            parent: *parent,
            child: *child,
        });
    }

    fn remove_child(&mut self, parent: &u32, child: &u32) {
        self.children[*parent as usize].retain(|c| c != child);
        self.ops.push(Op::Remove {
            parent: *parent,
            child: *child,
        });
    }

    fn insert_before(&mut self, parent: &u32, child: &u32, before: &u32) {
        let list = &mut self.children[*parent as usize];
        let at = list.iter().position(|c| c == before).unwrap_or(list.len());
        list.insert(at, *child);
        self.ops.push(Op::InsertBefore {
            parent: *parent,
            child: *child,
            before: *before,
        });
    }

    fn release_node(&mut self, node: u32) {
        self.released.push(node);
    }
}
