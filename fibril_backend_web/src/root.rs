// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A renderer bound to a DOM container.

use alloc::format;
use alloc::rc::Rc;
use core::cell::RefCell;

use fibril_core::element::Element;
use fibril_core::work_loop::{Renderer, WorkLoopConfig, WorkStatus};
use web_sys::{Document, Node};

use crate::dom::DomHost;
use crate::idle::IdleLoop;

struct Session {
    renderer: Renderer<Node>,
    host: DomHost,
}

/// Renders element trees into one DOM container during idle periods.
///
/// [`render`](Self::render) schedules the tree and requests an idle period;
/// slices run from `requestIdleCallback` until the tree is committed.
/// Rendering again before that discards the uncommitted work.
pub struct WebRoot {
    container: Node,
    session: Rc<RefCell<Session>>,
    idle: IdleLoop,
}

impl core::fmt::Debug for WebRoot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebRoot")
            .field("container", &"Node")
            .field("idle", &self.idle)
            .finish_non_exhaustive()
    }
}

impl WebRoot {
    /// Creates a root that renders into `container`.
    #[must_use]
    pub fn new(document: Document, container: Node, config: WorkLoopConfig) -> Self {
        let session = Rc::new(RefCell::new(Session {
            renderer: Renderer::new(config),
            host: DomHost::new(document),
        }));

        let slice_session = Rc::clone(&session);
        let idle = IdleLoop::new(move |deadline| {
            let mut session = slice_session.borrow_mut();
            let Session { renderer, host } = &mut *session;
            match renderer.work_loop(host, deadline) {
                Ok(WorkStatus::Pending) => true,
                Ok(WorkStatus::Idle | WorkStatus::Committed(_)) => false,
                Err(err) => {
                    web_sys::console::error_1(&format!("fibril: render failed: {err}").into());
                    false
                }
            }
        });

        Self {
            container,
            session,
            idle,
        }
    }

    /// Schedules `element` as the new content of the container.
    pub fn render(&self, element: Element) {
        self.session
            .borrow_mut()
            .renderer
            .render(element, self.container.clone());
        self.idle.request();
    }

    /// Returns the container node.
    #[must_use]
    pub fn container(&self) -> &Node {
        &self.container
    }

    /// Returns `true` while a render is waiting to be committed.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.session.borrow().renderer.has_pending_work()
    }
}
