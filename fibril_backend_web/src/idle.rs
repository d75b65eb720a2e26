// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestIdleCallback` slice source.
//!
//! [`IdleLoop`] runs a callback in browser idle periods. The callback
//! receives the period's deadline as a [`fibril_core::host::IdleDeadline`]
//! and returns whether more work is pending; the loop re-registers itself
//! until it returns `false`.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::time::Duration;

use fibril_core::host::IdleDeadline;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestIdleCallback")]
    fn request_idle_callback(callback: &JsValue) -> u32;

    #[wasm_bindgen(js_name = "cancelIdleCallback")]
    fn cancel_idle_callback(id: u32);
}

/// Converts a `timeRemaining()` reading in milliseconds.
fn millis_to_duration(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::ZERO)
}

/// The deadline of one browser idle period.
struct BrowserDeadline(web_sys::IdleDeadline);

impl IdleDeadline for BrowserDeadline {
    fn time_remaining(&self) -> Duration {
        millis_to_duration(self.0.time_remaining())
    }
}

/// A `requestIdleCallback` loop.
///
/// Create with [`IdleLoop::new`], then call [`request`](Self::request)
/// whenever there is work. The loop keeps requesting idle periods while the
/// callback returns `true`, and stops when it returns `false`,
/// [`cancel`](Self::cancel) is called, or the `IdleLoop` is dropped.
pub struct IdleLoop {
    inner: Rc<IdleInner>,
}

type IdleClosure = Closure<dyn FnMut(web_sys::IdleDeadline)>;

struct IdleInner {
    /// The JS closure registered with `requestIdleCallback`.
    closure: RefCell<Option<IdleClosure>>,

    /// Runs one slice; returns `true` while work is pending.
    callback: RefCell<Box<dyn FnMut(&dyn IdleDeadline) -> bool>>,

    /// Whether an idle callback is currently requested.
    pending: Cell<bool>,

    /// The ID returned by the most recent `requestIdleCallback` call.
    idle_id: Cell<u32>,
}

impl IdleInner {
    fn schedule(&self) {
        if let Some(closure) = &*self.closure.borrow() {
            self.idle_id
                .set(request_idle_callback(closure.as_ref().unchecked_ref()));
            self.pending.set(true);
        }
    }
}

impl IdleLoop {
    /// Creates an idle loop that is **not yet requested**.
    pub fn new(callback: impl FnMut(&dyn IdleDeadline) -> bool + 'static) -> Self {
        let inner = Rc::new(IdleInner {
            closure: RefCell::new(None),
            callback: RefCell::new(Box::new(callback)),
            pending: Cell::new(false),
            idle_id: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |deadline: web_sys::IdleDeadline| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(false);
            let more = inner.callback.borrow_mut()(&BrowserDeadline(deadline));
            if more {
                inner.schedule();
            }
        }) as Box<dyn FnMut(web_sys::IdleDeadline)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Requests an idle period. No-op if one is already requested.
    pub fn request(&self) {
        if !self.inner.pending.get() {
            self.inner.schedule();
        }
    }

    /// Cancels the pending idle callback, if any.
    pub fn cancel(&self) {
        if self.inner.pending.replace(false) {
            cancel_idle_callback(self.inner.idle_id.get());
        }
    }

    /// Returns `true` while an idle callback is requested.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get()
    }
}

impl Drop for IdleLoop {
    fn drop(&mut self) {
        self.cancel();
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for IdleLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdleLoop")
            .field("pending", &self.inner.pending.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_time_converts_from_millis() {
        assert_eq!(millis_to_duration(16.0), Duration::from_millis(16));
        assert_eq!(millis_to_duration(0.5), Duration::from_micros(500));
        assert_eq!(millis_to_duration(-1.0), Duration::ZERO);
        assert_eq!(millis_to_duration(f64::NAN), Duration::ZERO);
    }
}
