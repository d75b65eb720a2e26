// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for fibril.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomHost`]: DOM [`HostAdapter`] with closure-backed event listeners
//! - [`IdleLoop`]: `requestIdleCallback` slice source
//! - [`WebRoot`]: a renderer bound to a container, driven by an `IdleLoop`

#![no_std]

extern crate alloc;

mod dom;
mod idle;
mod root;

pub use dom::DomHost;
pub use fibril_core::host::HostAdapter;
pub use idle::IdleLoop;
pub use root::WebRoot;
