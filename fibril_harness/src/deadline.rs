// Copyright 2026 the Fibril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted idle deadlines.

use core::cell::Cell;
use core::time::Duration;

use fibril_core::host::IdleDeadline;

/// A deadline that never runs out.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unlimited;

impl IdleDeadline for Unlimited {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// A deadline that is already over.
#[derive(Clone, Copy, Debug, Default)]
pub struct Exhausted;

impl IdleDeadline for Exhausted {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

/// A simulated clock: every query consumes a fixed cost from a budget.
#[derive(Debug)]
pub struct FixedBudget {
    remaining: Cell<Duration>,
    cost_per_check: Duration,
}

impl FixedBudget {
    /// Creates a budget of `total` that shrinks by `cost_per_check` on every
    /// [`time_remaining`](IdleDeadline::time_remaining) call.
    #[must_use]
    pub const fn new(total: Duration, cost_per_check: Duration) -> Self {
        Self {
            remaining: Cell::new(total),
            cost_per_check,
        }
    }
}

impl IdleDeadline for FixedBudget {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get().saturating_sub(self.cost_per_check);
        self.remaining.set(left);
        left
    }
}

/// Reports plenty of time for the first `checks` queries, then none.
#[derive(Debug)]
pub struct Countdown {
    left: Cell<u32>,
}

impl Countdown {
    /// Creates a countdown that allows `checks` more units after the first.
    #[must_use]
    pub const fn new(checks: u32) -> Self {
        Self {
            left: Cell::new(checks),
        }
    }
}

impl IdleDeadline for Countdown {
    fn time_remaining(&self) -> Duration {
        match self.left.get() {
            0 => Duration::ZERO,
            n => {
                self.left.set(n - 1);
                Duration::from_secs(1)
            }
        }
    }
}
