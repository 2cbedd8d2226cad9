// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking wait primitive shared by all connector wait operations.
//!
//! A single gate per connector coalesces wakeups from every source (data
//! arrival, match changes, acknowledgments); waiters re-check their own
//! predicate after each wakeup. The gate carries a closed flag so connector
//! teardown wakes every blocked thread deterministically instead of leaving
//! it to time out.
//!
//! Predicates are evaluated with the gate lock released; a monotonically
//! increasing epoch detects events that fire between the predicate check and
//! the subsequent sleep, so no wakeup is ever lost.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Timeout convention shared by all wait operations: milliseconds, with a
/// negative value meaning "wait indefinitely" and zero meaning "poll".
pub const TIMEOUT_INFINITE: i64 = -1;

#[derive(Debug, Default)]
struct GateState {
    epoch: u64,
    closed: bool,
}

/// Event gate: condvar + epoch + closed flag.
#[derive(Debug, Default)]
pub struct EventGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl EventGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that something observable changed. Wakes all waiters; each
    /// re-evaluates its predicate.
    pub fn notify(&self) {
        let mut state = self.state.lock();
        state.epoch = state.epoch.wrapping_add(1);
        self.cond.notify_all();
    }

    /// Mark the gate closed and wake everyone. All current and future waits
    /// fail with [`Error::ConnectorClosed`].
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Block until `check` yields a value, the timeout elapses, or the gate
    /// closes.
    ///
    /// `timeout_ms < 0` waits indefinitely; `0` polls once without blocking.
    /// The predicate runs without the gate lock held, so it may take other
    /// locks freely.
    pub fn wait_until<T>(&self, timeout_ms: i64, mut check: impl FnMut() -> Option<T>) -> Result<T> {
        let deadline = if timeout_ms < 0 {
            None
        } else {
            Instant::now().checked_add(Duration::from_millis(timeout_ms as u64))
        };

        loop {
            let epoch_before = {
                let state = self.state.lock();
                if state.closed {
                    return Err(Error::ConnectorClosed);
                }
                state.epoch
            };

            if let Some(v) = check() {
                return Ok(v);
            }

            let mut state = self.state.lock();
            if state.closed {
                return Err(Error::ConnectorClosed);
            }
            if state.epoch != epoch_before {
                // An event landed between the check and the lock; re-check.
                continue;
            }

            match deadline {
                None => {
                    self.cond.wait(&mut state);
                }
                Some(deadline) => {
                    if self.cond.wait_until(&mut state, deadline).timed_out() {
                        if state.closed {
                            return Err(Error::ConnectorClosed);
                        }
                        return Err(Error::Timeout);
                    }
                }
            }
        }
    }
}
