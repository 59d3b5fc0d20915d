//! The event bus: eight named binary signals raised by the inbound
//! frame parser (external) and observed by the Controller.
//!
//! Modeled as Win32 auto-reset `Event` objects waited on with
//! `WaitForMultipleObjects` would be. The reach for `Arc<Mutex<..>>`
//! shared state around `dxkb-split-link-tester::SerialBus` is the idiom
//! this borrows, a `Mutex`-guarded signal table plus a `Condvar` for the
//! blocking wait, rather than a busy poll loop.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// The eight named signals, in the fixed priority order the Controller
/// waits on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Enq = 0,
    OutputAvailable = 1,
    EndProgram = 2,
    Ack = 3,
    Nak = 4,
    DataReceived = 5,
    BadDataReceived = 6,
    Eot = 7,
}

const SIGNAL_COUNT: usize = 8;

impl Signal {
    /// `EndProgram` is manual-reset: once raised it stays set, so every
    /// later multi-wait that includes it returns immediately.
    fn is_manual_reset(self) -> bool {
        matches!(self, Signal::EndProgram)
    }
}

/// What a [`EventBus::wait_many`] call resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Signaled(Signal),
    Timeout,
}

#[derive(Default)]
struct Signals {
    set: [bool; SIGNAL_COUNT],
}

pub struct EventBus {
    state: Mutex<Signals>,
    condvar: Condvar,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus { state: Mutex::new(Signals::default()), condvar: Condvar::new() }
    }

    /// Raised by one thread (parser, queue producer, or shutdown
    /// logic), consumed by the Controller.
    pub fn raise(&self, signal: Signal) {
        let mut guard = self.state.lock().unwrap();
        guard.set[signal as usize] = true;
        self.condvar.notify_all();
    }

    /// Blocks until one of `watched` (checked in the order given) is
    /// set, or `timeout` elapses. A matched auto-reset signal is
    /// cleared before returning; `EndProgram` is never cleared.
    ///
    /// Passing `None` for `timeout` waits indefinitely, matching the
    /// Idle phase's `WaitForMultipleObjects(..., INFINITE)` call.
    pub fn wait_many(&self, watched: &[Signal], timeout: Option<Duration>) -> WaitOutcome {
        let deadline = timeout.map(|d| Instant::now() + d);
        let mut guard = self.state.lock().unwrap();
        loop {
            if let Some(found) = watched.iter().copied().find(|s| guard.set[*s as usize]) {
                if !found.is_manual_reset() {
                    guard.set[found as usize] = false;
                }
                return WaitOutcome::Signaled(found);
            }

            match deadline {
                None => {
                    guard = self.condvar.wait(guard).unwrap();
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::Timeout;
                    }
                    let (g, timeout_result) =
                        self.condvar.wait_timeout(guard, deadline - now).unwrap();
                    guard = g;
                    if timeout_result.timed_out() {
                        // Re-check once more: a signal may have been
                        // raised in the same instant the wait timed out.
                        if let Some(found) =
                            watched.iter().copied().find(|s| guard.set[*s as usize])
                        {
                            if !found.is_manual_reset() {
                                guard.set[found as usize] = false;
                            }
                            return WaitOutcome::Signaled(found);
                        }
                        return WaitOutcome::Timeout;
                    }
                }
            }
        }
    }

    /// Convenience for a single-signal wait.
    pub fn wait_one(&self, signal: Signal, timeout: Option<Duration>) -> WaitOutcome {
        self.wait_many(&[signal], timeout)
    }

    #[cfg(test)]
    fn is_set(&self, signal: Signal) -> bool {
        self.state.lock().unwrap().set[signal as usize]
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
