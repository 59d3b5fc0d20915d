//! The outbound byte queue, shared between an external producer (the
//! application) and the Transmitter under a single mutex.
//!
//! The lock is taken and released once per byte copied out, to keep
//! each critical section minimal. `OutboundQueue` never holds the lock
//! across a transport write, draining one byte per lock acquisition in
//! [`OutboundQueue::pop_into`].

use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct OutboundQueue {
    inner: Mutex<VecDeque<u8>>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        OutboundQueue { inner: Mutex::new(VecDeque::new()) }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        let mut guard = self.inner.lock().unwrap();
        guard.extend(bytes.iter().copied());
    }

    /// Drains up to `buf.len()` bytes into `buf`, re-acquiring the lock
    /// per byte so the mutex is held for the minimum window needed.
    /// Returns the number of bytes written.
    pub fn pop_into(&self, buf: &mut [u8]) -> usize {
        let mut written = 0;
        while written < buf.len() {
            let mut guard = self.inner.lock().unwrap();
            let Some(byte) = guard.pop_front() else {
                break;
            };
            drop(guard);
            buf[written] = byte;
            written += 1;
        }
        written
    }
}
