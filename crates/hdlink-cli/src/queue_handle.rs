//! `OutboundQueueHandle`, a thin producer handle over the engine's
//! shared, mutex-guarded outbound byte queue, usable from a REPL-style
//! input thread without exposing the rest of the engine to it.
//!
//! `OUTPUT_AVAILABLE` is raised by the queue producer itself, not only
//! by the Controller. The Controller's own raise-if-non-empty check at
//! the top of each Idle iteration only covers the moment that iteration
//! starts; without the producer also raising the signal, data pushed
//! while the Controller is already parked in its indefinite Idle wait
//! would never wake it.

use std::sync::Arc;

use hdlink_core::bus::{EventBus, Signal};
use hdlink_core::queue::OutboundQueue;

#[derive(Clone)]
pub struct OutboundQueueHandle {
    queue: Arc<OutboundQueue>,
    bus: Arc<EventBus>,
}

impl OutboundQueueHandle {
    pub fn new(queue: Arc<OutboundQueue>, bus: Arc<EventBus>) -> Self {
        OutboundQueueHandle { queue, bus }
    }

    pub fn push(&self, bytes: &[u8]) {
        self.queue.push_bytes(bytes);
        self.bus.raise(Signal::OutputAvailable);
    }
}
