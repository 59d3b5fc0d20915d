//! The owned engine value: bundles the outbound queue, transport
//! handle, event bus and last-sent frame as fields of one value
//! constructed explicitly at startup, so an embedder can stand up more
//! than one engine (e.g. one per test).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::bus::{EventBus, Signal};
use crate::controller::Controller;
use crate::checksum::CrcProvider;
use crate::frame::FrameWriter;
use crate::gui::GuiNotifier;
use crate::queue::OutboundQueue;
use crate::timings::EngineTimings;
use crate::transmitter::Transmitter;

pub struct Engine<W, C, G, T: EngineTimings> {
    controller: Controller<W, C, G, T>,
    bus: Arc<EventBus>,
    queue: Arc<OutboundQueue>,
    done: Arc<AtomicBool>,
}

/// A cheap, cloneable handle that can request shutdown without holding
/// the `Engine` itself, needed once `Engine::run` has been handed off
/// to its own thread and the embedder (e.g. `hdlink-cli`'s stdin
/// reader) only has the bus and the shutdown flag left to act on.
#[derive(Clone)]
pub struct ShutdownToken {
    bus: Arc<EventBus>,
    done: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn request_shutdown(&self) {
        self.done.store(true, std::sync::atomic::Ordering::Release);
        self.bus.raise(Signal::EndProgram);
    }
}

impl<W, C, G, T> Engine<W, C, G, T>
where
    W: FrameWriter,
    C: CrcProvider,
    G: GuiNotifier,
    T: EngineTimings,
{
    pub fn new(writer: W, crc: C, gui: G) -> Self {
        let bus = Arc::new(EventBus::new());
        let queue = Arc::new(OutboundQueue::new());
        let done = Arc::new(AtomicBool::new(false));
        let transmitter = Transmitter::new(writer, crc);
        let controller =
            Controller::new(transmitter, Arc::clone(&bus), Arc::clone(&queue), Arc::clone(&done), gui);

        Engine { controller, bus, queue, done }
    }

    /// A handle the application's output producer can push bytes
    /// through, independent of the engine's own `Controller` thread.
    pub fn queue(&self) -> Arc<OutboundQueue> {
        Arc::clone(&self.queue)
    }

    /// A handle the inbound frame parser raises signals on.
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Requests a graceful shutdown: sets the shared `done` flag and
    /// raises the manual-reset `EndProgram` signal so any in-flight
    /// wait wakes immediately.
    pub fn request_shutdown(&self) {
        self.shutdown_token().request_shutdown();
    }

    /// A handle an embedder can move to another thread (or stash
    /// alongside `queue()`/`bus()`) once `run()` has been handed off,
    /// to still be able to ask the engine to stop.
    pub fn shutdown_token(&self) -> ShutdownToken {
        ShutdownToken { bus: Arc::clone(&self.bus), done: Arc::clone(&self.done) }
    }

    /// Runs the Controller to completion on the calling thread. Meant
    /// to be spawned on a dedicated thread by the embedder, alongside
    /// the inbound parser thread and the output producer.
    pub fn run(&mut self) {
        self.controller.run();
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn controller_mut(&mut self) -> &mut Controller<W, C, G, T> {
        &mut self.controller
    }
}
