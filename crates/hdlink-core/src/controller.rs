//! The Protocol Controller: the Idle/Arbitration and Active two-phase
//! state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use hdlink_common::{dev_debug, dev_info, dev_warn};

use crate::bus::{EventBus, Signal, WaitOutcome};
use crate::checksum::CrcProvider;
use crate::frame::FrameWriter;
use crate::gui::GuiNotifier;
use crate::queue::OutboundQueue;
use crate::timings::EngineTimings;
use crate::transmitter::Transmitter;

/// How `Active` concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveExit {
    /// Both sides EOT'd; nothing left to exchange.
    Graceful,
    /// The peer never transmitted its initial frame.
    Aborted,
    /// Five consecutive reply timeouts.
    Fatal,
}

pub struct Controller<W, C, G, T: EngineTimings> {
    transmitter: Transmitter<W, C>,
    bus: Arc<EventBus>,
    queue: Arc<OutboundQueue>,
    done: Arc<AtomicBool>,
    gui: G,

    /// Persists across Active sessions: `sendClear` and `teardownReady`
    /// are never reset at Active entry, only inside the Idle/Active
    /// loops themselves.
    send_clear: bool,
    teardown_ready: bool,

    _timings: std::marker::PhantomData<T>,
}

enum IdleOutcome {
    EnterActive { send_clear: bool },
    EndProgram,
    Continue,
}

/// Test-facing mirror of [`IdleOutcome`] (kept separate so the
/// production enum never needs `pub`).
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleOutcomeForTest {
    EnteredActive { send_clear: bool },
    EndProgram,
    Continue,
}

impl<W, C, G, T> Controller<W, C, G, T>
where
    W: FrameWriter,
    C: CrcProvider,
    G: GuiNotifier,
    T: EngineTimings,
{
    pub fn new(
        transmitter: Transmitter<W, C>,
        bus: Arc<EventBus>,
        queue: Arc<OutboundQueue>,
        done: Arc<AtomicBool>,
        gui: G,
    ) -> Self {
        Controller {
            transmitter,
            bus,
            queue,
            done,
            gui,
            send_clear: false,
            teardown_ready: false,
            _timings: std::marker::PhantomData,
        }
    }

    /// Exposes a single `Active` run for the integration tests in
    /// `tests/engine.rs`, which drive the bus directly to exercise the
    /// exchange without going through the (indefinitely blocking) Idle
    /// phase. Not part of the crate's public API.
    #[cfg(any(test, feature = "test-support"))]
    pub fn run_active_for_test(&mut self, send_clear: bool) -> ActiveExit {
        self.send_clear = send_clear;
        self.active()
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn transmitter_mut(&mut self) -> &mut Transmitter<W, C> {
        &mut self.transmitter
    }

    /// Runs a single Idle-phase iteration for the integration tests
    /// covering arbitration, both clean initiation and ENQ collision.
    #[cfg(any(test, feature = "test-support"))]
    pub fn run_idle_iteration_for_test(&mut self) -> IdleOutcomeForTest {
        match self.idle_iteration() {
            IdleOutcome::EnterActive { send_clear } => {
                self.send_clear = send_clear;
                IdleOutcomeForTest::EnteredActive { send_clear }
            }
            IdleOutcome::EndProgram => IdleOutcomeForTest::EndProgram,
            IdleOutcome::Continue => IdleOutcomeForTest::Continue,
        }
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Loops until `END_PROGRAM` is raised or the shared shutdown flag
    /// is set.
    pub fn run(&mut self) {
        while !self.is_done() {
            match self.idle_iteration() {
                IdleOutcome::EndProgram => return,
                IdleOutcome::Continue => {}
                IdleOutcome::EnterActive { send_clear } => {
                    self.send_clear = send_clear;
                    let _exit = self.active();
                    // The engine bounces back to Idle regardless of
                    // which exit code Active returned. A fatal timeout
                    // is not itself a reason to tear down the process,
                    // that is caller policy.
                }
            }
        }
    }

    fn idle_iteration(&mut self) -> IdleOutcome {
        self.send_clear = false;

        if !self.queue.is_empty() {
            self.bus.raise(Signal::OutputAvailable);
        }

        let outcome =
            self.bus.wait_many(&[Signal::Enq, Signal::OutputAvailable, Signal::EndProgram], None);

        match outcome {
            WaitOutcome::Signaled(Signal::Enq) => {
                dev_debug!("peer ENQ received; yielding the line and entering Active");
                self.transmitter.send_enq(true);
                IdleOutcome::EnterActive { send_clear: false }
            }
            WaitOutcome::Signaled(Signal::OutputAvailable) => self.initiate_arbitration(),
            WaitOutcome::Signaled(Signal::EndProgram) => IdleOutcome::EndProgram,
            _ => IdleOutcome::Continue,
        }
    }

    /// We have local output: transmit an initiator ENQ and resolve the
    /// handshake, including the ENQ-collision back-off path.
    fn initiate_arbitration(&mut self) -> IdleOutcome {
        dev_debug!("output available; sending initiator ENQ");
        self.transmitter.send_enq(false);

        match self.bus.wait_one(Signal::Enq, Some(T::TIMEOUT)) {
            WaitOutcome::Timeout => {
                dev_debug!("no ENQ reply within TIMEOUT; dropping this initiation attempt");
                IdleOutcome::Continue
            }
            WaitOutcome::Signaled(_) => match self.bus.wait_one(Signal::Ack, Some(T::SHORT_WINDOW)) {
                WaitOutcome::Signaled(_) => {
                    dev_debug!("peer ACKed our initiation; entering Active as sender");
                    IdleOutcome::EnterActive { send_clear: true }
                }
                WaitOutcome::Timeout => self.resolve_enq_collision(),
            },
        }
    }

    /// Both sides initiated: back off a random duration in
    /// `[0, 2*TIMEOUT)`. An ENQ that fires during the back-off is
    /// re-raised so the next Idle iteration handles it as a
    /// peer-initiated ENQ.
    fn resolve_enq_collision(&mut self) -> IdleOutcome {
        let backoff_millis = {
            let span = (T::TIMEOUT * 2).as_millis().max(1) as u64;
            rand::thread_rng().gen_range(0..span)
        };
        dev_info!("ENQ collision detected; backing off {backoff_millis}ms");

        match self.bus.wait_one(Signal::Enq, Some(Duration::from_millis(backoff_millis))) {
            WaitOutcome::Signaled(_) => {
                dev_debug!("ENQ seen again during back-off; re-raising for the next Idle tick");
                self.bus.raise(Signal::Enq);
            }
            WaitOutcome::Timeout => {}
        }
        IdleOutcome::Continue
    }

    /// The send/wait/inspect exchange loop.
    fn active(&mut self) -> ActiveExit {
        let mut resend = false;
        let mut re_ack = true;
        let mut timeouts: u32 = 0;

        loop {
            if self.is_done() {
                return ActiveExit::Graceful;
            }

            // -- Send step --
            if self.send_clear {
                if resend {
                    self.transmitter.resend(re_ack);
                    self.gui.on_sent();
                } else if !self.queue.is_empty() {
                    self.transmitter.send_next(re_ack, &self.queue);
                    self.gui.on_sent();
                } else if self.teardown_ready {
                    dev_info!("both sides drained and EOT'd; Active exiting gracefully");
                    return ActiveExit::Graceful;
                } else {
                    self.transmitter.send_eot(re_ack);
                }
            }

            // -- Wait for ACK/NAK --
            let reply = self.bus.wait_many(&[Signal::Ack, Signal::Nak], Some(T::TIMEOUT));
            match reply {
                WaitOutcome::Signaled(Signal::Ack) => {
                    resend = false;
                }
                WaitOutcome::Timeout => {
                    timeouts += 1;
                    dev_warn!("reply timeout {timeouts}/{}", T::MAX_TIMEOUTS);
                    if timeouts >= T::MAX_TIMEOUTS {
                        dev_warn!("fatal: {} consecutive reply timeouts", T::MAX_TIMEOUTS);
                        return ActiveExit::Fatal;
                    }
                    if self.send_clear {
                        resend = true;
                        self.gui.on_lost();
                    } else {
                        dev_warn!("peer silent at session start; aborting");
                        return ActiveExit::Aborted;
                    }
                }
                WaitOutcome::Signaled(Signal::Nak) => {
                    if self.send_clear {
                        resend = true;
                        self.gui.on_lost();
                    } else {
                        // A NAK on the very first exchange, before we
                        // have ever been clear to send, aborts the
                        // session the same way a timeout would, even
                        // though the cause here is a NAK rather than
                        // silence.
                        dev_warn!("NAK on initial exchange; aborting");
                        return ActiveExit::Aborted;
                    }
                }
                WaitOutcome::Signaled(_) => unreachable!("only Ack/Nak were watched"),
            }

            // -- Inspect payload of the received reply --
            match self.bus.wait_many(
                &[Signal::DataReceived, Signal::BadDataReceived, Signal::Eot],
                Some(T::SHORT_WINDOW),
            ) {
                WaitOutcome::Signaled(Signal::DataReceived) => {
                    dev_debug!("data frame received and CRC-verified");
                    re_ack = true;
                    self.teardown_ready = false;
                    self.gui.on_received();
                }
                WaitOutcome::Signaled(Signal::BadDataReceived) => {
                    dev_warn!("data frame received with CRC mismatch; NAK on next send");
                    re_ack = false;
                    self.teardown_ready = false;
                    self.gui.on_received_bad();
                }
                _ => {
                    // EOT, or nothing arrived within the short window.
                    re_ack = true;
                    self.teardown_ready = true;
                }
            }

            self.send_clear = true;
        }
    }
}
