//! End-to-end exchange scenarios, driven directly against the bus and
//! transmitter so each scenario runs in milliseconds rather than
//! needing a real peer on the other end of a transport.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use hdlink_core::bus::{EventBus, Signal};
use hdlink_core::constants;
use hdlink_core::controller::Controller;
use hdlink_core::checksum::Crc16XModem;
use hdlink_core::queue::OutboundQueue;
use hdlink_core::testutil::{RecordingGui, RecordingWriter};
use hdlink_core::timings::TestTimings;
use hdlink_core::transmitter::Transmitter;
use hdlink_core::{ActiveExit, IdleOutcomeForTest};

fn controller(
) -> (Controller<RecordingWriter, Crc16XModem, RecordingGui, TestTimings>, Arc<EventBus>, Arc<OutboundQueue>, RecordingWriter, RecordingGui)
{
    let writer = RecordingWriter::default();
    let gui = RecordingGui::default();
    let bus = Arc::new(EventBus::new());
    let queue = Arc::new(OutboundQueue::new());
    let done = Arc::new(AtomicBool::new(false));

    let transmitter = Transmitter::new(writer.clone(), Crc16XModem::new());
    let controller = Controller::new(
        transmitter,
        Arc::clone(&bus),
        Arc::clone(&queue),
        done,
        gui.clone(),
    );

    (controller, bus, queue, writer, gui)
}

/// Clean initiation: A puts bytes in its queue, initiates arbitration,
/// the peer ENQs back and ACKs within the short window, and A ends up
/// clear to send with `sendClear = true`.
#[test]
fn clean_initiation_wins_arbitration() {
    let (mut ctl, bus, queue, writer, _gui) = controller();
    queue.push_bytes(&[0x41, 0x42, 0x43]);

    let bus_for_peer = Arc::clone(&bus);
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(5));
        bus_for_peer.raise(Signal::Enq);
        std::thread::sleep(std::time::Duration::from_millis(2));
        bus_for_peer.raise(Signal::Ack);
    });

    let outcome = ctl.run_idle_iteration_for_test();
    assert_eq!(outcome, IdleOutcomeForTest::EnteredActive { send_clear: true });

    let frames = writer.frames.lock().unwrap();
    assert_eq!(frames[0], &[constants::SYN, constants::NUL, constants::ENQ]);
}

/// ENQ collision: both sides raise their own ENQ; neither sees an ACK
/// within the short window, so the engine enters a bounded back-off
/// and returns to Idle (`Continue`) rather than hanging, preserving
/// the ENQ it observed for the next Idle tick.
#[test]
fn enq_collision_backs_off_instead_of_hanging() {
    let (mut ctl, bus, queue, _writer, _gui) = controller();
    queue.push_bytes(&[1]);

    let bus_for_peer = Arc::clone(&bus);
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(2));
        bus_for_peer.raise(Signal::Enq);
        // No ACK is ever sent: this is the collision.
    });

    let outcome = ctl.run_idle_iteration_for_test();
    assert_eq!(outcome, IdleOutcomeForTest::Continue);
}

/// Frame loss and recovery: no reply arrives for one `TIMEOUT`; the
/// engine marks `resend`, notifies "lost", and on the next turn
/// re-emits the identical cached frame before finally getting an ACK.
#[test]
fn frame_loss_triggers_identical_resend_then_recovers() {
    let (mut ctl, bus, queue, writer, gui) = controller();
    queue.push_bytes(&[9, 9, 9]);

    let bus_for_peer = Arc::clone(&bus);
    std::thread::spawn(move || {
        // First reply window: let it time out (no ACK/NAK).
        std::thread::sleep(TestTimings_TIMEOUT() + std::time::Duration::from_millis(10));
        // Second reply window: ACK the resend, then EOT so Active
        // can wind down cleanly instead of looping forever.
        bus_for_peer.raise(Signal::Ack);
        std::thread::sleep(std::time::Duration::from_millis(2));
        bus_for_peer.raise(Signal::Eot);
    });

    let exit = ctl.run_active_for_test(true);
    assert_eq!(exit, ActiveExit::Graceful);

    let frames = writer.frames.lock().unwrap();
    // First send (original) + resend (identical SOT) + the EOT that
    // follows once the queue is drained.
    assert!(frames.len() >= 2);
    assert_eq!(frames[0][2], frames[1][2], "resend must preserve SOT");
    assert_eq!(gui.lost(), 1);
}

#[allow(non_snake_case)]
fn TestTimings_TIMEOUT() -> std::time::Duration {
    <TestTimings as hdlink_core::EngineTimings>::TIMEOUT
}

/// CRC corruption inbound: a bad data frame flips the next piggyback
/// to NAK; once a good frame follows, the piggyback returns to ACK.
#[test]
fn bad_inbound_frame_flips_piggyback_to_nak_then_back() {
    let (mut ctl, bus, queue, writer, gui) = controller();
    // Nothing queued: A is the responder, `sendClear` starts false.

    let bus_for_peer = Arc::clone(&bus);
    std::thread::spawn(move || {
        bus_for_peer.raise(Signal::Ack);
        std::thread::sleep(std::time::Duration::from_millis(1));
        bus_for_peer.raise(Signal::BadDataReceived);

        std::thread::sleep(std::time::Duration::from_millis(5));
        bus_for_peer.raise(Signal::Ack);
        std::thread::sleep(std::time::Duration::from_millis(1));
        bus_for_peer.raise(Signal::DataReceived);

        std::thread::sleep(std::time::Duration::from_millis(5));
        bus_for_peer.raise(Signal::Ack);
        std::thread::sleep(std::time::Duration::from_millis(1));
        bus_for_peer.raise(Signal::Eot);
    });

    queue.push_bytes(&[]); // queue stays logically empty; nothing to send
    let exit = ctl.run_active_for_test(false);
    assert_eq!(exit, ActiveExit::Graceful);

    let frames = writer.frames.lock().unwrap();
    // frames are EOT control frames (3 bytes): [SYN, piggyback, EOT]
    assert!(frames.len() >= 2);
    assert_eq!(frames[0][1], constants::NAK, "piggyback after bad frame must be NAK");
    assert_eq!(frames[1][1], constants::ACK, "piggyback after good frame returns to ACK");
    assert_eq!(gui.received_bad(), 1);
    assert_eq!(gui.received(), 1);
}

/// Graceful teardown: both queues are empty; A sends EOT, the peer
/// EOTs back, and Active exits gracefully.
#[test]
fn mutual_eot_tears_down_gracefully() {
    let (mut ctl, bus, _queue, writer, _gui) = controller();

    let bus_for_peer = Arc::clone(&bus);
    std::thread::spawn(move || {
        bus_for_peer.raise(Signal::Ack);
        std::thread::sleep(std::time::Duration::from_millis(1));
        bus_for_peer.raise(Signal::Eot);
    });

    let exit = ctl.run_active_for_test(true);
    assert_eq!(exit, ActiveExit::Graceful);

    let frames = writer.frames.lock().unwrap();
    assert_eq!(frames[0][2], constants::EOT);
}

/// Fatal timeout: the peer never replies at all; after exactly
/// `MAX_TIMEOUTS` consecutive reply timeouts Active returns `Fatal`.
#[test]
fn five_consecutive_timeouts_is_fatal() {
    let (mut ctl, _bus, queue, _writer, gui) = controller();
    queue.push_bytes(&[1, 2, 3]);

    let exit = ctl.run_active_for_test(true);
    assert_eq!(exit, ActiveExit::Fatal);
    assert_eq!(gui.lost(), <TestTimings as hdlink_core::EngineTimings>::MAX_TIMEOUTS - 1);
}

/// An initial timeout while not clear to send aborts rather than
/// looping forever: the peer was silent at session start.
#[test]
fn silent_peer_at_session_start_aborts_not_fatal() {
    let (mut ctl, _bus, _queue, _writer, _gui) = controller();
    let exit = ctl.run_active_for_test(false);
    assert_eq!(exit, ActiveExit::Aborted);
}
