//! The Transmitter: constructs the six kinds of outbound frames,
//! computes CRC, and writes them synchronously.

use hdlink_common::dev_warn;

use crate::constants::{self, ACK, NAK, NUL, PAYLOAD_LEN};
use crate::checksum::CrcProvider;
use crate::frame::{ControlFrame, DataFrame, FrameWriter, Sot};
use crate::queue::OutboundQueue;

fn piggyback_byte(ack: bool) -> u8 {
    if ack { ACK } else { NAK }
}

pub struct Transmitter<W, C> {
    writer: W,
    crc: C,
    sot: Sot,
    /// The last data frame emitted verbatim, including its original
    /// SOT. `None` until the first `send_next` succeeds.
    last_sent: Option<DataFrame>,
}

impl<W: FrameWriter, C: CrcProvider> Transmitter<W, C> {
    pub fn new(writer: W, crc: C) -> Self {
        Transmitter { writer, crc, sot: Sot::default(), last_sent: None }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// `send_enq(ack)` emits `[SYN, ACK|0, ENQ]`. The piggyback is
    /// the null byte, not NAK, when `ack` is false: an initiator's ENQ
    /// carries no acknowledgement at all.
    pub fn send_enq(&mut self, ack: bool) -> bool {
        let piggyback = if ack { ACK } else { NUL };
        let frame = ControlFrame::new(piggyback, constants::ENQ);
        let wrote = self.writer.write_out(frame.as_bytes());
        if !wrote {
            dev_warn!("write_out failed sending ENQ");
        }
        wrote
    }

    /// `send_eot(ack)` emits `[SYN, ACK|NAK, EOT]`.
    pub fn send_eot(&mut self, ack: bool) -> bool {
        let frame = ControlFrame::new(piggyback_byte(ack), constants::EOT);
        let wrote = self.writer.write_out(frame.as_bytes());
        if !wrote {
            dev_warn!("write_out failed sending EOT");
        }
        wrote
    }

    /// `send_next(ack)` drains up to 1020 bytes from `queue` into a
    /// fresh data frame, zero-pads the remainder, computes the CRC,
    /// toggles the SOT, caches the frame, and writes it. Returns
    /// `false` with no side effect if the queue was empty.
    pub fn send_next(&mut self, ack: bool, queue: &OutboundQueue) -> bool {
        if queue.is_empty() {
            return false;
        }

        let mut buf = [0u8; constants::DATA_FRAME_LEN];
        buf[0] = constants::SYN;
        buf[constants::PIGGYBACK_OFFSET] = piggyback_byte(ack);
        buf[constants::SOT_OFFSET] = self.sot.byte();

        let payload = &mut buf[constants::PAYLOAD_OFFSET..constants::PAYLOAD_OFFSET + PAYLOAD_LEN];
        queue.pop_into(payload);
        // Remaining bytes of `payload` that the queue ran dry on are
        // already zero from the buffer's initialization.

        let mut frame = DataFrame(buf);
        let crc = self.crc.compute(frame.crc_covered());
        frame.set_crc(crc);

        let wrote = self.writer.write_out(frame.as_bytes());
        if wrote {
            self.sot = self.sot.toggled();
            self.last_sent = Some(frame);
        } else {
            dev_warn!("write_out failed sending data frame");
        }
        wrote
    }

    /// `resend(ack)` fails if there is no cached frame. Rewrites the
    /// piggyback byte and **recomputes the CRC** before re-emitting the
    /// cached 1025 bytes; the SOT is never toggled.
    ///
    /// The CRC must be recomputed here since it covers the piggyback
    /// byte; re-emitting the original CRC alongside a rewritten
    /// piggyback would leave the frame CRC-invalid at the peer.
    pub fn resend(&mut self, ack: bool) -> bool {
        let Some(frame) = self.last_sent.as_mut() else {
            return false;
        };

        frame.set_piggyback(piggyback_byte(ack));
        let crc = self.crc.compute(frame.crc_covered());
        frame.set_crc(crc);

        let wrote = self.writer.write_out(frame.as_bytes());
        if !wrote {
            dev_warn!("write_out failed resending cached frame");
        }
        wrote
    }

    pub fn current_sot(&self) -> Sot {
        self.sot
    }

    pub fn cached_frame(&self) -> Option<&DataFrame> {
        self.last_sent.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Crc16XModem;

    #[derive(Default)]
    struct RecordingWriter {
        frames: Vec<Vec<u8>>,
        fail_next: bool,
    }

    impl FrameWriter for RecordingWriter {
        fn write_out(&mut self, buf: &[u8]) -> bool {
            if self.fail_next {
                self.fail_next = false;
                return false;
            }
            self.frames.push(buf.to_vec());
            true
        }
    }

    fn transmitter() -> Transmitter<RecordingWriter, Crc16XModem> {
        Transmitter::new(RecordingWriter::default(), Crc16XModem::new())
    }

    #[test]
    fn enq_with_ack_carries_ack_byte() {
        let mut tx = transmitter();
        assert!(tx.send_enq(true));
        let frame = &tx.writer().frames[0];
        assert_eq!(frame, &[constants::SYN, ACK, constants::ENQ]);
    }

    #[test]
    fn initiator_enq_carries_null_not_nak() {
        let mut tx = transmitter();
        assert!(tx.send_enq(false));
        let frame = &tx.writer().frames[0];
        assert_eq!(frame[1], NUL);
        assert_ne!(frame[1], NAK);
    }

    #[test]
    fn eot_carries_ack_or_nak() {
        let mut tx = transmitter();
        tx.send_eot(false);
        assert_eq!(tx.writer().frames[0][1], NAK);
    }

    #[test]
    fn send_next_on_empty_queue_is_a_noop() {
        let mut tx = transmitter();
        let queue = OutboundQueue::new();
        assert!(!tx.send_next(true, &queue));
        assert!(tx.writer().frames.is_empty());
        assert!(tx.cached_frame().is_none());
    }

    #[test]
    fn send_next_produces_exact_size_frame_with_syn_first() {
        let mut tx = transmitter();
        let queue = OutboundQueue::new();
        queue.push_bytes(&[0x41, 0x42, 0x43]);
        assert!(tx.send_next(true, &queue));
        let frame = &tx.writer().frames[0];
        assert_eq!(frame.len(), constants::DATA_FRAME_LEN);
        assert_eq!(frame[0], constants::SYN);
        assert_eq!(&frame[3..6], &[0x41, 0x42, 0x43]);
        assert!(frame[6..1023].iter().all(|&b| b == 0));
    }

    #[test]
    fn consecutive_new_frames_alternate_sot() {
        let mut tx = transmitter();
        let queue = OutboundQueue::new();
        queue.push_bytes(&[1]);
        tx.send_next(true, &queue);
        let first_sot = tx.writer().frames[0][2];

        queue.push_bytes(&[2]);
        tx.send_next(true, &queue);
        let second_sot = tx.writer().frames[1][2];

        assert_ne!(first_sot, second_sot);
        assert!(first_sot == constants::DC1 || first_sot == constants::DC2);
    }

    #[test]
    fn resend_without_a_cached_frame_fails() {
        let mut tx = transmitter();
        assert!(!tx.resend(true));
    }

    #[test]
    fn resend_preserves_sot_and_rewrites_piggyback() {
        let mut tx = transmitter();
        let queue = OutboundQueue::new();
        queue.push_bytes(&[9, 9, 9]);
        tx.send_next(true, &queue);
        let original = tx.writer().frames[0].clone();

        assert!(tx.resend(false));
        let resent = &tx.writer().frames[1];

        assert_eq!(resent[2], original[2], "SOT must survive a resend");
        assert_eq!(resent[1], NAK);
        assert_ne!(resent, &original, "piggyback changed so bytes differ");
    }

    #[test]
    fn resend_recomputes_crc_after_piggyback_rewrite() {
        let mut tx = transmitter();
        let queue = OutboundQueue::new();
        queue.push_bytes(&[5, 6, 7]);
        tx.send_next(true, &queue);

        tx.resend(false);
        let resent = tx.writer().frames[1].clone();
        let crc = &resent[constants::CRC_OFFSET..constants::CRC_OFFSET + 2];
        let expected = Crc16XModem::new().compute(&resent[1..constants::CRC_OFFSET]);
        assert_eq!(crc, expected);
    }

    #[test]
    fn resend_survives_repeated_calls() {
        let mut tx = transmitter();
        let queue = OutboundQueue::new();
        queue.push_bytes(&[1, 2, 3]);
        tx.send_next(true, &queue);

        for _ in 0..5 {
            assert!(tx.resend(false));
        }
        assert_eq!(tx.writer().frames.len(), 6);
    }

    #[test]
    fn failed_write_is_reported_as_false() {
        let mut tx = transmitter();
        tx.writer = RecordingWriter { frames: Vec::new(), fail_next: true };
        let queue = OutboundQueue::new();
        queue.push_bytes(&[1]);
        assert!(!tx.send_next(true, &queue));
        assert!(tx.cached_frame().is_none());
    }

    #[test]
    fn queue_emptying_mid_frame_zero_pads_rest() {
        let mut tx = transmitter();
        let queue = OutboundQueue::new();
        queue.push_bytes(&[7, 7]);
        assert!(tx.send_next(true, &queue));
        let frame = &tx.writer().frames[0];
        assert_eq!(&frame[3..5], &[7, 7]);
        assert!(frame[5..1023].iter().all(|&b| b == 0));
        assert!(queue.is_empty());
    }
}
