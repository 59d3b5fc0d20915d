//! `FrameParserThread`, the inbound frame parser: a background thread
//! that reads bytes off the serial port, re-synchronizes on the `SYN`
//! preamble, verifies the CRC of data frames, and raises the matching
//! bus signal.
//!
//! Structured the same way `dxkb-split-link-tester`'s receiver thread
//! is (`read_next_frame` in that crate's `main.rs`): a dedicated thread
//! owns its own handle onto the transport and feeds a shared structure
//! the rest of the program reacts to. There it was an
//! `Arc<Mutex<LinkedList<RecvMsg>>>`, here it is the engine's own
//! [`EventBus`].

use std::io::ErrorKind;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hdlink_common::{dev_trace, dev_warn};
use hdlink_core::bus::{EventBus, Signal};
use hdlink_core::checksum::{Crc16XModem, CrcProvider};
use hdlink_core::constants::{ACK, DC1, DC2, EOT, ENQ, NAK, PAYLOAD_LEN, SYN};
use serial2::SerialPort;

/// Owns the background read thread. It has no cooperative
/// cancellation path (it blocks in the port's own read-timeout loop
/// waiting on the peer, not on our queue or bus), so it is meant to be
/// dropped (never joined) once the embedder is shutting down; the OS
/// reaps it at process exit.
pub struct FrameParserThread {
    _handle: JoinHandle<()>,
}

impl FrameParserThread {
    /// Spawns the parser thread. `port` should be a clone of the same
    /// handle the [`crate::serial::SerialFrameWriter`] writes through;
    /// `serial2::SerialPort`'s read/write take `&self`, so sharing an
    /// `Arc` between the two directions is safe.
    pub fn spawn(port: Arc<SerialPort>, bus: Arc<EventBus>) -> Self {
        let handle = thread::spawn(move || Self::run(port, bus));
        FrameParserThread { _handle: handle }
    }

    fn run(port: Arc<SerialPort>, bus: Arc<EventBus>) {
        let crc = Crc16XModem::new();
        let mut byte = [0u8; 1];

        loop {
            if !Self::read_exact(&port, &mut byte) {
                continue;
            }
            if byte[0] != SYN {
                // Not a frame boundary: keep scanning for the next SYN.
                continue;
            }

            if !Self::read_exact(&port, &mut byte) {
                dev_warn!("lost sync after SYN (no piggyback byte)");
                continue;
            }
            let piggyback = byte[0];

            if !Self::read_exact(&port, &mut byte) {
                dev_warn!("lost sync after SYN (no code/SOT byte)");
                continue;
            }
            let code_or_sot = byte[0];

            match code_or_sot {
                ENQ => {
                    Self::raise_piggyback(&bus, piggyback, /* nul_is_valid */ true);
                    bus.raise(Signal::Enq);
                }
                EOT => {
                    Self::raise_piggyback(&bus, piggyback, false);
                    bus.raise(Signal::Eot);
                }
                DC1 | DC2 => {
                    Self::handle_data_frame(&port, &bus, &crc, piggyback, code_or_sot);
                }
                other => {
                    dev_warn!("unexpected byte {other:#04x} after SYN/piggyback; resyncing");
                }
            }
        }
    }

    fn raise_piggyback(bus: &EventBus, piggyback: u8, nul_is_valid: bool) {
        match piggyback {
            ACK => bus.raise(Signal::Ack),
            NAK => bus.raise(Signal::Nak),
            _ if nul_is_valid => {}
            other => dev_warn!("unexpected piggyback byte {other:#04x}"),
        }
    }

    /// Reads the remaining `1020 + 2` bytes of a data frame, verifies
    /// the CRC over bytes `[piggyback, SOT, payload..]`, and raises
    /// `DataReceived`/`BadDataReceived` plus the piggyback's `Ack`/
    /// `Nak` accordingly.
    fn handle_data_frame(port: &SerialPort, bus: &EventBus, crc: &Crc16XModem, piggyback: u8, sot: u8) {
        let mut rest = [0u8; PAYLOAD_LEN + 2];
        if !Self::read_exact(port, &mut rest) {
            dev_warn!("data frame truncated mid-payload; dropping");
            return;
        }

        Self::raise_piggyback(bus, piggyback, false);

        let mut covered = Vec::with_capacity(2 + PAYLOAD_LEN);
        covered.push(piggyback);
        covered.push(sot);
        covered.extend_from_slice(&rest[..PAYLOAD_LEN]);

        let expected = crc.compute(&covered);
        let actual = [rest[PAYLOAD_LEN], rest[PAYLOAD_LEN + 1]];

        if actual == expected {
            bus.raise(Signal::DataReceived);
        } else {
            dev_warn!("data frame CRC mismatch: expected {expected:?}, got {actual:?}");
            bus.raise(Signal::BadDataReceived);
        }
    }

    /// Reads exactly `buf.len()` bytes, retrying across the port's
    /// own read-timeout driven short reads. Returns `false` only if
    /// the port itself errored (not merely timed out) partway
    /// through, in which case the caller treats the in-flight frame as
    /// lost and resumes scanning for the next `SYN`.
    fn read_exact(port: &SerialPort, buf: &mut [u8]) -> bool {
        let mut read = 0;
        while read < buf.len() {
            match port.read(&mut buf[read..]) {
                Ok(0) => continue,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    dev_trace!("read timed out, retrying");
                    thread::sleep(Duration::from_millis(1));
                }
                Err(e) => {
                    dev_warn!("serial read failed: {e}");
                    return false;
                }
            }
        }
        true
    }
}
