//! A runnable demonstration of `hdlink-core` driving a real serial
//! link: line arbitration, piggybacked ACK/NAK data exchange, and
//! EOT-based teardown between two instances of this binary, one per
//! end of a point-to-point serial cable.
//!
//! This binary supplies every external collaborator the engine itself
//! leaves abstract: the byte transport ([`serial::SerialFrameWriter`]),
//! the inbound frame parser ([`parser::FrameParserThread`]), the
//! outbound queue producer ([`queue_handle::OutboundQueueHandle`]), and
//! the GUI notification hooks ([`gui::LoggingGui`]). None of this lives
//! in `hdlink-core`.

mod error;
mod gui;
mod parser;
mod queue_handle;
mod serial;

use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hdlink_common::dev_info;
use hdlink_common::time::{Clock, SystemClock};
use hdlink_core::checksum::Crc16XModem;
use hdlink_core::engine::Engine;
use hdlink_core::timings::DefaultTimings;
use serial2::{CharSize, FlowControl, Parity, SerialPort, Settings, StopBits};

use error::CliError;
use gui::LoggingGui;
use parser::FrameParserThread;
use queue_handle::OutboundQueueHandle;
use serial::SerialFrameWriter;

#[derive(Parser, Debug)]
#[command(about = "Demonstrates hdlink-core's line arbitration and reliable exchange over a serial link")]
struct Args {
    /// Path to the serial device, e.g. /dev/ttyUSB0.
    port: String,

    /// Baud rate to configure the port with.
    baud_rate: u32,
}

/// The read timeout on the port governs how promptly the parser
/// thread re-checks for new bytes; it has no bearing on the protocol's
/// own `TIMEOUT`/`SHORT_WINDOW` (those are enforced purely by
/// `hdlink-core`'s event bus waits).
const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(50);

fn open_serial_port(args: &Args) -> Result<SerialPort, CliError> {
    let port = SerialPort::open(&args.port, |mut settings: Settings| {
        settings.set_raw();
        settings.set_baud_rate(args.baud_rate)?;
        settings.set_char_size(CharSize::Bits8);
        settings.set_parity(Parity::None);
        settings.set_stop_bits(StopBits::One);
        settings.set_flow_control(FlowControl::None);
        Ok(settings)
    })
    .map_err(|source| CliError::SerialOpen { port: args.port.clone(), source })?;

    port.set_read_timeout(SERIAL_READ_TIMEOUT)
        .map_err(|source| CliError::SerialConfigure { port: args.port.clone(), source })?;

    Ok(port)
}

fn main() -> Result<(), CliError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let port = Arc::new(open_serial_port(&args)?);

    let mut engine: Engine<SerialFrameWriter, Crc16XModem, LoggingGui, DefaultTimings> = Engine::new(
        SerialFrameWriter::new(Arc::clone(&port)),
        Crc16XModem::new(),
        LoggingGui,
    );

    let queue = OutboundQueueHandle::new(engine.queue(), engine.bus());
    let parser = FrameParserThread::spawn(Arc::clone(&port), engine.bus());
    let shutdown = engine.shutdown_token();

    let controller_thread = std::thread::spawn(move || engine.run());

    // A periodic "still running" heartbeat, the same shape as
    // `dxkb-split-link-tester`'s `transfer_file` status line gated on
    // `elapsed_since(last_transfer_status_msg)`, here ungated on any
    // in-flight transfer, just a liveness signal for the operator.
    std::thread::spawn(move || {
        let clock = SystemClock::new();
        let start = clock.current_instant();
        loop {
            std::thread::sleep(Duration::from_secs(30));
            dev_info!("engine has been running for {:?}", clock.elapsed_since(start));
        }
    });

    dev_info!("link engine running against {} at {} baud; type lines to send, Ctrl-D to quit", args.port, args.baud_rate);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        queue.push(line.as_bytes());
        queue.push(b"\n");
    }

    dev_info!("stdin closed, shutting down");
    shutdown.request_shutdown();
    let _ = controller_thread.join();

    // The parser thread has no cooperative cancellation path (it's
    // blocked in the port's own read-timeout loop reading from the
    // peer, not from our queue or bus), so it is abandoned here and
    // reaped by the OS when the process exits, same as the inbound
    // parser in `dxkb-split-link-tester`.
    drop(parser);

    Ok(())
}
