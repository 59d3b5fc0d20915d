//! The core protocol engine of a half-duplex, byte-oriented,
//! bidirectional link protocol: line arbitration, piggybacked
//! ACK/NAK data exchange with bounded retry, and EOT-based teardown.
//!
//! The byte transport, the inbound frame parser, the CRC function and
//! any GUI are external collaborators, consumed here only through the
//! [`frame::FrameWriter`], [`crc::CrcProvider`], [`bus::EventBus`] and
//! [`gui::GuiNotifier`] trait seams. See `hdlink-cli` for a runnable
//! reference implementation of all four over a real serial port.

pub mod bus;
pub mod checksum;
pub mod constants;
pub mod controller;
pub mod engine;
pub mod frame;
pub mod gui;
pub mod queue;
#[cfg(any(test, feature = "test-support"))]
pub mod testutil;
pub mod timings;
pub mod transmitter;

pub use bus::{EventBus, Signal};
pub use controller::{ActiveExit, Controller};
#[cfg(any(test, feature = "test-support"))]
pub use controller::IdleOutcomeForTest;
pub use checksum::{Crc16XModem, CrcProvider};
pub use engine::{Engine, ShutdownToken};
pub use frame::{ControlFrame, DataFrame, FrameWriter, Sot};
pub use gui::{GuiNotifier, NullGui};
pub use queue::OutboundQueue;
pub use timings::{DefaultTimings, EngineTimings};
