//! `SerialFrameWriter`, the concrete [`FrameWriter`] the protocol
//! engine writes through when running over a real serial link. The
//! reference inbound parser ([`crate::parser::FrameParserThread`])
//! reads from a clone of the same port handle on its own thread.

use std::sync::Arc;

use hdlink_common::dev_warn;
use hdlink_core::frame::FrameWriter;
use serial2::SerialPort;

#[derive(Clone)]
pub struct SerialFrameWriter {
    port: Arc<SerialPort>,
}

impl SerialFrameWriter {
    pub fn new(port: Arc<SerialPort>) -> Self {
        SerialFrameWriter { port }
    }
}

impl FrameWriter for SerialFrameWriter {
    /// A synchronous, blocking write of the whole frame: no partial
    /// writes propagate upward. A short write from the underlying port
    /// is retried until the full frame is out or the port reports an
    /// error, at which point this returns `false` and the Controller
    /// treats it as if the frame had vanished in transit.
    fn write_out(&mut self, buf: &[u8]) -> bool {
        let mut written = 0;
        while written < buf.len() {
            match self.port.write(&buf[written..]) {
                Ok(0) => {
                    dev_warn!("serial write returned 0 bytes with {} left", buf.len() - written);
                    return false;
                }
                Ok(n) => written += n,
                Err(e) => {
                    dev_warn!("serial write failed: {e}");
                    return false;
                }
            }
        }
        true
    }
}
