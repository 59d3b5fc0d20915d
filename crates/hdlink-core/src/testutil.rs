//! Test-only fixtures shared between unit tests and the `tests/`
//! integration suite. Gated behind `test-support` so none of it ships
//! in a normal build.

use std::sync::{Arc, Mutex};

use crate::frame::FrameWriter;
use crate::gui::GuiNotifier;

#[derive(Default, Clone)]
pub struct RecordingWriter {
    pub frames: Arc<Mutex<Vec<Vec<u8>>>>,
    pub fail_next: Arc<Mutex<bool>>,
}

impl FrameWriter for RecordingWriter {
    fn write_out(&mut self, buf: &[u8]) -> bool {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return false;
        }
        drop(fail);
        self.frames.lock().unwrap().push(buf.to_vec());
        true
    }
}

#[derive(Default)]
struct GuiCounts {
    sent: u32,
    received: u32,
    received_bad: u32,
    lost: u32,
}

#[derive(Default, Clone)]
pub struct RecordingGui {
    counts: Arc<Mutex<GuiCounts>>,
}

impl GuiNotifier for RecordingGui {
    fn on_sent(&self) {
        self.counts.lock().unwrap().sent += 1;
    }
    fn on_received(&self) {
        self.counts.lock().unwrap().received += 1;
    }
    fn on_received_bad(&self) {
        self.counts.lock().unwrap().received_bad += 1;
    }
    fn on_lost(&self) {
        self.counts.lock().unwrap().lost += 1;
    }
}

impl RecordingGui {
    pub fn sent(&self) -> u32 {
        self.counts.lock().unwrap().sent
    }
    pub fn received(&self) -> u32 {
        self.counts.lock().unwrap().received
    }
    pub fn received_bad(&self) -> u32 {
        self.counts.lock().unwrap().received_bad
    }
    pub fn lost(&self) -> u32 {
        self.counts.lock().unwrap().lost
    }
}
