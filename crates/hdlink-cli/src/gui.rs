//! `LoggingGui`, the demo's stand-in for a real status display: rather
//! than painting a status light, it logs each observable event through
//! the `log` facade.

use hdlink_common::{dev_info, dev_warn};
use hdlink_core::gui::GuiNotifier;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingGui;

impl GuiNotifier for LoggingGui {
    fn on_sent(&self) {
        dev_info!("sent");
    }

    fn on_received(&self) {
        dev_info!("received");
    }

    fn on_received_bad(&self) {
        dev_warn!("received (bad CRC)");
    }

    fn on_lost(&self) {
        dev_warn!("lost (reply timeout)");
    }
}
