//! GUI notification hooks: callbacks invoked on observable protocol
//! events. Out of scope as a concrete UI, but the engine must call
//! *something* at the right points, so this is a trait seam, the same
//! shape as the `LogWriter` sink that `dxkb-split-link-tester` plugs
//! into `rustyline`'s `ExternalPrinter`.

pub trait GuiNotifier {
    fn on_sent(&self) {}
    fn on_received(&self) {}
    fn on_received_bad(&self) {}
    fn on_lost(&self) {}
}

/// The notifier used when the embedding application has no UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGui;

impl GuiNotifier for NullGui {}
