//! Ambient, host-independent bits shared between the protocol engine and
//! the CLI demo: a testable clock abstraction and a thin logging layer.

pub mod logging;
pub mod time;

pub use log as __log;
