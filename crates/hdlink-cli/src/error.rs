//! The exceptional, non-retryable failures a host program must
//! surface to an operator. These never appear inside `hdlink-core`,
//! whose own failures reduce to a retry, a piggyback NAK, or one of
//! the three `Active` exit codes.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to open serial port {port}: {source}")]
    SerialOpen { port: String, #[source] source: io::Error },

    #[error("failed to configure serial port {port}: {source}")]
    SerialConfigure { port: String, #[source] source: io::Error },
}
