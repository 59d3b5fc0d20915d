//! Tunable timing constants, abstracted behind a trait so tests can
//! substitute compressed durations without touching engine logic, the
//! same pattern `dxkb-split-link` uses for `SplitLinkTimings`.

use std::time::Duration;

pub trait EngineTimings {
    /// Bound on the arbitration ENQ wait and each Active reply wait.
    const TIMEOUT: Duration;

    /// Short inspection window used to detect an ENQ collision and to
    /// check for a piggybacked data frame after a reply.
    const SHORT_WINDOW: Duration = Duration::from_millis(10);

    /// Consecutive reply timeouts before Active gives up fatally.
    const MAX_TIMEOUTS: u32 = 5;
}

/// The timings used by `hdlink-cli` against a real serial link.
pub struct DefaultTimings;

impl EngineTimings for DefaultTimings {
    const TIMEOUT: Duration = Duration::from_millis(500);
}

/// Compressed timings used by the integration tests so a full Active
/// exchange doesn't cost wall-clock seconds.
#[cfg(any(test, feature = "test-support"))]
pub struct TestTimings;

#[cfg(any(test, feature = "test-support"))]
impl EngineTimings for TestTimings {
    const TIMEOUT: Duration = Duration::from_millis(30);
    const SHORT_WINDOW: Duration = Duration::from_millis(5);
}
