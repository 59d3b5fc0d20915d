//! Thin wrappers over the `log` facade.
//!
//! Kept as macros (rather than calling `log::info!` directly from every
//! crate) so the handful of call sites that care about engine-internal
//! chatter can be grepped for and, if this ever needs to run on a
//! resource constrained target again, gated behind a feature without
//! touching call sites.

#[macro_export]
macro_rules! dev_error {
    ($($arg:tt)*) => {
        $crate::__log::error!($($arg)*);
    }
}

#[macro_export]
macro_rules! dev_warn {
    ($($arg:tt)*) => {
        $crate::__log::warn!($($arg)*);
    }
}

#[macro_export]
macro_rules! dev_info {
    ($($arg:tt)*) => {
        $crate::__log::info!($($arg)*);
    }
}

#[macro_export]
macro_rules! dev_debug {
    ($($arg:tt)*) => {
        $crate::__log::debug!($($arg)*);
    }
}

#[macro_export]
macro_rules! dev_trace {
    ($($arg:tt)*) => {
        $crate::__log::trace!($($arg)*);
    }
}
