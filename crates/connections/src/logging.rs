//! Logging shims.
//!
//! With the `tracing` feature the macros are `tracing`'s own. Without it they
//! expand to nothing, so call sites stay unconditional.
//!
//! The no-op macros carry distinct names and are re-exported under the
//! `tracing` names; a local `macro_rules! warn` would clash with the builtin
//! `#[warn]` attribute.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use warn_noop as warn;
