#![no_std]
#![forbid(unsafe_code)]

//! Fixed-capacity signal/slot dispatch.
//!
//! This crate provides an observer primitive for environments where heap
//! allocation is unwanted and iteration order must be deterministic:
//!
//! - [`Signal`]: an owning registry of `N` connection slots that fires its
//!   live connections in slot order.
//! - [`Connection`]: one slot record (callback, context, one-shot flag).
//! - [`ScopedConnection`]: RAII guard that disconnects its target on drop.
//!
//! # Architecture
//!
//! Storage is an inline `[Connection; N]` array. Registration claims the
//! lowest free slot; disconnection clears a flag and never compacts, so the
//! `&Connection` returned by [`Signal::connect`] stays valid (and in place)
//! for as long as the signal is borrowed. All state lives in `Cell`s, which
//! lets every operation take `&self` and keeps the types `!Sync`.
//!
//! Contexts are `&dyn Any`: callbacks receive the context they were
//! registered with and downcast it themselves. Forwarding connections hold a
//! `&dyn Fire<A>` instead and re-fire the target signal.
//!
//! # Invariants
//!
//! 1. At most `N` slots are connected at any time.
//! 2. A slot's address never changes while the signal is alive.
//! 3. `fire` visits slots in ascending index order.
//! 4. A one-shot connection runs at most once per registration.
//! 5. Disconnecting an already-disconnected slot is a no-op.
//!
//! # Example
//!
//! ```
//! use core::any::Any;
//! use core::cell::Cell;
//! use connections::Signal;
//!
//! fn add(ctx: &dyn Any, value: u32) {
//!     if let Some(total) = ctx.downcast_ref::<Cell<u32>>() {
//!         total.set(total.get() + value);
//!     }
//! }
//!
//! let total = Cell::new(0u32);
//! let signal: Signal<'_, u32, 4> = Signal::new();
//! let connection = signal.connect(add, &total).expect("free slot");
//!
//! signal.fire(2);
//! signal.fire(3);
//! assert_eq!(total.get(), 5);
//!
//! connection.disconnect();
//! signal.fire(10);
//! assert_eq!(total.get(), 5);
//! ```

#[cfg(test)]
extern crate std;

pub mod connection;
pub mod error;
pub mod helpers;
mod logging;
pub mod scoped;
pub mod signal;

pub use connection::{Callback, Connection, Handler};
pub use error::{ConnectError, Result};
pub use helpers::{connect, connect_once, disconnect, forward_to};
pub use scoped::ScopedConnection;
pub use signal::{Fire, Signal};

/// Slot count used when a [`Signal`] is declared without an explicit capacity.
pub const DEFAULT_MAX_CONNECTIONS: usize = 128;
