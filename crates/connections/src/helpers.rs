#![forbid(unsafe_code)]

//! Free-function forms of the registration API.
//!
//! Each function delegates to the matching method and has no behavior of its
//! own. They read naturally when copying a registration from one signal to
//! another:
//!
//! ```
//! use core::any::Any;
//! use core::cell::Cell;
//! use connections::{Signal, connect};
//!
//! fn tick(ctx: &dyn Any, (): ()) {
//!     let ticks = ctx.downcast_ref::<Cell<u32>>().unwrap();
//!     ticks.set(ticks.get() + 1);
//! }
//!
//! let ticks = Cell::new(0u32);
//! let primary: Signal<'_, (), 4> = Signal::new();
//! let mirror: Signal<'_, (), 4> = Signal::new();
//!
//! let original = primary.connect(tick, &ticks).unwrap();
//! connect(original.handler().unwrap(), &mirror).unwrap();
//!
//! primary.fire(());
//! mirror.fire(());
//! assert_eq!(ticks.get(), 2);
//! ```

use crate::connection::{Connection, Handler};
use crate::signal::Signal;

/// Register `handler` on `signal`. See [`Signal::connect_handler`].
pub fn connect<'s, 'a, A, const N: usize>(
    handler: Handler<'a, A>,
    signal: &'s Signal<'a, A, N>,
) -> Option<&'s Connection<'a, A>> {
    signal.connect_handler(handler)
}

/// Register `handler` on `signal` as a one-shot connection.
/// See [`Signal::once_handler`].
pub fn connect_once<'s, 'a, A, const N: usize>(
    handler: Handler<'a, A>,
    signal: &'s Signal<'a, A, N>,
) -> Option<&'s Connection<'a, A>> {
    signal.once_handler(handler)
}

/// Relay every fire of `from` into `to`. See [`Signal::forward_to`].
pub fn forward_to<'s, 'a, 'b: 'a, A: Clone + 'a, const N: usize, const M: usize>(
    from: &'s Signal<'a, A, N>,
    to: &'a Signal<'b, A, M>,
) -> Option<&'s Connection<'a, A>> {
    from.forward_to(to)
}

/// Disconnect `connection`. See [`Connection::disconnect`].
pub fn disconnect<A>(connection: &Connection<'_, A>) {
    connection.disconnect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::any::Any;
    use core::cell::Cell;

    fn count(ctx: &dyn Any, _: i64) {
        let hits = ctx.downcast_ref::<Cell<u32>>().expect("counter context");
        hits.set(hits.get() + 1);
    }

    #[test]
    fn connect_and_disconnect_delegate() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, i64, 2> = Signal::new();
        let connection = connect(Handler::new(count, &hits), &signal).expect("slot");
        assert!(!connection.is_once());

        signal.fire(-1);
        disconnect(connection);
        disconnect(connection);
        signal.fire(-2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn connect_once_delegates() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, i64, 2> = Signal::new();
        let connection = connect_once(Handler::new(count, &hits), &signal).expect("slot");
        assert!(connection.is_once());

        signal.fire(0);
        signal.fire(0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn forward_to_chains_three_signals() {
        let hits = Cell::new(0u32);
        let last: Signal<'_, i64, 2> = Signal::new();
        last.connect(count, &hits);
        let middle: Signal<'_, i64, 2> = Signal::new();
        let first: Signal<'_, i64, 2> = Signal::new();

        forward_to(&middle, &last).expect("slot");
        forward_to(&first, &middle).expect("slot");

        first.fire(5);
        middle.fire(5);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn full_signal_rejects_free_connect() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, i64, 1> = Signal::new();
        assert!(connect(Handler::new(count, &hits), &signal).is_some());
        assert!(connect_once(Handler::new(count, &hits), &signal).is_none());
    }
}
