#![forbid(unsafe_code)]

//! RAII ownership of a connection's lifetime.
//!
//! [`ScopedConnection`] does not own a connection's storage (the signal
//! does); it owns the *duty to disconnect*. Dropping the guard, on any exit
//! path including unwinding, disconnects the target if it is still live.
//!
//! # Invariants
//!
//! 1. At most one guard is responsible for a registration: the type is
//!    move-only.
//! 2. A guard only ever disconnects the registration it adopted. If the
//!    target was disconnected and its slot reused, the guard leaves the new
//!    registration alone.
//! 3. After [`release`](ScopedConnection::release) the guard is empty and
//!    its drop does nothing.

use core::fmt;

use crate::connection::Connection;

/// Disconnects its target connection when dropped.
///
/// ```
/// use core::any::Any;
/// use connections::{ScopedConnection, Signal};
///
/// fn noop(_: &dyn Any, _: u8) {}
///
/// let signal: Signal<'_, u8, 2> = Signal::new();
/// {
///     let _guard = ScopedConnection::new(signal.connect(noop, &()).unwrap());
///     assert_eq!(signal.connection_count(), 1);
/// }
/// assert_eq!(signal.connection_count(), 0);
/// ```
#[must_use = "dropping a ScopedConnection immediately disconnects it"]
pub struct ScopedConnection<'s, 'a, A> {
    target: Option<(&'s Connection<'a, A>, u32)>,
}

impl<'s, 'a, A> ScopedConnection<'s, 'a, A> {
    /// Take responsibility for disconnecting `connection`.
    pub fn new(connection: &'s Connection<'a, A>) -> Self {
        Self {
            target: Some((connection, connection.generation())),
        }
    }

    /// A guard that manages nothing.
    pub const fn empty() -> Self {
        Self { target: None }
    }

    /// Whether the guard currently manages a connection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
    }

    /// The managed connection, if any.
    #[must_use]
    pub fn get(&self) -> Option<&'s Connection<'a, A>> {
        self.target.map(|(connection, _)| connection)
    }

    /// Give up responsibility without disconnecting.
    ///
    /// The caller is responsible for the returned connection from now on.
    pub fn release(&mut self) -> Option<&'s Connection<'a, A>> {
        self.target.take().map(|(connection, _)| connection)
    }

    /// Disconnect the managed connection now and become empty.
    pub fn disconnect(&mut self) {
        if let Some((connection, generation)) = self.target.take() {
            connection.disconnect_if_current(generation);
        }
    }

    /// Disconnect the current target (if any) and adopt `connection`.
    ///
    /// Replacing the target with the very registration already held is a
    /// no-op: it stays connected and managed.
    pub fn replace(&mut self, connection: &'s Connection<'a, A>) {
        let generation = connection.generation();
        if let Some((current, held)) = self.target
            && core::ptr::eq(current, connection)
            && held == generation
        {
            return;
        }
        self.disconnect();
        self.target = Some((connection, generation));
    }
}

impl<'s, 'a, A> From<&'s Connection<'a, A>> for ScopedConnection<'s, 'a, A> {
    fn from(connection: &'s Connection<'a, A>) -> Self {
        Self::new(connection)
    }
}

impl<A> Default for ScopedConnection<'_, '_, A> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A> Drop for ScopedConnection<'_, '_, A> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<A> fmt::Debug for ScopedConnection<'_, '_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("target", &self.get())
            .finish()
    }
}

impl<'a, A> Connection<'a, A> {
    /// Wrap this connection in a [`ScopedConnection`].
    pub fn scoped(&self) -> ScopedConnection<'_, 'a, A> {
        ScopedConnection::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;
    use core::any::Any;
    use core::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn count(ctx: &dyn Any, _: u32) {
        let hits = ctx.downcast_ref::<Cell<u32>>().expect("counter context");
        hits.set(hits.get() + 1);
    }

    #[test]
    fn drop_disconnects_live_target() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, u32, 4> = Signal::new();
        {
            let guard = ScopedConnection::new(signal.connect(count, &hits).expect("slot"));
            assert!(!guard.is_empty());
            signal.fire(1);
        }
        signal.fire(2);
        assert_eq!(hits.get(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn empty_guard_does_nothing() {
        let guard: ScopedConnection<'_, '_, u32> = ScopedConnection::default();
        assert!(guard.is_empty());
        assert!(guard.get().is_none());
    }

    #[test]
    fn release_hands_back_responsibility() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, u32, 4> = Signal::new();
        let connection = {
            let mut guard = signal.connect(count, &hits).expect("slot").scoped();
            let released = guard.release().expect("held");
            assert!(guard.is_empty());
            released
        };
        assert!(connection.is_connected());
        signal.fire(0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn move_transfers_responsibility() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, u32, 4> = Signal::new();
        let outer;
        {
            let inner = ScopedConnection::from(signal.connect(count, &hits).expect("slot"));
            outer = inner;
        }
        assert_eq!(signal.connection_count(), 1);
        drop(outer);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn replace_disconnects_previous_target() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, u32, 4> = Signal::new();
        let first = signal.connect(count, &hits).expect("slot");
        let second = signal.connect(count, &hits).expect("slot");

        let mut guard = first.scoped();
        guard.replace(second);
        assert!(!first.is_connected());
        assert!(second.is_connected());

        guard.disconnect();
        assert!(guard.is_empty());
        assert!(!second.is_connected());
    }

    #[test]
    fn replace_with_held_registration_keeps_it() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, u32, 4> = Signal::new();
        let connection = signal.connect(count, &hits).expect("slot");

        let mut guard = connection.scoped();
        guard.replace(connection);
        assert!(connection.is_connected());
        assert!(guard.get().is_some_and(|held| core::ptr::eq(held, connection)));

        signal.fire(1);
        assert_eq!(hits.get(), 1);
        drop(guard);
        assert!(!connection.is_connected());
    }

    #[test]
    fn drop_spares_reused_slot() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, u32, 1> = Signal::new();
        let guard = signal.connect(count, &hits).expect("slot").scoped();

        signal.disconnect_all();
        let newer = signal.connect(count, &hits).expect("slot reused");
        drop(guard);

        assert!(newer.is_connected());
        signal.fire(0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unwinding_disconnects() {
        let hits = Cell::new(0u32);
        let signal: Signal<'_, u32, 4> = Signal::new();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = signal.connect(count, &hits).expect("slot").scoped();
            panic!("unwind through the guard");
        }));

        assert!(result.is_err());
        assert!(signal.is_empty());
    }
}
