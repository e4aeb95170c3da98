#![forbid(unsafe_code)]

//! Fixed-capacity signals.
//!
//! # Design
//!
//! [`Signal<'a, A, N>`] owns `N` [`Connection`] slots inline. Registration
//! scans for the lowest disconnected slot; bulk disconnection clears flags in
//! place. Nothing moves and nothing is allocated after construction.
//!
//! `'a` bounds every context and forwarding target registered on the signal,
//! so the borrow checker rejects registrations that would outlive their
//! context. Returned `&Connection`s borrow the signal itself, so none can be
//! used after the signal is dropped; no teardown pass is needed on drop.
//!
//! # Dispatch order
//!
//! [`fire`](Signal::fire) walks slots in ascending index order and reads
//! each slot when it reaches it. Mutations made by a callback during a pass
//! are therefore visible to the rest of that pass: a registration that lands
//! in a higher slot runs in the same pass, one that lands in a lower slot
//! waits for the next. A one-shot slot is cleared just before its callback
//! runs, so a re-entrant `fire` from inside that callback does not run it
//! again, and a registration the callback makes into the freed slot
//! survives the pass.
//!
//! # Failure Modes
//!
//! - **Full registry**: `connect`/`once`/`forward_to` return `None`
//!   (`try_*` variants return [`ConnectError::CapacityExhausted`]).
//! - **Forwarding cycle**: `a -> b -> a` recurses until the stack overflows.
//!   Cycles are not detected.

use core::any::Any;
use core::cell::Cell;
use core::fmt;

use crate::DEFAULT_MAX_CONNECTIONS;
use crate::connection::{Callback, Connection, Handler};
use crate::error::{ConnectError, Result};
use crate::logging::{debug, warn};

/// Anything that can be fired with arguments `A`.
///
/// Implemented by every [`Signal`] regardless of capacity, which is what
/// forwarding connections hold on to.
pub trait Fire<A> {
    /// Dispatch `args` to every live connection.
    fn fire(&self, args: A);
}

/// An owning, fixed-capacity registry of connections.
///
/// `A` is the argument type delivered to callbacks; use a tuple for several
/// arguments and `()` for none. `N` is the slot count.
///
/// # Invariants
///
/// 1. `connection_count() <= N`.
/// 2. Slot `i` is always `&connections[i]`; references never move.
/// 3. While suspended, `fire` has no side effects.
pub struct Signal<'a, A, const N: usize = DEFAULT_MAX_CONNECTIONS> {
    connections: [Connection<'a, A>; N],
    active: Cell<bool>,
}

impl<'a, A, const N: usize> Signal<'a, A, N> {
    /// Number of slots in this signal type.
    pub const CAPACITY: usize = N;

    /// Create an active signal with every slot disconnected.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connections: [const { Connection::vacant() }; N],
            active: Cell::new(true),
        }
    }

    /// Register `function` with `context` in the lowest free slot.
    ///
    /// Returns `None` when all `N` slots are connected.
    pub fn connect(
        &self,
        function: Callback<A>,
        context: &'a dyn Any,
    ) -> Option<&Connection<'a, A>> {
        self.claim(Handler::new(function, context), false)
    }

    /// Like [`connect`](Self::connect), but the connection disconnects
    /// itself right after its first invocation.
    pub fn once(
        &self,
        function: Callback<A>,
        context: &'a dyn Any,
    ) -> Option<&Connection<'a, A>> {
        self.claim(Handler::new(function, context), true)
    }

    /// Register a prebuilt handler.
    pub fn connect_handler(&self, handler: Handler<'a, A>) -> Option<&Connection<'a, A>> {
        self.claim(handler, false)
    }

    /// Register a prebuilt handler as a one-shot connection.
    pub fn once_handler(&self, handler: Handler<'a, A>) -> Option<&Connection<'a, A>> {
        self.claim(handler, true)
    }

    /// Relay every fire of this signal to `target`.
    ///
    /// The returned connection breaks the relay when disconnected.
    pub fn forward_to(&self, target: &'a (dyn Fire<A> + 'a)) -> Option<&Connection<'a, A>> {
        self.claim(Handler::forward(target), false)
    }

    /// [`connect`](Self::connect), reporting a full registry as an error.
    pub fn try_connect(
        &self,
        function: Callback<A>,
        context: &'a dyn Any,
    ) -> Result<&Connection<'a, A>> {
        self.connect(function, context).ok_or(Self::FULL)
    }

    /// [`once`](Self::once), reporting a full registry as an error.
    pub fn try_once(
        &self,
        function: Callback<A>,
        context: &'a dyn Any,
    ) -> Result<&Connection<'a, A>> {
        self.once(function, context).ok_or(Self::FULL)
    }

    /// [`forward_to`](Self::forward_to), reporting a full registry as an error.
    pub fn try_forward_to(&self, target: &'a (dyn Fire<A> + 'a)) -> Result<&Connection<'a, A>> {
        self.forward_to(target).ok_or(Self::FULL)
    }

    const FULL: ConnectError = ConnectError::CapacityExhausted { capacity: N };

    fn claim(&self, handler: Handler<'a, A>, once: bool) -> Option<&Connection<'a, A>> {
        let Some(index) = self.connections.iter().position(|c| !c.is_connected()) else {
            warn!(message = "connections.full", capacity = N);
            return None;
        };
        let connection = &self.connections[index];
        connection.occupy(handler, once);
        debug!(message = "connections.connect", slot = index, once);
        Some(connection)
    }

    /// Disconnect every live connection. Returns how many were live.
    pub fn disconnect_all(&self) -> usize {
        self.disconnect_where("all", |_| true)
    }

    /// Disconnect every connection whose callback is `function`.
    ///
    /// Functions are compared by address; forwarding connections never match.
    pub fn disconnect_by_callback(&self, function: Callback<A>) -> usize {
        self.disconnect_where("callback", |handler| handler.calls(function))
    }

    /// Disconnect every connection registered with `context`.
    ///
    /// Contexts are compared by address, so any `&T` works, including a
    /// signal used as a forwarding target.
    pub fn disconnect_by_context<T: ?Sized>(&self, context: &T) -> usize {
        self.disconnect_where("context", |handler| handler.has_context(context))
    }

    /// Disconnect every relay into `target`.
    pub fn disconnect_by_target(&self, target: &dyn Fire<A>) -> usize {
        self.disconnect_where("target", |handler| {
            matches!(handler, Handler::Forward(_)) && handler.has_context(target)
        })
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn disconnect_where(
        &self,
        kind: &'static str,
        predicate: impl Fn(&Handler<'a, A>) -> bool,
    ) -> usize {
        let mut count = 0;
        for connection in &self.connections {
            if connection.handler().is_some_and(|handler| predicate(&handler)) {
                connection.disconnect();
                count += 1;
            }
        }
        debug!(message = "connections.disconnect_bulk", kind, count);
        count
    }

    /// Stop dispatching. Registrations are kept.
    pub fn suspend(&self) {
        self.active.set(false);
    }

    /// Resume dispatching after [`suspend`](Self::suspend).
    pub fn resume(&self) {
        self.active.set(true);
    }

    /// Whether `fire` currently dispatches.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// The fixed slot count `N`.
    #[must_use]
    pub const fn max_connections(&self) -> usize {
        N
    }

    /// Number of live connections. Scans all slots.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.iter().count()
    }

    /// Whether no slot is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.iter().all(|c| !c.is_connected())
    }

    /// Whether every slot is connected; the next `connect` would fail.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.connections.iter().all(Connection::is_connected)
    }

    /// Live connections in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection<'a, A>> {
        self.connections.iter().filter(|c| c.is_connected())
    }

    /// Move the registrations out, leaving `self` suspended and empty.
    ///
    /// The returned signal keeps every slot at its original index and the
    /// original active flag.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let taken = core::mem::replace(self, Self::new());
        self.active.set(false);
        taken
    }
}

impl<A: Clone, const N: usize> Signal<'_, A, N> {
    /// Invoke every live connection with `args`, in slot order.
    ///
    /// No-op while suspended. Each callback receives its own clone of
    /// `args`. One-shot connections are disconnected as they are invoked,
    /// before the next slot is visited.
    pub fn fire(&self, args: A) {
        if !self.active.get() {
            return;
        }

        #[cfg(feature = "tracing")]
        {
            let span = tracing::trace_span!(
                "connections.fire",
                capacity = N,
                invoked = tracing::field::Empty
            );
            let _guard = span.enter();
            let invoked = self.dispatch(args);
            span.record("invoked", invoked);
        }
        #[cfg(not(feature = "tracing"))]
        self.dispatch(args);
    }

    fn dispatch(&self, args: A) -> usize {
        let mut invoked = 0;
        for connection in &self.connections {
            let Some(handler) = connection.handler() else {
                continue;
            };
            if connection.is_once() {
                connection.disconnect();
            }
            handler.invoke(args.clone());
            invoked += 1;
        }
        invoked
    }
}

impl<A: Clone, const N: usize> Fire<A> for Signal<'_, A, N> {
    fn fire(&self, args: A) {
        Signal::fire(self, args);
    }
}

impl<A, const N: usize> Default for Signal<'_, A, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, const N: usize> Clone for Signal<'_, A, N> {
    /// Deep copy: every slot, live or not, plus the active flag.
    fn clone(&self) -> Self {
        Self {
            connections: self.connections.clone(),
            active: self.active.clone(),
        }
    }
}

impl<A, const N: usize> fmt::Debug for Signal<'_, A, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("capacity", &N)
            .field("connected", &self.connection_count())
            .field("active", &self.active.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
