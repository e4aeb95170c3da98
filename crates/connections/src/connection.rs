#![forbid(unsafe_code)]

//! Connection slots and the handlers they carry.
//!
//! A [`Connection`] is one slot in a [`Signal`](crate::Signal)'s inline
//! storage. It is never allocated or freed on its own: registration flips
//! it to connected and stores a [`Handler`], disconnection flips it back.
//! The handler and context left behind in a disconnected slot are ignored.
//!
//! # Generations
//!
//! Every registration bumps the slot's generation counter. A holder that
//! remembers the generation it saw can tell whether the slot has since been
//! reused by someone else; [`ScopedConnection`](crate::ScopedConnection) and
//! one-shot dispatch rely on this so they never tear down a newer
//! registration that landed in the same slot.

use core::any::Any;
use core::cell::Cell;
use core::fmt;

use crate::signal::Fire;

/// Callback signature: the registration's context, then the fired arguments.
pub type Callback<A> = fn(&dyn Any, A);

bitflags::bitflags! {
    /// Per-slot state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct SlotFlags: u8 {
        const CONNECTED = 0b0000_0001;
        const ONCE      = 0b0000_0010;
    }
}

/// What a connection does when its signal fires.
///
/// A `Handler` is a plain `Copy` descriptor. It can be read back from a live
/// connection with [`Connection::handler`] and registered again on another
/// signal.
pub enum Handler<'a, A> {
    /// Call `function` with `context` and the fired arguments.
    Callback {
        function: Callback<A>,
        context: &'a dyn Any,
    },
    /// Re-fire another signal with the same arguments.
    Forward(&'a (dyn Fire<A> + 'a)),
}

impl<'a, A> Handler<'a, A> {
    /// Build a callback handler.
    #[must_use]
    pub fn new(function: Callback<A>, context: &'a dyn Any) -> Self {
        Self::Callback { function, context }
    }

    /// Build a forwarding handler targeting `target`.
    #[must_use]
    pub fn forward(target: &'a (dyn Fire<A> + 'a)) -> Self {
        Self::Forward(target)
    }

    /// Run the handler once.
    pub fn invoke(&self, args: A) {
        match *self {
            Self::Callback { function, context } => function(context, args),
            Self::Forward(target) => target.fire(args),
        }
    }

    /// Whether this handler calls `function`.
    #[must_use]
    pub fn calls(&self, function: Callback<A>) -> bool {
        match *self {
            Self::Callback { function: f, .. } => core::ptr::fn_addr_eq(f, function),
            Self::Forward(_) => false,
        }
    }

    /// Whether this handler's context (or forwarding target) is `context`.
    ///
    /// Comparison is by address only. Zero-sized contexts share a dangling
    /// address and therefore all compare equal.
    #[must_use]
    pub fn has_context<T: ?Sized>(&self, context: &T) -> bool {
        let context: *const T = context;
        match *self {
            Self::Callback { context: c, .. } => {
                core::ptr::addr_eq(core::ptr::from_ref(c), context)
            }
            Self::Forward(target) => core::ptr::addr_eq(core::ptr::from_ref(target), context),
        }
    }
}

impl<A> Clone for Handler<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Handler<'_, A> {}

impl<A> fmt::Debug for Handler<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Callback { function, context } => f
                .debug_struct("Callback")
                .field("function", &(function as *const ()))
                .field("context", &core::ptr::from_ref(context).cast::<()>())
                .finish(),
            Self::Forward(target) => f
                .debug_tuple("Forward")
                .field(&core::ptr::from_ref(target).cast::<()>())
                .finish(),
        }
    }
}

/// One registration slot inside a [`Signal`](crate::Signal).
///
/// References to a `Connection` are handed out by the signal's registration
/// methods and borrow the signal, so they cannot outlive it.
pub struct Connection<'a, A> {
    flags: Cell<SlotFlags>,
    handler: Cell<Option<Handler<'a, A>>>,
    generation: Cell<u32>,
}

impl<'a, A> Connection<'a, A> {
    /// An unregistered slot.
    pub(crate) const fn vacant() -> Self {
        Self {
            flags: Cell::new(SlotFlags::empty()),
            handler: Cell::new(None),
            generation: Cell::new(0),
        }
    }

    /// Claim this slot for `handler`.
    pub(crate) fn occupy(&self, handler: Handler<'a, A>, once: bool) {
        let mut flags = SlotFlags::CONNECTED;
        flags.set(SlotFlags::ONCE, once);
        self.handler.set(Some(handler));
        self.generation.set(self.generation.get().wrapping_add(1));
        self.flags.set(flags);
    }

    /// Disconnect only if the slot still holds registration `generation`.
    pub(crate) fn disconnect_if_current(&self, generation: u32) -> bool {
        if self.is_connected() && self.generation.get() == generation {
            self.disconnect();
            return true;
        }
        false
    }

    /// Mark this connection inactive. Idempotent.
    pub fn disconnect(&self) {
        self.flags.set(self.flags.get() - SlotFlags::CONNECTED);
    }

    /// Whether this slot holds a live registration.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.flags.get().contains(SlotFlags::CONNECTED)
    }

    /// Whether the registration disconnects itself after its first call.
    ///
    /// Meaningless once the slot is disconnected.
    #[must_use]
    pub fn is_once(&self) -> bool {
        self.flags.get().contains(SlotFlags::ONCE)
    }

    /// The live registration's handler, or `None` if disconnected.
    #[must_use]
    pub fn handler(&self) -> Option<Handler<'a, A>> {
        if self.is_connected() {
            self.handler.get()
        } else {
            None
        }
    }

    /// Registration counter for this slot; bumped every time it is claimed.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation.get()
    }
}

impl<A> Clone for Connection<'_, A> {
    fn clone(&self) -> Self {
        Self {
            flags: self.flags.clone(),
            handler: self.handler.clone(),
            generation: self.generation.clone(),
        }
    }
}

impl<A> fmt::Debug for Connection<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .field("once", &self.is_once())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    fn bump(ctx: &dyn Any, by: u32) {
        if let Some(total) = ctx.downcast_ref::<Cell<u32>>() {
            total.set(total.get() + by);
        }
    }

    fn reset(ctx: &dyn Any, _: u32) {
        if let Some(total) = ctx.downcast_ref::<Cell<u32>>() {
            total.set(0);
        }
    }

    #[test]
    fn vacant_slot_is_disconnected() {
        let slot: Connection<'_, u32> = Connection::vacant();
        assert!(!slot.is_connected());
        assert!(slot.handler().is_none());
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn occupy_sets_flags_and_bumps_generation() {
        let total = Cell::new(0u32);
        let slot = Connection::vacant();
        slot.occupy(Handler::new(bump, &total), true);

        assert!(slot.is_connected());
        assert!(slot.is_once());
        assert_eq!(slot.generation(), 1);

        slot.occupy(Handler::new(bump, &total), false);
        assert!(!slot.is_once());
        assert_eq!(slot.generation(), 2);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let total = Cell::new(0u32);
        let slot = Connection::vacant();
        slot.occupy(Handler::new(bump, &total), false);

        slot.disconnect();
        assert!(!slot.is_connected());
        slot.disconnect();
        assert!(!slot.is_connected());
        assert!(slot.handler().is_none());
    }

    #[test]
    fn disconnect_if_current_ignores_stale_generation() {
        let total = Cell::new(0u32);
        let slot = Connection::vacant();
        slot.occupy(Handler::new(bump, &total), false);
        let stale = slot.generation();
        slot.disconnect();
        slot.occupy(Handler::new(bump, &total), false);

        assert!(!slot.disconnect_if_current(stale));
        assert!(slot.is_connected());
        assert!(slot.disconnect_if_current(slot.generation()));
        assert!(!slot.is_connected());
    }

    #[test]
    fn handler_invokes_with_context() {
        let total = Cell::new(1u32);
        let handler = Handler::new(bump, &total);
        handler.invoke(4);
        handler.invoke(5);
        assert_eq!(total.get(), 10);
    }

    #[test]
    fn handler_identity_checks() {
        let a = Cell::new(0u32);
        let b = Cell::new(0u32);
        let handler = Handler::new(bump, &a);

        assert!(handler.calls(bump));
        assert!(!handler.calls(reset));
        assert!(handler.has_context(&a));
        assert!(!handler.has_context(&b));
    }

    #[test]
    fn debug_format() {
        let slot: Connection<'_, u32> = Connection::vacant();
        let dbg = format!("{slot:?}");
        assert!(dbg.contains("Connection"));
        assert!(dbg.contains("connected: false"));
    }
}
