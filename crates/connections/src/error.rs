//! Error type for the `try_*` registration variants.
//!
//! The primary registration API signals a full registry with `None`. The
//! `try_*` variants wrap the same outcome in [`ConnectError`] so callers can
//! propagate it with `?`.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, ConnectError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("signal is at capacity ({capacity} connections)")]
    CapacityExhausted { capacity: usize },
}

impl ConnectError {
    /// Capacity of the signal that rejected the registration.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        match self {
            Self::CapacityExhausted { capacity } => *capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn display_names_capacity() {
        let err = ConnectError::CapacityExhausted { capacity: 2 };
        assert_eq!(err.to_string(), "signal is at capacity (2 connections)");
        assert_eq!(err.capacity(), 2);
    }
}
