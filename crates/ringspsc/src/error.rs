use std::collections::TryReserveError;
use std::fmt;
use thiserror::Error;

/// Errors raised while constructing a heap-backed queue.
///
/// Full and empty queues are not errors: `push` reports `false` and `pop`
/// reports `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// `requested + 1` slots cannot be laid out in memory.
    #[error("capacity {requested} overflows the addressable slot count")]
    CapacityOverflow {
        /// The usable capacity that was asked for.
        requested: usize,
    },
    /// The allocator refused the slot buffer.
    #[error("failed to allocate {slots} ring slots")]
    Alloc {
        /// Physical slot count (usable capacity + 1).
        slots: usize,
        /// Reason reported by the allocator.
        #[source]
        source: TryReserveError,
    },
}

/// Result alias for queue construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Returned by [`Producer::try_push`](crate::Producer::try_push) when the
/// queue is full. Hands the rejected value back to the caller.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct PushError<T>(pub T);

impl<T> PushError<T> {
    /// Recovers the value that could not be pushed.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PushError(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_error_debug_without_debug_bound() {
        struct Opaque;
        let err = PushError(Opaque);
        assert_eq!(format!("{:?}", err), "PushError(..)");
        assert_eq!(err.to_string(), "queue is full");
    }

    #[test]
    fn test_capacity_overflow_message() {
        let err = Error::CapacityOverflow { requested: usize::MAX };
        assert!(err.to_string().contains("overflows"));
    }
}
