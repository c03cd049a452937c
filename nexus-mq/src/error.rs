//! Error types.
//!
//! Timeouts are not errors: an expired [`wait`](crate::MessageQueue::wait)
//! simply returns `None`. The types here cover allocation failure only.

use std::collections::TryReserveError;

use thiserror::Error;

/// Error returned by [`MessageQueue::post`](crate::MessageQueue::post).
///
/// Contains the payload that could not be queued so the caller keeps
/// ownership of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PostError<T> {
    /// No node could be allocated for the payload.
    ///
    /// The queue is unchanged.
    #[error("failed to allocate queue node")]
    Alloc(T),
}

impl<T> PostError<T> {
    /// Returns the payload that could not be queued.
    pub fn into_inner(self) -> T {
        match self {
            PostError::Alloc(v) => v,
        }
    }
}

/// Error returned by [`MessageQueue::try_with_config`](crate::MessageQueue::try_with_config).
#[derive(Debug, Error)]
pub enum CreateError {
    /// The initial node reservation could not be allocated.
    #[error("failed to reserve {capacity} queue nodes")]
    Reserve {
        /// Requested number of node slots.
        capacity: usize,
        /// Allocator failure.
        #[source]
        source: TryReserveError,
    },
}

/// Arena-level error: slot storage cannot take another value.
///
/// Raised when the backing allocation cannot grow or the node id space is
/// exhausted. Carries the rejected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("node storage exhausted")]
pub(crate) struct Full<T>(pub(crate) T);
