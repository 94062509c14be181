//! Broker error types
//!
//! Every negative outcome of a produce, consume or admin call is one of the
//! codes below. All of them are recoverable, expected conditions returned
//! through the normal result channel; the broker never panics on user input.

use crate::ConsumerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// The handle was never registered or has already been unregistered.
    #[error("consumer not found: {consumer_id}")]
    ConsumerNotFound { consumer_id: ConsumerId },

    /// A blocking read exceeded its deadline; the cursor is unchanged.
    #[error("blocking read timed out")]
    TimeoutExpired,

    /// A non-blocking read found nothing past the cursor. Expected during
    /// polling, not an exceptional condition.
    #[error("no data available past the cursor")]
    NoDataAvailable,

    /// The declared element type disagrees with the queue's established type.
    /// The queue is left untouched.
    #[error("type mismatch: queue holds {stored}, caller declared {declared}")]
    TypeMismatch {
        declared: &'static str,
        stored: &'static str,
    },

    /// Capacity reached. No automatic retry and no drop-oldest policy; the
    /// producer decides what to do.
    #[error("queue is full (capacity: {capacity})")]
    QueueFull { capacity: usize },
}

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;
