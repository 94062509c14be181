//! Introspection statistics for the broker

/// Snapshot of one queue's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of elements currently in the log.
    pub depth: usize,
    /// Maximum element count before appends fail.
    pub capacity: usize,
    /// Name of the established element type, if any element (or lazy
    /// access) has fixed one. Diagnostic only.
    pub element_type: Option<&'static str>,
}

/// Cursor lag statistics across one queue's consumers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LagStats {
    /// Number of consumers bound to the queue.
    pub total_consumers: usize,
    /// Maximum unread-element count among them.
    pub max_lag: usize,
    /// Minimum unread-element count among them.
    pub min_lag: usize,
    /// Average unread-element count.
    pub avg_lag: f64,
}
