//! Broker facade
//!
//! The single entry point coordinating produce/consume with type checking
//! and per-consumer error recording. The broker owns the queue table and
//! the consumer registry for its lifetime; construct one per application
//! scope and pass it explicitly.
//!
//! # Locking discipline
//!
//! The queue table lock is held only transiently to resolve or lazily
//! create a queue's entry; the `Arc` handle is cloned out and the table
//! lock released before the queue's own mutex is taken. Unrelated queues
//! therefore never serialize on one slow consumer, and the only lock held
//! across a blocking wait is the target queue's own (released internally
//! by the condition variable while suspended).

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};

use crate::consumer::Consumer;
use crate::error::{BrokerError, BrokerResult};
use crate::queue::{ReplayQueue, Wait};
use crate::registry::ConsumerRegistry;
use crate::stats::{LagStats, QueueStats};
use crate::sync_map::SyncMap;
use crate::typed::TypedConsumer;
use crate::value::{ErasedValue, TypeTag};
use crate::{ConsumerId, QueueId, DEFAULT_QUEUE_CAPACITY};

/// Thread-safe multi-queue data broker.
///
/// Producers push values of a runtime-determined type into integer-keyed
/// queues; registered consumers replay each queue independently through
/// their own cursor. Queues come into existence lazily on first
/// produce/consume/admin access. Fully thread-safe: share it across
/// threads as `Arc<Broker>`.
///
/// # Example
///
/// ```
/// use replayq::Broker;
///
/// let broker = Broker::new();
/// let consumer = broker.register_consumer(1).expect("handle space exhausted");
///
/// broker.produce(1, 42_i32).unwrap();
/// broker.produce(1, 43_i32).unwrap();
///
/// assert_eq!(broker.consume::<i32>(consumer), Some(42));
/// assert_eq!(broker.consume::<i32>(consumer), Some(43));
/// assert_eq!(broker.consume::<i32>(consumer), None);
/// ```
#[derive(Debug)]
pub struct Broker {
    queues: SyncMap<QueueId, Arc<ReplayQueue>>,
    consumers: ConsumerRegistry,
    default_capacity: usize,
}

impl Broker {
    pub fn new() -> Self {
        Self::with_default_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// A broker whose lazily-created queues start with `capacity` instead
    /// of [`DEFAULT_QUEUE_CAPACITY`].
    pub fn with_default_capacity(capacity: usize) -> Self {
        Self {
            queues: SyncMap::new(),
            consumers: ConsumerRegistry::new(),
            default_capacity: capacity,
        }
    }

    /// Resolve the queue entry, creating it lazily. The table lock is
    /// released once the `Arc` is cloned out.
    fn queue_entry(&self, queue_id: QueueId) -> Arc<ReplayQueue> {
        self.queues.get_or_insert_with(queue_id, || {
            debug!(
                "queue {queue_id} created (capacity {})",
                self.default_capacity
            );
            Arc::new(ReplayQueue::new(self.default_capacity))
        })
    }

    /// Append `value` to `queue_id`, creating the queue on first use.
    ///
    /// Fails with `TypeMismatch` if the queue already holds elements of a
    /// different type (queue untouched) or `QueueFull` at capacity. Wakes
    /// all blocked consumers of the queue on success.
    pub fn produce<T: Send + Sync + 'static>(
        &self,
        queue_id: QueueId,
        value: T,
    ) -> BrokerResult<()> {
        let queue = self.queue_entry(queue_id);
        queue.append(TypeTag::of::<T>(), ErasedValue::new(value))
    }

    /// Non-blocking read of the next element past the consumer's cursor.
    ///
    /// Returns `None` when nothing is available (or on any failure) and
    /// advances the cursor only on success. The reason for a `None` is
    /// recorded and retrievable via [`last_error`](Self::last_error).
    pub fn consume<T: Clone + Send + Sync + 'static>(&self, consumer_id: ConsumerId) -> Option<T> {
        self.consume_with(consumer_id, Wait::None)
    }

    /// Blocking variant of [`consume`](Self::consume): suspends the caller
    /// on the target queue's condition until data exists past the cursor
    /// or `timeout` elapses. `None` as timeout is the explicit opt-in to
    /// an unbounded wait. On timeout the cursor is unchanged and
    /// `TimeoutExpired` is recorded.
    pub fn consume_blocking<T: Clone + Send + Sync + 'static>(
        &self,
        consumer_id: ConsumerId,
        timeout: Option<Duration>,
    ) -> Option<T> {
        let wait = match timeout {
            Some(limit) => Wait::Timeout(limit),
            None => Wait::Forever,
        };
        self.consume_with(consumer_id, wait)
    }

    fn consume_with<T: Clone + Send + Sync + 'static>(
        &self,
        consumer_id: ConsumerId,
        wait: Wait,
    ) -> Option<T> {
        match self.try_consume(consumer_id, wait) {
            Ok(value) => {
                self.consumers.set_last_error(consumer_id, None);
                Some(value)
            }
            Err(error) => {
                trace!("consume for consumer {consumer_id} failed: {error}");
                self.consumers.set_last_error(consumer_id, Some(error));
                None
            }
        }
    }

    fn try_consume<T: Clone + Send + Sync + 'static>(
        &self,
        consumer_id: ConsumerId,
        wait: Wait,
    ) -> BrokerResult<T> {
        let state = self.consumers.snapshot(consumer_id)?;
        let queue = self.queue_entry(state.queue_id);
        let element = queue.read_at(state.cursor, TypeTag::of::<T>(), wait)?;
        // The tag check inside read_at makes a failed extract unreachable,
        // but a contract violation here must not panic the caller.
        let value = element.extract::<T>().ok_or(BrokerError::TypeMismatch {
            declared: std::any::type_name::<T>(),
            stored: "<unknown>",
        })?;
        self.consumers.advance(consumer_id);
        Ok(value)
    }

    /// Allocate a consumer handle bound to `queue_id` for its lifetime,
    /// cursor at 0. Freed handles are recycled smallest-first. `None` only
    /// on handle-space exhaustion.
    pub fn register_consumer(&self, queue_id: QueueId) -> Option<ConsumerId> {
        self.consumers.register(queue_id)
    }

    /// Drop all state for the handle and release it for reuse. Subsequent
    /// operations on it fail with `ConsumerNotFound`.
    pub fn unregister_consumer(&self, consumer_id: ConsumerId) -> bool {
        self.consumers.unregister(consumer_id)
    }

    /// Rewind the consumer's cursor to 0; the queue binding is unchanged.
    pub fn reset_consumer(&self, consumer_id: ConsumerId) -> bool {
        self.consumers.reset(consumer_id)
    }

    /// Set the capacity of `queue_id`, creating the queue if absent.
    /// Shrinking below the current element count never truncates; appends
    /// simply keep failing until space exists.
    pub fn set_queue_size(&self, queue_id: QueueId, capacity: usize) {
        let queue = self.queue_entry(queue_id);
        queue.set_capacity(capacity);
        debug!("queue {queue_id} capacity set to {capacity}");
    }

    /// Empty the queue's element log, if the queue exists. Cursors into it
    /// go stale and report no data until new elements arrive past them or
    /// their consumer is reset.
    pub fn clear_queue(&self, queue_id: QueueId) -> bool {
        let cleared = self.queues.with(&queue_id, |queue| queue.clear()).is_some();
        if cleared {
            debug!("queue {queue_id} cleared");
        }
        cleared
    }

    /// Drop every queue wholesale, including capacity settings and type
    /// tags. Consumer registrations survive; their queues re-materialize
    /// lazily on next access.
    pub fn clear_all_queues(&self) {
        self.queues.clear();
        debug!("all queues cleared");
    }

    /// Most recent outcome recorded for the handle: `None` means the last
    /// operation succeeded; unknown handles report `ConsumerNotFound`.
    pub fn last_error(&self, consumer_id: ConsumerId) -> Option<BrokerError> {
        self.consumers.last_error(consumer_id)
    }

    /// Snapshot of one queue's depth, capacity and element type. `None`
    /// if the queue has never been touched.
    pub fn queue_stats(&self, queue_id: QueueId) -> Option<QueueStats> {
        self.queues.with(&queue_id, |queue| QueueStats {
            depth: queue.len(),
            capacity: queue.capacity(),
            element_type: queue.element_type().map(|tag| tag.name()),
        })
    }

    /// Unread elements between the consumer's cursor and its queue's head.
    pub fn consumer_lag(&self, consumer_id: ConsumerId) -> BrokerResult<usize> {
        let state = self.consumers.snapshot(consumer_id)?;
        let depth = self
            .queues
            .with(&state.queue_id, |queue| queue.len())
            .unwrap_or(0);
        Ok(depth.saturating_sub(state.cursor))
    }

    /// Lag statistics across every consumer bound to `queue_id`.
    pub fn lag_stats(&self, queue_id: QueueId) -> LagStats {
        let depth = self
            .queues
            .with(&queue_id, |queue| queue.len())
            .unwrap_or(0);

        let mut lags = Vec::new();
        self.consumers.for_each(|_, state| {
            if state.queue_id == queue_id {
                lags.push(depth.saturating_sub(state.cursor));
            }
        });
        if lags.is_empty() {
            return LagStats::default();
        }

        LagStats {
            total_consumers: lags.len(),
            max_lag: *lags.iter().max().unwrap(),
            min_lag: *lags.iter().min().unwrap(),
            avg_lag: lags.iter().sum::<usize>() as f64 / lags.len() as f64,
        }
    }

    /// Number of currently registered consumers across all queues.
    pub fn active_consumer_count(&self) -> usize {
        self.consumers.active_count()
    }

    /// Register a consumer wrapped in an RAII [`Consumer`] handle that
    /// unregisters itself on drop.
    pub fn subscribe(self: &Arc<Self>, queue_id: QueueId) -> Option<Consumer> {
        let consumer_id = self.register_consumer(queue_id)?;
        Some(Consumer::new(Arc::downgrade(self), consumer_id, queue_id))
    }

    /// Like [`subscribe`](Self::subscribe), with the element type fixed
    /// once at the type level.
    pub fn subscribe_typed<T: Clone + Send + Sync + 'static>(
        self: &Arc<Self>,
        queue_id: QueueId,
    ) -> Option<TypedConsumer<T>> {
        self.subscribe(queue_id).map(TypedConsumer::new)
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}
