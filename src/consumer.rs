//! RAII consumer handle
//!
//! A `Consumer` wraps a registered handle together with a weak reference
//! back to its broker, so holding one never keeps the broker alive and a
//! dropped handle always releases its registration.

use std::sync::Weak;
use std::time::Duration;

use crate::broker::Broker;
use crate::error::BrokerError;
use crate::typed::TypedConsumer;
use crate::{ConsumerId, QueueId};

/// Handle for reading one queue through an independent cursor.
///
/// Created by [`Broker::subscribe`]; unregisters itself on drop, returning
/// its handle to the broker's free pool.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use replayq::Broker;
///
/// let broker = Arc::new(Broker::new());
/// let consumer = broker.subscribe(1).expect("handle space exhausted");
///
/// broker.produce(1, "hello".to_string()).unwrap();
/// assert_eq!(consumer.read::<String>(), Some("hello".to_string()));
/// ```
#[derive(Debug)]
pub struct Consumer {
    broker: Weak<Broker>,
    consumer_id: ConsumerId,
    queue_id: QueueId,
}

impl Consumer {
    pub(crate) fn new(broker: Weak<Broker>, consumer_id: ConsumerId, queue_id: QueueId) -> Self {
        Self {
            broker,
            consumer_id,
            queue_id,
        }
    }

    pub fn consumer_id(&self) -> ConsumerId {
        self.consumer_id
    }

    pub fn queue_id(&self) -> QueueId {
        self.queue_id
    }

    /// Non-blocking read of the next element. `None` when nothing is
    /// available, the type mismatches, or the broker is gone; see
    /// [`last_error`](Self::last_error) for the reason.
    pub fn read<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.broker.upgrade()?.consume::<T>(self.consumer_id)
    }

    /// Blocking read; `None` as timeout opts in to an unbounded wait.
    pub fn read_blocking<T: Clone + Send + Sync + 'static>(
        &self,
        timeout: Option<Duration>,
    ) -> Option<T> {
        self.broker
            .upgrade()?
            .consume_blocking::<T>(self.consumer_id, timeout)
    }

    /// Read up to `max` elements, stopping early at the end of the queue.
    pub fn read_batch<T: Clone + Send + Sync + 'static>(&self, max: usize) -> Vec<T> {
        let mut batch = Vec::new();
        for _ in 0..max {
            match self.read::<T>() {
                Some(value) => batch.push(value),
                None => break,
            }
        }
        batch
    }

    /// Rewind the cursor to the start of the queue's element log.
    pub fn reset(&self) -> bool {
        match self.broker.upgrade() {
            Some(broker) => broker.reset_consumer(self.consumer_id),
            None => false,
        }
    }

    /// Most recent outcome recorded for this handle; `None` is success.
    pub fn last_error(&self) -> Option<BrokerError> {
        match self.broker.upgrade() {
            Some(broker) => broker.last_error(self.consumer_id),
            None => Some(BrokerError::ConsumerNotFound {
                consumer_id: self.consumer_id,
            }),
        }
    }

    /// Fix the element type at the type level.
    pub fn into_typed<T: Clone + Send + Sync + 'static>(self) -> TypedConsumer<T> {
        TypedConsumer::new(self)
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        if let Some(broker) = self.broker.upgrade() {
            broker.unregister_consumer(self.consumer_id);
        }
    }
}
