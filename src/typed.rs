//! Typed consumer wrapper
//!
//! Wraps a [`Consumer`] so the element type is declared once, at the type
//! level, instead of at every read call. A `TypedConsumer<T>` on a queue
//! holding a different type reports `TypeMismatch` exactly like the
//! underlying runtime-tagged reads.

use std::marker::PhantomData;
use std::time::Duration;

use crate::consumer::Consumer;
use crate::error::BrokerError;

/// A consumer whose element type is fixed at compile time.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use replayq::Broker;
///
/// let broker = Arc::new(Broker::new());
/// let consumer = broker.subscribe_typed::<i64>(1).expect("handle space exhausted");
///
/// broker.produce(1, 7_i64).unwrap();
/// assert_eq!(consumer.read(), Some(7));
/// ```
#[derive(Debug)]
pub struct TypedConsumer<T> {
    inner: Consumer,
    _element: PhantomData<T>,
}

impl<T: Clone + Send + Sync + 'static> TypedConsumer<T> {
    pub fn new(inner: Consumer) -> Self {
        Self {
            inner,
            _element: PhantomData,
        }
    }

    pub fn read(&self) -> Option<T> {
        self.inner.read::<T>()
    }

    pub fn read_blocking(&self, timeout: Option<Duration>) -> Option<T> {
        self.inner.read_blocking::<T>(timeout)
    }

    pub fn read_batch(&self, max: usize) -> Vec<T> {
        self.inner.read_batch::<T>(max)
    }

    pub fn reset(&self) -> bool {
        self.inner.reset()
    }

    pub fn last_error(&self) -> Option<BrokerError> {
        self.inner.last_error()
    }

    /// Access the underlying handle for untyped operations.
    pub fn inner(&self) -> &Consumer {
        &self.inner
    }
}
