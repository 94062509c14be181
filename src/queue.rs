//! Replay queue: a bounded, homogeneous-typed element log
//!
//! A `ReplayQueue` is a FIFO log, not a destructive dequeue: consumers read
//! by position and never remove elements, so any number of cursors can
//! replay the full sequence independently.
//!
//! Each queue owns exactly one mutex guarding its state, with a condition
//! variable associated 1:1 that is signalled on every successful append.
//! Blocking reads wait on that condition and re-check their predicate on
//! every wake, so spurious wakeups and lost wakeups cannot occur.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::BrokerError;
use crate::value::{ErasedValue, TypeTag};

/// How long a positional read is willing to suspend the calling thread.
#[derive(Debug, Clone, Copy)]
pub enum Wait {
    /// Return immediately based on current queue length.
    None,
    /// Suspend until data exists at the position or the duration elapses.
    Timeout(Duration),
    /// Suspend until data exists at the position, however long that takes.
    Forever,
}

#[derive(Debug)]
struct QueueState {
    /// Insertion order is read order.
    elements: Vec<ErasedValue>,
    /// Fixed by the first element produced; survives `clear`.
    element_type: Option<TypeTag>,
    capacity: usize,
}

/// One bounded, homogeneous-typed backlog of values.
#[derive(Debug)]
pub struct ReplayQueue {
    state: Mutex<QueueState>,
    appended: Condvar,
}

impl ReplayQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                elements: Vec::new(),
                element_type: None,
                capacity,
            }),
            appended: Condvar::new(),
        }
    }

    /// Append an element and wake all waiters.
    ///
    /// The element type is only enforced while the queue is non-empty; an
    /// emptied queue may be re-tagged by the next successful append. On any
    /// failure the queue is left untouched.
    pub fn append(&self, tag: TypeTag, value: ErasedValue) -> Result<(), BrokerError> {
        let mut state = self.state.lock().unwrap();

        if !state.elements.is_empty() {
            if let Some(stored) = state.element_type {
                if stored != tag {
                    return Err(BrokerError::TypeMismatch {
                        declared: tag.name(),
                        stored: stored.name(),
                    });
                }
            }
        }
        if state.elements.len() >= state.capacity {
            return Err(BrokerError::QueueFull {
                capacity: state.capacity,
            });
        }

        state.element_type = Some(tag);
        state.elements.push(value);
        self.appended.notify_all();
        Ok(())
    }

    /// Read the element at `position` without removing it.
    ///
    /// If the queue carries a type tag that differs from `tag`, the read
    /// fails with `TypeMismatch` before any waiting happens; a queue with
    /// no tag yet adopts `tag` (lazy typing on first access).
    ///
    /// With `Wait::Timeout` the deadline is computed once on entry, so a
    /// string of spurious wakeups cannot extend the bound: control returns
    /// to the caller no later than the requested duration after entry.
    pub fn read_at(
        &self,
        position: usize,
        tag: TypeTag,
        wait: Wait,
    ) -> Result<ErasedValue, BrokerError> {
        let mut state = self.state.lock().unwrap();

        match state.element_type {
            Some(stored) if stored != tag => {
                return Err(BrokerError::TypeMismatch {
                    declared: tag.name(),
                    stored: stored.name(),
                });
            }
            Some(_) => {}
            None => state.element_type = Some(tag),
        }

        match wait {
            Wait::None => {}
            Wait::Forever => {
                while position >= state.elements.len() {
                    state = self.appended.wait(state).unwrap();
                }
            }
            Wait::Timeout(limit) => {
                let deadline = Instant::now().checked_add(limit);
                while position >= state.elements.len() {
                    match deadline {
                        Some(deadline) => {
                            let remaining = deadline.saturating_duration_since(Instant::now());
                            if remaining.is_zero() {
                                return Err(BrokerError::TimeoutExpired);
                            }
                            state = self.appended.wait_timeout(state, remaining).unwrap().0;
                        }
                        // Duration too large to form a deadline: equivalent
                        // to an unbounded wait.
                        None => state = self.appended.wait(state).unwrap(),
                    }
                }
            }
        }

        if position >= state.elements.len() {
            return Err(BrokerError::NoDataAvailable);
        }
        // The lock is released while suspended, so an emptied queue may
        // have been re-tagged by a producer in the meantime; re-verify
        // before handing an element out.
        if let Some(stored) = state.element_type {
            if stored != tag {
                return Err(BrokerError::TypeMismatch {
                    declared: tag.name(),
                    stored: stored.name(),
                });
            }
        }
        Ok(state.elements[position].clone())
    }

    /// Replace the capacity. Existing elements beyond a smaller capacity
    /// are never truncated; further appends simply keep failing with
    /// `QueueFull` until space exists again.
    pub fn set_capacity(&self, capacity: usize) {
        self.state.lock().unwrap().capacity = capacity;
    }

    /// Empty the element log. The recorded type tag survives; cursors into
    /// this queue go stale and report no data until new elements arrive
    /// past them or the consumer is reset.
    pub fn clear(&self) {
        self.state.lock().unwrap().elements.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().elements.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().unwrap().capacity
    }

    pub fn element_type(&self) -> Option<TypeTag> {
        self.state.lock().unwrap().element_type
    }
}
