//! Consumer cursor registry
//!
//! Issues and reclaims consumer handles and stores each consumer's target
//! queue, cursor, and last observed error. Freed handles go into a free
//! pool and are reused, smallest first, before a new sequential id is
//! minted, so handle churn never grows the id space without bound.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;

use log::trace;

use crate::error::{BrokerError, BrokerResult};
use crate::sync_map::SyncMap;
use crate::{ConsumerId, QueueId};

/// Per-consumer tracking state.
#[derive(Debug, Clone)]
pub struct ConsumerState {
    /// Target queue, fixed at registration.
    pub queue_id: QueueId,
    /// Next unread position in the target queue's element sequence.
    pub cursor: usize,
    /// Most recent outcome; `None` means success.
    pub last_error: Option<BrokerError>,
}

/// Handle allocation state: the next unminted id plus a min-heap of freed
/// ids, so the smallest released handle is always handed out first.
#[derive(Debug)]
struct HandleAllocator {
    next: ConsumerId,
    freed: BinaryHeap<Reverse<ConsumerId>>,
}

#[derive(Debug)]
pub struct ConsumerRegistry {
    entries: SyncMap<ConsumerId, ConsumerState>,
    alloc: Mutex<HandleAllocator>,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self {
            entries: SyncMap::new(),
            alloc: Mutex::new(HandleAllocator {
                // Handles start at 1 so callers can keep 0 as "no handle".
                next: 1,
                freed: BinaryHeap::new(),
            }),
        }
    }

    /// Allocate a handle bound to `queue_id`. Reuse never leaks a previous
    /// tenant's state: cursor and last error start fresh. Returns `None`
    /// only when the handle space is exhausted.
    pub fn register(&self, queue_id: QueueId) -> Option<ConsumerId> {
        let id = {
            let mut alloc = self.alloc.lock().unwrap();
            match alloc.freed.pop() {
                Some(Reverse(id)) => id,
                None => {
                    if alloc.next == ConsumerId::MAX {
                        return None;
                    }
                    let id = alloc.next;
                    alloc.next += 1;
                    id
                }
            }
        };
        self.entries.insert(
            id,
            ConsumerState {
                queue_id,
                cursor: 0,
                last_error: None,
            },
        );
        trace!("consumer {id} registered on queue {queue_id}");
        Some(id)
    }

    /// Drop all state for the handle and return it to the free pool.
    pub fn unregister(&self, id: ConsumerId) -> bool {
        if !self.entries.remove(&id) {
            return false;
        }
        self.alloc.lock().unwrap().freed.push(Reverse(id));
        trace!("consumer {id} unregistered");
        true
    }

    /// Rewind the cursor to 0, leaving the queue binding unchanged.
    pub fn reset(&self, id: ConsumerId) -> bool {
        self.entries.with_mut(&id, |state| state.cursor = 0).is_some()
    }

    pub fn snapshot(&self, id: ConsumerId) -> BrokerResult<ConsumerState> {
        self.entries
            .get_required(&id)
            .map_err(|_| BrokerError::ConsumerNotFound { consumer_id: id })
    }

    /// Advance the cursor by one after a successful read.
    pub fn advance(&self, id: ConsumerId) {
        self.entries.with_mut(&id, |state| state.cursor += 1);
    }

    /// Record the outcome of the consumer's latest operation. Silently a
    /// no-op for unknown handles, matching the lookup failure the caller
    /// has already surfaced.
    pub fn set_last_error(&self, id: ConsumerId, error: Option<BrokerError>) {
        self.entries.with_mut(&id, |state| state.last_error = error);
    }

    /// Most recent outcome for the handle; unknown handles report
    /// `ConsumerNotFound`.
    pub fn last_error(&self, id: ConsumerId) -> Option<BrokerError> {
        match self.entries.get(&id) {
            Some(state) => state.last_error,
            None => Some(BrokerError::ConsumerNotFound { consumer_id: id }),
        }
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Visit every registered consumer's state.
    pub fn for_each(&self, mut f: impl FnMut(ConsumerId, &ConsumerState)) {
        self.entries.for_each(|id, state| f(*id, state));
    }
}

impl Default for ConsumerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_sequential_from_one() {
        let registry = ConsumerRegistry::new();
        assert_eq!(registry.register(7), Some(1));
        assert_eq!(registry.register(7), Some(2));
        assert_eq!(registry.register(9), Some(3));
        assert_eq!(registry.active_count(), 3);
    }

    #[test]
    fn test_smallest_freed_handle_is_reused_first() {
        let registry = ConsumerRegistry::new();
        let a = registry.register(1).unwrap();
        let b = registry.register(1).unwrap();
        let c = registry.register(1).unwrap();

        registry.unregister(c);
        registry.unregister(a);

        // a < c, so a comes back first even though c was freed earlier.
        assert_eq!(registry.register(1), Some(a));
        assert_eq!(registry.register(1), Some(c));
        // Free pool drained: minting resumes.
        assert_eq!(registry.register(1), Some(b + 2));
    }

    #[test]
    fn test_reuse_does_not_leak_prior_state() {
        let registry = ConsumerRegistry::new();
        let id = registry.register(1).unwrap();
        registry.advance(id);
        registry.advance(id);
        registry.set_last_error(id, Some(BrokerError::NoDataAvailable));

        registry.unregister(id);
        assert_eq!(registry.register(5), Some(id));

        let state = registry.snapshot(id).unwrap();
        assert_eq!(state.queue_id, 5);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn test_unregistered_handle_reports_not_found() {
        let registry = ConsumerRegistry::new();
        let id = registry.register(1).unwrap();
        registry.unregister(id);

        assert!(!registry.unregister(id));
        assert!(registry.snapshot(id).is_err());
        assert_eq!(
            registry.last_error(id),
            Some(BrokerError::ConsumerNotFound { consumer_id: id })
        );
    }

    #[test]
    fn test_reset_rewinds_cursor_only() {
        let registry = ConsumerRegistry::new();
        let id = registry.register(3).unwrap();
        registry.advance(id);
        registry.advance(id);

        assert!(registry.reset(id));
        let state = registry.snapshot(id).unwrap();
        assert_eq!(state.cursor, 0);
        assert_eq!(state.queue_id, 3);

        assert!(!registry.reset(999));
    }
}
