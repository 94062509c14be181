//! Typed, thread-safe multi-queue data broker
//!
//! Producers push values of a runtime-determined type into integer-keyed
//! queues; independent consumers, each tracked by a cursor, replay every
//! queue in insertion order, optionally blocking with a timeout.
//!
//! # Overview
//!
//! - **Multiple queues**: created lazily on first produce/consume, each
//!   with its own lock and wait/notify condition, so unrelated queues
//!   never serialize on each other.
//! - **Broadcast replay**: consumers read by position, not by popping;
//!   every consumer on a queue observes the entire element sequence.
//! - **Runtime typing**: each queue commits to the type first produced
//!   into it, enforced by `TypeId` on every subsequent produce/consume.
//! - **Backpressure**: queues are bounded (default 1000 elements);
//!   producers get `QueueFull` instead of unbounded growth.
//! - **Blocking reads**: a consumer may suspend on a queue's condition
//!   until data exists past its cursor or a caller-supplied deadline
//!   elapses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Producer A  │     │  Producer B  │     │  Producer C  │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ produce(1, v)      │ produce(1, v)      │ produce(2, v)
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                         Broker                          │
//! │  ┌──────────────────────────────┐  ┌────────────────┐   │
//! │  │ queue 1  │ a │ b │ c │ d │…  │  │ queue 2 │ x │… │   │
//! │  └──────▲───────────▲───────────┘  └─────▲──────────┘   │
//! └─────────┼───────────┼────────────────────┼──────────────┘
//!           │ cursor 2  │ cursor 4           │ cursor 0
//!    ┌──────┴─────┐ ┌───┴────────┐    ┌──────┴─────┐
//!    │ Consumer 1 │ │ Consumer 2 │    │ Consumer 3 │
//!    └────────────┘ └────────────┘    └────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use replayq::{Broker, BrokerError};
//!
//! let broker = Broker::new();
//!
//! // Two consumers on the same queue each replay the full sequence.
//! let first = broker.register_consumer(1).expect("handle space exhausted");
//! let second = broker.register_consumer(1).expect("handle space exhausted");
//!
//! broker.produce(1, 42_i32).unwrap();
//! broker.produce(1, 43_i32).unwrap();
//!
//! assert_eq!(broker.consume::<i32>(first), Some(42));
//! assert_eq!(broker.consume::<i32>(first), Some(43));
//! assert_eq!(broker.consume::<i32>(second), Some(42));
//!
//! // The queue is committed to i32 now.
//! assert_eq!(broker.consume::<f32>(second), None);
//! assert!(matches!(
//!     broker.last_error(second),
//!     Some(BrokerError::TypeMismatch { .. })
//! ));
//! ```

mod broker;
mod consumer;
mod error;
mod queue;
mod registry;
mod stats;
mod sync_map;
mod typed;
mod value;

pub use broker::Broker;
pub use consumer::Consumer;
pub use error::{BrokerError, BrokerResult};
pub use stats::{LagStats, QueueStats};
pub use sync_map::{KeyNotFound, SyncMap};
pub use typed::TypedConsumer;

/// Integer identifier of a queue.
pub type QueueId = u32;

/// Opaque handle identifying a registered consumer. 0 is never issued.
pub type ConsumerId = u32;

/// Element capacity a queue starts with unless overridden via
/// [`Broker::set_queue_size`] or [`Broker::with_default_capacity`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests;
