//! Concurrency tests: parallel producers and blocking consumers driving
//! one broker from many threads.

#[cfg(test)]
mod tests {
    use crate::Broker;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_parallel_producers_blocking_consumers() {
        let broker = Arc::new(Broker::new());
        let counter = Arc::new(AtomicI32::new(0));
        let mut handles = Vec::new();

        // 10 producers x 10 values, all onto queue 1.
        for _ in 0..10 {
            let broker = Arc::clone(&broker);
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                for _ in 0..10 {
                    let value = counter.fetch_add(1, Ordering::SeqCst);
                    broker.produce(1, value).unwrap();
                }
            }));
        }

        // 10 consumers each blocking-read the full broadcast sequence.
        for _ in 0..10 {
            let broker = Arc::clone(&broker);
            handles.push(thread::spawn(move || {
                let consumer = broker.register_consumer(1).unwrap();
                let mut seen = Vec::with_capacity(100);
                for _ in 0..100 {
                    let value = broker
                        .consume_blocking::<i32>(consumer, Some(Duration::from_secs(30)))
                        .expect("blocking consume starved");
                    seen.push(value);
                }
                seen.sort_unstable();
                let expected: Vec<i32> = (0..100).collect();
                assert_eq!(seen, expected);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_parallel_queues_do_not_interfere() {
        let broker = Arc::new(Broker::new());
        let mut handles = Vec::new();

        for queue_id in 0..8u32 {
            let broker = Arc::clone(&broker);
            handles.push(thread::spawn(move || {
                for n in 0..100_i32 {
                    broker.produce(queue_id, n).unwrap();
                }
            }));
        }
        for handle in handles.drain(..) {
            handle.join().unwrap();
        }

        // Per-queue FIFO order is intact despite parallel appends.
        for queue_id in 0..8u32 {
            let consumer = broker.register_consumer(queue_id).unwrap();
            for n in 0..100_i32 {
                assert_eq!(broker.consume::<i32>(consumer), Some(n));
            }
        }
    }

    #[test]
    fn test_blocked_consumer_wakes_on_produce() {
        let broker = Arc::new(Broker::new());

        let waiter = {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                let consumer = broker.register_consumer(1).unwrap();
                broker.consume_blocking::<i32>(consumer, Some(Duration::from_secs(10)))
            })
        };

        thread::sleep(Duration::from_millis(100));
        broker.produce(1, 42_i32).unwrap();

        assert_eq!(waiter.join().unwrap(), Some(42));
    }

    #[test]
    fn test_single_produce_wakes_every_blocked_consumer() {
        let broker = Arc::new(Broker::new());
        let mut waiters = Vec::new();

        for _ in 0..4 {
            let broker = Arc::clone(&broker);
            waiters.push(thread::spawn(move || {
                let consumer = broker.register_consumer(1).unwrap();
                broker.consume_blocking::<i32>(consumer, Some(Duration::from_secs(10)))
            }));
        }

        thread::sleep(Duration::from_millis(100));
        broker.produce(1, 7_i32).unwrap();

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), Some(7));
        }
    }

    #[test]
    fn test_unbounded_blocking_wait_is_released() {
        let broker = Arc::new(Broker::new());

        // Explicit opt-in to an infinite wait; a produce must release it.
        let waiter = {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                let consumer = broker.register_consumer(1).unwrap();
                broker.consume_blocking::<i32>(consumer, None)
            })
        };

        thread::sleep(Duration::from_millis(50));
        broker.produce(1, 13_i32).unwrap();
        assert_eq!(waiter.join().unwrap(), Some(13));
    }

    #[test]
    fn test_register_unregister_churn_under_load() {
        let broker = Arc::new(Broker::new());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let broker = Arc::clone(&broker);
            handles.push(thread::spawn(move || {
                for n in 0..250_i32 {
                    broker.produce(1, n).ok();
                }
            }));
        }
        for _ in 0..4 {
            let broker = Arc::clone(&broker);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let consumer = broker.register_consumer(1).unwrap();
                    let _ = broker.consume::<i32>(consumer);
                    broker.unregister_consumer(consumer);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Churned handles all went back to the pool.
        assert_eq!(broker.active_consumer_count(), 0);
        // Recycling keeps the id space small: far fewer ids minted than
        // register calls made.
        let recycled = broker.register_consumer(1).unwrap();
        assert!(recycled <= 8, "expected a recycled small id, got {recycled}");
    }
}
