use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use nexus_mq::{MessageQueue, QueueConfig};

/// Payload tag: producer id in the high half, sequence in the low half.
fn tag(producer: u64, seq: u64) -> u64 {
    (producer << 32) | seq
}

fn run_mpmc(producers: u64, consumers: usize, per_producer: u64, config: QueueConfig) {
    let queue = Arc::new(MessageQueue::with_config(config));
    let done = Arc::new(AtomicBool::new(false));

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..per_producer {
                    queue.post(tag(p, seq), 8).unwrap();
                }
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut received = Vec::new();
                loop {
                    match queue.wait(Duration::from_millis(5)) {
                        Some(delivery) => received.push(delivery.into_payload()),
                        None => {
                            if done.load(Ordering::Acquire) && queue.is_empty() {
                                break;
                            }
                        }
                    }
                }
                received
            })
        })
        .collect();

    for h in producer_handles {
        h.join().unwrap();
    }
    done.store(true, Ordering::Release);

    let mut seen = HashSet::new();
    let mut total = 0u64;
    for h in consumer_handles {
        let received = h.join().unwrap();

        // Each consumer sees every producer's messages in posting order.
        let mut last_seq = vec![None; producers as usize];
        for &value in &received {
            let producer = (value >> 32) as usize;
            let seq = value & 0xFFFF_FFFF;
            if let Some(prev) = last_seq[producer] {
                assert!(seq > prev, "producer {producer}: {seq} after {prev}");
            }
            last_seq[producer] = Some(seq);

            assert!(seen.insert(value), "delivered twice: {value:#x}");
        }
        total += received.len() as u64;
    }

    assert_eq!(total, producers * per_producer);
    for p in 0..producers {
        for seq in 0..per_producer {
            assert!(seen.contains(&tag(p, seq)), "lost: producer {p} seq {seq}");
        }
    }
    assert!(queue.is_empty());
}

#[test]
fn stress_single_producer_single_consumer() {
    run_mpmc(1, 1, 100_000, QueueConfig::default());
}

#[test]
fn stress_many_producers_many_consumers() {
    run_mpmc(4, 4, 25_000, QueueConfig::default());
}

#[test]
fn stress_more_consumers_than_producers() {
    run_mpmc(2, 8, 20_000, QueueConfig::default());
}

#[test]
fn stress_park_only() {
    run_mpmc(
        4,
        4,
        10_000,
        QueueConfig::default().with_snooze_iters(0).with_initial_capacity(0),
    );
}

#[test]
fn stress_interleaved_post_and_wait_keeps_count() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 10_000;

    let queue = Arc::new(MessageQueue::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    queue.post((t, i), 0).unwrap();
                    // Our own post guarantees at least one message is present.
                    assert!(queue.wait(Duration::ZERO).is_some());
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(queue.len(), 0);
}
