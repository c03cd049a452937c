use std::time::{Duration, Instant};

use nexus_mq::{MessageQueue, PostError, QueueConfig, VERSION};

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn strings_come_out_in_posting_order() {
    let queue = MessageQueue::new();

    for word in ["one", "two", "three"] {
        queue.post_bytes(word).unwrap();
    }

    for word in ["one", "two", "three"] {
        let delivery = queue.wait(Duration::ZERO).unwrap();
        assert_eq!(*delivery.payload(), word);
        assert_eq!(delivery.payload_len(), word.len());
    }

    assert!(queue.wait(Duration::ZERO).is_none());
}

#[test]
fn distinct_payloads_dequeue_in_enqueue_order() {
    let queue = MessageQueue::new();
    let payloads: Vec<String> = (0..1_000).map(|i| format!("message-{i}")).collect();

    for p in &payloads {
        queue.post(p.clone(), p.len()).unwrap();
    }

    let received: Vec<String> = std::iter::from_fn(|| queue.try_wait())
        .map(|d| d.into_payload())
        .collect();
    assert_eq!(received, payloads);
}

// =============================================================================
// Count
// =============================================================================

#[test]
fn count_is_posts_minus_waits() {
    let queue = MessageQueue::new();

    for k in 0..20u32 {
        queue.post(k, 4).unwrap();
    }
    for _ in 0..7 {
        queue.try_wait().unwrap();
    }
    assert_eq!(queue.len(), 13);

    for _ in 0..13 {
        queue.try_wait().unwrap();
    }

    // Failed waits do not change the count
    assert!(queue.try_wait().is_none());
    assert_eq!(queue.len(), 0);
    assert!(queue.is_empty());
}

// =============================================================================
// Peek
// =============================================================================

#[test]
fn peek_does_not_disturb_queue() {
    let queue = MessageQueue::new();
    queue.post("a", 1).unwrap();
    queue.post("bb", 2).unwrap();

    let first = queue.peek();
    let second = queue.peek();
    assert_eq!(first, Some(("a", 1)));
    assert_eq!(first, second);
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.try_wait().unwrap().into_payload(), "a");
    assert_eq!(queue.peek(), Some(("bb", 2)));
}

#[test]
fn peek_on_empty_is_none() {
    let queue: MessageQueue<&str> = MessageQueue::new();
    assert_eq!(queue.peek(), None);
    assert!(queue.is_empty());
}

// =============================================================================
// Lifetime
// =============================================================================

#[test]
fn lifetime_matches_wall_clock_delay() {
    let queue = MessageQueue::new();
    let delay = Duration::from_millis(50);

    let posted = Instant::now();
    queue.post("x", 1).unwrap();
    std::thread::sleep(delay);
    let delivery = queue.try_wait().unwrap();
    let observed = posted.elapsed();

    let lifetime = delivery.lifetime();
    assert!(lifetime >= delay, "lifetime {lifetime:?} < delay {delay:?}");
    assert!(lifetime <= observed, "lifetime {lifetime:?} > observed {observed:?}");
}

#[test]
fn back_to_back_lifetime_is_small() {
    let queue = MessageQueue::new();
    queue.post(0u8, 1).unwrap();
    let lifetime = queue.try_wait().unwrap().lifetime();
    assert!(lifetime < Duration::from_secs(1), "{lifetime:?}");
}

// =============================================================================
// Construction / Teardown
// =============================================================================

#[test]
fn try_with_config_reports_reserve_failure() {
    let config = QueueConfig::default().with_initial_capacity(usize::MAX);
    let err = MessageQueue::<u8>::try_with_config(config).unwrap_err();
    assert!(err.to_string().contains("failed to reserve"));
}

#[test]
fn with_config_falls_back_when_reserve_fails() {
    let config = QueueConfig::default().with_initial_capacity(usize::MAX);
    let queue = MessageQueue::with_config(config);
    queue.post(1u8, 1).unwrap();
    assert_eq!(queue.try_wait().unwrap().into_payload(), 1);
}

#[test]
fn destroy_reports_undelivered() {
    let queue = MessageQueue::new();
    for i in 0..3 {
        queue.post(i, 0).unwrap();
    }
    assert_eq!(queue.destroy(), 3);

    let empty: MessageQueue<u8> = MessageQueue::new();
    assert_eq!(empty.destroy(), 0);
}

#[test]
fn post_error_hands_back_payload() {
    let err = PostError::Alloc(String::from("kept"));
    assert_eq!(err.into_inner(), "kept");
}

#[test]
fn version_is_set() {
    assert!(!VERSION.is_empty());
}

#[test]
fn init_tracing_is_idempotent() {
    nexus_mq::trace::init_tracing();
    nexus_mq::trace::init_tracing();

    let queue = MessageQueue::new();
    queue.post("logged", 6).unwrap();
    assert!(queue.wait(Duration::from_millis(1)).is_some());
    assert!(queue.wait(Duration::from_millis(1)).is_none());
    assert_eq!(queue.destroy(), 0);
}
