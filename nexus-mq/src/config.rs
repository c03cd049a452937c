//! Queue configuration.

/// Default number of backoff snooze iterations before a waiting consumer
/// parks on the condition variable.
///
/// Each snooze uses `crossbeam_utils::Backoff::snooze()`, which starts with
/// spinning and eventually yields to the OS scheduler.
pub const DEFAULT_SNOOZE_ITERS: usize = 8;

/// Default number of node slots reserved at construction.
pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

/// Tuning knobs for a [`MessageQueue`](crate::MessageQueue).
///
/// # Example
///
/// ```
/// use nexus_mq::{MessageQueue, QueueConfig};
///
/// // Burn less CPU before parking; pre-size for a burst of 4096 messages.
/// let config = QueueConfig::default()
///     .with_snooze_iters(2)
///     .with_initial_capacity(4096);
///
/// let queue: MessageQueue<u64> = MessageQueue::with_config(config);
/// assert_eq!(queue.config().snooze_iters, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Node slots reserved up front. The queue still grows past this.
    pub initial_capacity: usize,
    /// Backoff iterations a blocking [`wait`](crate::MessageQueue::wait)
    /// spends before parking. Higher values burn more CPU but catch messages
    /// that arrive "soon" without a futex round trip.
    pub snooze_iters: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            snooze_iters: DEFAULT_SNOOZE_ITERS,
        }
    }
}

impl QueueConfig {
    /// Sets the number of node slots reserved at construction.
    #[must_use]
    pub const fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the number of backoff iterations before parking.
    #[must_use]
    pub const fn with_snooze_iters(mut self, snooze_iters: usize) -> Self {
        self.snooze_iters = snooze_iters;
        self
    }
}
