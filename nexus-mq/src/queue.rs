//! The message queue.
//!
//! # Locking
//!
//! All mutable state (list head, tail, element count, and the number of
//! parked consumers) lives in one [`State`] behind one [`Mutex`]. Every
//! operation takes that lock exactly once per attempt, so no thread can ever
//! observe the count and the list out of step.
//!
//! The [`Condvar`] is purely a wake-up channel. Whether an element can be
//! claimed is decided by the list itself, under the lock:
//!
//! ```text
//! Consumer (wait):                      Producer (post):
//! ───────────────────────               ───────────────────────
//! lock                                  lock
//! list empty? -> waiters += 1           push_front(node)
//! condvar.wait_timeout (unlocks)        wake = waiters > 0
//!     ...                               unlock
//! relock, waiters -= 1                  if wake: notify_one
//! pop_back() -> Some(node)
//! unlock
//! ```
//!
//! Because `waiters` is only touched under the lock, a producer that sees
//! `waiters == 0` is guaranteed that no consumer has committed to sleeping
//! yet; any consumer that checks afterwards will find the new node.
//!
//! The lock is not reentrant. The closure given to
//! [`peek_with`](MessageQueue::peek_with) runs under it and must not call
//! back into the same queue.
//!
//! # Blocking Strategy
//!
//! A blocking [`wait`](MessageQueue::wait) tries, in order:
//!
//! ```text
//! Phase 1: Fast path   - one locked pop attempt
//! Phase 2: Backoff     - crossbeam Backoff::snooze() between attempts
//!                        (QueueConfig::snooze_iters rounds)
//! Phase 3: Park        - condvar wait with the remaining deadline
//! ```
//!
//! The call never reports "empty" before the full timeout has elapsed:
//! spurious wakeups and stolen elements send it back to sleep for whatever
//! time remains.

use core::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_utils::Backoff;

use crate::config::QueueConfig;
use crate::error::{CreateError, Full, PostError};
use crate::list::List;
use crate::trace::{debug, trace, warn};

/// A queued payload plus its bookkeeping.
struct Envelope<T> {
    payload: T,
    payload_len: usize,
    enqueued_at: Instant,
}

/// Everything guarded by the queue lock.
struct State<T> {
    list: List<Envelope<T>>,
    /// Consumers currently parked on the condvar.
    waiters: usize,
}

/// A message removed from the queue by [`MessageQueue::wait`].
///
/// Ownership of the payload passes to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery<T> {
    payload: T,
    payload_len: usize,
    lifetime: Duration,
}

impl<T> Delivery<T> {
    /// The payload handle exactly as it was posted.
    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// The length supplied when the payload was posted.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// How long the message sat in the queue.
    ///
    /// Measured with the monotonic clock from post to removal. Never
    /// negative: if the clock appears to have run backward this is zero.
    #[inline]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Takes the payload, discarding the bookkeeping.
    #[inline]
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Splits into `(payload, payload_len, lifetime)`.
    #[inline]
    pub fn into_parts(self) -> (T, usize, Duration) {
        (self.payload, self.payload_len, self.lifetime)
    }
}

/// Time spent in the queue, clamped to zero if `now` is earlier than
/// `enqueued_at`.
#[inline]
fn lifetime_between(enqueued_at: Instant, now: Instant) -> Duration {
    now.checked_duration_since(enqueued_at)
        .unwrap_or(Duration::ZERO)
}

/// A thread-safe FIFO message queue.
///
/// Any number of threads may [`post`](Self::post) and
/// [`wait`](Self::wait) concurrently; share the queue with an [`Arc`] or
/// scoped threads. Messages come out in the order they went in.
///
/// The queue stores payload handles as given. It never copies, inspects or
/// frees what they point to, and the `payload_len` passed to `post` is
/// recorded without validation. Use cheap handles such as `&'static [u8]`,
/// `Arc<[u8]>` or `Box<[u8]>`.
///
/// [`Arc`]: std::sync::Arc
///
/// # Example
///
/// ```
/// use nexus_mq::MessageQueue;
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// let queue = Arc::new(MessageQueue::new());
///
/// let producer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || {
///         queue.post_bytes("hello").unwrap();
///     })
/// };
///
/// let delivery = queue.wait(Duration::from_secs(5)).unwrap();
/// assert_eq!(*delivery.payload(), "hello");
/// assert_eq!(delivery.payload_len(), 5);
///
/// producer.join().unwrap();
/// ```
pub struct MessageQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
    config: QueueConfig,
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MessageQueue<T> {
    /// Creates an empty queue with the default [`QueueConfig`].
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates an empty queue with custom configuration.
    ///
    /// If the initial node reservation cannot be allocated the queue starts
    /// with no reserved slots and grows on demand; use
    /// [`try_with_config`](Self::try_with_config) to treat that as an error.
    pub fn with_config(config: QueueConfig) -> Self {
        Self::try_with_config(config).unwrap_or_else(|_| {
            warn!(
                initial_capacity = config.initial_capacity,
                "initial reservation failed, starting unreserved"
            );
            Self::build(List::new(), config)
        })
    }

    /// Creates an empty queue, reporting allocation failure of the initial
    /// node reservation.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError::Reserve`] if `config.initial_capacity` node
    /// slots cannot be allocated.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::{CreateError, MessageQueue, QueueConfig};
    ///
    /// let queue = MessageQueue::<u64>::try_with_config(QueueConfig::default()).unwrap();
    /// assert!(queue.capacity() >= 64);
    ///
    /// let huge = QueueConfig::default().with_initial_capacity(usize::MAX);
    /// assert!(matches!(
    ///     MessageQueue::<u64>::try_with_config(huge),
    ///     Err(CreateError::Reserve { .. })
    /// ));
    /// ```
    pub fn try_with_config(config: QueueConfig) -> Result<Self, CreateError> {
        let mut list = List::new();
        list.try_reserve(config.initial_capacity)
            .map_err(|source| CreateError::Reserve {
                capacity: config.initial_capacity,
                source,
            })?;
        Ok(Self::build(list, config))
    }

    fn build(list: List<Envelope<T>>, config: QueueConfig) -> Self {
        debug!(
            initial_capacity = config.initial_capacity,
            snooze_iters = config.snooze_iters,
            "message queue created"
        );
        Self {
            state: Mutex::new(State { list, waiters: 0 }),
            available: Condvar::new(),
            config,
        }
    }

    /// Returns the configuration the queue was built with.
    #[inline]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Takes the queue lock.
    ///
    /// A panic while holding the lock can only come from user code run by
    /// [`peek`](Self::peek) or [`peek_with`](Self::peek_with), neither of
    /// which touches the links, so a poisoned lock is still consistent.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Enqueue
    // ========================================================================

    /// Appends a message at the head of the queue.
    ///
    /// `payload_len` is recorded as given; zero is fine. Never blocks beyond
    /// the brief critical section. Wakes one parked consumer, if any.
    ///
    /// # Errors
    ///
    /// Returns `Err(PostError::Alloc(payload))` if no node could be
    /// allocated. The queue is unchanged and the payload is handed back.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::MessageQueue;
    ///
    /// let queue = MessageQueue::new();
    /// queue.post("one", 3).unwrap();
    /// queue.post("two", 3).unwrap();
    /// assert_eq!(queue.len(), 2);
    /// ```
    pub fn post(&self, payload: T, payload_len: usize) -> Result<(), PostError<T>> {
        let envelope = Envelope {
            payload,
            payload_len,
            enqueued_at: Instant::now(),
        };

        let wake = {
            let mut state = self.lock();
            if let Err(Full(envelope)) = state.list.push_front(envelope) {
                warn!(
                    len = state.list.len(),
                    payload_len, "failed to allocate queue node"
                );
                return Err(PostError::Alloc(envelope.payload));
            }
            state.waiters > 0
        };

        // Only pay for the notify syscall when a consumer is actually parked.
        if wake {
            self.available.notify_one();
        }
        Ok(())
    }

    /// Posts a byte-like payload, using its byte length as `payload_len`.
    ///
    /// # Errors
    ///
    /// Same as [`post`](Self::post).
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::MessageQueue;
    ///
    /// let queue = MessageQueue::new();
    /// queue.post_bytes(vec![1u8, 2, 3]).unwrap();
    /// assert_eq!(queue.peek().map(|(_, len)| len), Some(3));
    /// ```
    pub fn post_bytes(&self, payload: T) -> Result<(), PostError<T>>
    where
        T: AsRef<[u8]>,
    {
        let payload_len = payload.as_ref().len();
        self.post(payload, payload_len)
    }

    // ========================================================================
    // Dequeue
    // ========================================================================

    /// Removes the oldest message, waiting up to `timeout` for one to arrive.
    ///
    /// - `Duration::ZERO` tries once and returns immediately.
    /// - Any positive duration blocks until a message can be claimed or the
    ///   full duration has elapsed. `None` is never returned early.
    /// - A timeout too large to represent as a deadline waits indefinitely.
    ///
    /// Returns `None` if no message could be claimed in time; the queue is
    /// unchanged in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::MessageQueue;
    /// use std::time::Duration;
    ///
    /// let queue = MessageQueue::new();
    /// assert!(queue.wait(Duration::from_millis(10)).is_none());
    ///
    /// queue.post("x", 1).unwrap();
    /// let delivery = queue.wait(Duration::ZERO).unwrap();
    /// assert_eq!(delivery.into_payload(), "x");
    /// ```
    pub fn wait(&self, timeout: Duration) -> Option<Delivery<T>> {
        // Fast path
        if let Some(delivery) = self.try_wait() {
            return Some(delivery);
        }
        if timeout.is_zero() {
            return None;
        }

        let deadline = Instant::now().checked_add(timeout);

        // Backoff phase
        let backoff = Backoff::new();
        for _ in 0..self.config.snooze_iters {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            backoff.snooze();

            if let Some(delivery) = self.try_wait() {
                return Some(delivery);
            }
        }

        // Park phase
        let mut state = self.lock();
        loop {
            if let Some(delivery) = Self::take(&mut state) {
                return Some(delivery);
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        trace!(?timeout, "wait timed out");
                        return None;
                    }
                    Some(remaining)
                }
                None => None,
            };

            state.waiters += 1;
            state = match remaining {
                Some(remaining) => self
                    .available
                    .wait_timeout(state, remaining)
                    .map(|(guard, _)| guard)
                    .unwrap_or_else(|e| e.into_inner().0),
                None => self
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
            state.waiters -= 1;
        }
    }

    /// Removes the oldest message without blocking.
    ///
    /// Equivalent to `wait(Duration::ZERO)`.
    #[inline]
    pub fn try_wait(&self) -> Option<Delivery<T>> {
        let mut state = self.lock();
        Self::take(&mut state)
    }

    /// Like [`wait`](Self::wait), with the timeout in whole milliseconds.
    #[inline]
    pub fn wait_millis(&self, timeout_ms: u64) -> Option<Delivery<T>> {
        self.wait(Duration::from_millis(timeout_ms))
    }

    /// Unlinks the tail under an already-held lock.
    #[inline]
    fn take(state: &mut State<T>) -> Option<Delivery<T>> {
        let envelope = state.list.pop_back()?;
        Some(Delivery {
            payload: envelope.payload,
            payload_len: envelope.payload_len,
            lifetime: lifetime_between(envelope.enqueued_at, Instant::now()),
        })
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Returns a clone of the oldest payload handle and its length, without
    /// removing it.
    ///
    /// Returns `None` if the queue is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::MessageQueue;
    ///
    /// let queue = MessageQueue::new();
    /// assert_eq!(queue.peek(), None);
    ///
    /// queue.post("first", 5).unwrap();
    /// queue.post("second", 6).unwrap();
    /// assert_eq!(queue.peek(), Some(("first", 5)));
    /// assert_eq!(queue.len(), 2);
    /// ```
    pub fn peek(&self) -> Option<(T, usize)>
    where
        T: Clone,
    {
        self.peek_with(|payload, len| (payload.clone(), len))
    }

    /// Runs `f` on the oldest payload and its length, without removing it.
    ///
    /// `f` runs with the queue locked, so no consumer can remove that message
    /// meanwhile. Keep it short: every other operation waits on it.
    ///
    /// Returns `None` (without calling `f`) if the queue is empty.
    ///
    /// # Deadlocks
    ///
    /// `f` must not call any method on the same queue (including formatting
    /// it with `{:?}`). The lock is already held and is not reentrant, so
    /// such a call blocks forever. Return what you need from `f` and act on
    /// it after `peek_with` returns.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::MessageQueue;
    ///
    /// let queue = MessageQueue::new();
    /// queue.post_bytes(vec![7u8, 8, 9]).unwrap();
    ///
    /// // Copy out what is needed; the lock is released on return.
    /// let first = queue.peek_with(|bytes, len| (bytes[0], len));
    /// assert_eq!(first, Some((7, 3)));
    /// assert_eq!(queue.len(), 1);
    /// ```
    pub fn peek_with<R>(&self, f: impl FnOnce(&T, usize) -> R) -> Option<R> {
        let state = self.lock();
        state
            .list
            .back()
            .map(|envelope| f(&envelope.payload, envelope.payload_len))
    }

    /// Number of messages currently queued.
    ///
    /// A snapshot only: it can change before the caller acts on it, so do not
    /// use it to predict whether a following `wait` will succeed.
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().list.len()
    }

    /// Returns `true` if no messages are queued (snapshot, see [`len`](Self::len)).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().list.is_empty()
    }

    /// Node slots allocated, occupied or not.
    ///
    /// Storage grows to the peak backlog and stays there: slots freed by
    /// `wait` are reused by later posts but not returned to the allocator
    /// until [`shrink_to_fit`](Self::shrink_to_fit), `destroy` or drop.
    pub fn capacity(&self) -> usize {
        self.lock().list.capacity()
    }

    /// Releases spare node storage, down to the configured
    /// `initial_capacity`.
    ///
    /// Slots are addressed by index, so only storage past the highest
    /// occupied slot can go. An empty queue releases everything above
    /// `initial_capacity`.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::{MessageQueue, QueueConfig};
    ///
    /// let queue = MessageQueue::with_config(QueueConfig::default().with_initial_capacity(4));
    /// for i in 0..1_000u32 {
    ///     queue.post(i, 4).unwrap();
    /// }
    /// while queue.try_wait().is_some() {}
    /// assert!(queue.capacity() >= 1_000);
    ///
    /// queue.shrink_to_fit();
    /// assert!(queue.capacity() < 1_000);
    /// ```
    pub fn shrink_to_fit(&self) {
        let mut state = self.lock();
        state.list.shrink_to(self.config.initial_capacity);
        trace!(capacity = state.list.capacity(), "node storage shrunk");
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Destroys the queue, discarding every undelivered message.
    ///
    /// Lifetimes are not computed for discarded messages. Returns how many
    /// there were. Taking `self` by value means no other thread can still be
    /// using the queue; dropping the queue performs the same drain.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_mq::MessageQueue;
    ///
    /// let queue = MessageQueue::new();
    /// queue.post(1u32, 4).unwrap();
    /// queue.post(2u32, 4).unwrap();
    /// assert_eq!(queue.destroy(), 2);
    /// ```
    pub fn destroy(self) -> usize {
        let drained = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .list
            .clear();
        debug!(drained, "message queue destroyed");
        drained
    }
}

impl<T> fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (len, waiters) = {
            let state = self.lock();
            (state.list.len(), state.waiters)
        };
        f.debug_struct("MessageQueue")
            .field("len", &len)
            .field("waiters", &waiters)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
