//! # nexus-mq
//!
//! A thread-safe, in-process FIFO message queue for handing payloads between
//! producer and consumer threads.
//!
//! ## Features
//!
//! - **MPMC**: any number of threads may post and wait concurrently
//! - **Blocking with timeout**: `wait(Duration::ZERO)` never blocks; a
//!   positive timeout blocks at least that long before reporting "empty"
//! - **O(1) peek** of the oldest message without removing it
//! - **Lifetime tracking**: every delivery reports how long it sat queued
//! - **Zero-copy**: payload handles are stored and returned as given
//!
//! ## Design
//!
//! ```text
//!                 ┌──────────── Mutex<State> ─────────────┐
//!  post() ──────► │ head ► [n3] ◄─► [n2] ◄─► [n1] ◄ tail │ ──────► wait()
//!                 │ len = 3          waiters = 0          │
//!                 └───────────────────────────────────────┘
//!                                Condvar (wake-up only)
//! ```
//!
//! Nodes live in an arena and link by stable index, so there are no raw
//! pointers to dangle. One lock covers the whole list and its count, and the
//! condvar only wakes parked consumers; the list is the sole authority on
//! whether a message can be claimed.
//!
//! Node storage grows to the peak backlog and is reused from then on. It is
//! not handed back to the allocator on its own; call
//! [`MessageQueue::shrink_to_fit`] after a burst to release it.
//!
//! ## Example
//!
//! ```
//! use nexus_mq::MessageQueue;
//! use std::time::Duration;
//!
//! let queue = MessageQueue::new();
//!
//! queue.post("one", 3).unwrap();
//! queue.post("two", 3).unwrap();
//! queue.post("three", 5).unwrap();
//!
//! assert_eq!(queue.len(), 3);
//! assert_eq!(queue.peek(), Some(("one", 3)));
//!
//! assert_eq!(queue.wait(Duration::ZERO).unwrap().into_payload(), "one");
//! assert_eq!(queue.wait(Duration::ZERO).unwrap().into_payload(), "two");
//! assert_eq!(queue.wait(Duration::ZERO).unwrap().into_payload(), "three");
//! assert!(queue.wait(Duration::ZERO).is_none());
//! ```
//!
//! ## Feature Flags
//!
//! - `tracing` - Emit queue lifecycle events through `tracing`; see
//!   [`trace::init_tracing`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod arena;
pub mod config;
pub mod error;
mod index;
mod list;
pub mod queue;
pub mod trace;

pub use config::QueueConfig;
pub use error::{CreateError, PostError};
pub use queue::{Delivery, MessageQueue};

/// Crate version, as reported by Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
