//! RingSPSC - Wait-Free Single-Producer Single-Consumer Queue
//!
//! A bounded ring buffer moving values from exactly one producer thread to
//! exactly one consumer thread without locks. Every operation finishes in a
//! constant number of steps: `push` reports `false` when the queue is full
//! and `pop` reports `None` when it is empty. What to do then (spin, yield,
//! park) is up to the caller.
//!
//! # Key Features
//!
//! - One algorithm, two storages: [`HeapQueue<T>`] with a runtime capacity,
//!   [`InlineQueue<T, N>`] with a compile-time capacity and no allocation
//! - Release/Acquire cursor handshake, no SeqCst on the hot path
//! - Cursors on separate cache lines (`crossbeam_utils::CachePadded`)
//! - Producer/consumer roles enforced by [`Producer`] and [`Consumer`] handles
//! - Zero-sized element types work as a pure counting primitive
//!
//! # Example
//!
//! ```
//! use ringspsc_rs::{HeapQueue, InlineQueue};
//!
//! // Heap storage, capacity chosen at runtime
//! let mut queue = HeapQueue::<u64>::with_capacity(1024).unwrap();
//! let (mut producer, mut consumer) = queue.split();
//!
//! assert!(producer.push(42));
//! assert_eq!(consumer.peek(), Some(&42));
//! assert_eq!(consumer.pop(), Some(42));
//! assert_eq!(consumer.pop(), None);
//!
//! // Inline storage, no allocation
//! let mut queue: InlineQueue<u32, 16> = InlineQueue::new();
//! let (mut producer, mut consumer) = queue.split();
//! producer.push(7);
//! assert_eq!(consumer.pop(), Some(7));
//! ```

mod config;
mod error;
mod invariants;
mod queue;
mod storage;
mod trace;

pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::{Error, PushError, Result};
pub use queue::{
    Consumer, Drain, HeapQueue, InlineQueue, InlineQueue16K, InlineQueue1K, InlineQueue4K,
    Producer, SpscQueue,
};
pub use storage::{HeapStorage, InlineStorage, Slot, Storage};
pub use trace::init_tracing;
