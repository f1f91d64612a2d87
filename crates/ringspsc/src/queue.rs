use crate::error::{PushError, Result};
use crate::invariants::{
    debug_assert_cursor_in_bounds, debug_assert_front_live, debug_assert_min_slots,
};
use crate::storage::{HeapStorage, InlineStorage, Slot, Storage};
use crate::trace::{debug, trace};
use crate::Config;

use crossbeam_utils::CachePadded;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// The buffer has `N + 1` slots for a usable capacity of `N`. Cursors are
// plain slot indices in `[0, N]` that wrap to 0 after the last slot; the
// spare slot lets full and empty be told apart by comparing them:
//
//   empty  ⟺  write == read
//   full   ⟺  next(write) == read
//
// ## Memory Ordering Protocol
//
// **Producer (push):**
// 1. Load `write_index` with Relaxed (only the producer writes it)
// 2. Load `read_index` with Acquire (synchronizes with the consumer's
//    Release store, so the slot it freed is really free)
// 3. Write the value into `buffer[write]` (no ordering needed - protocol)
// 4. Store `write_index` with Release (publishes the value)
//
// **Consumer (pop):**
// 1. Load `read_index` with Relaxed (only the consumer writes it)
// 2. Load `write_index` with Acquire (synchronizes with the producer's
//    Release store, so the value in `buffer[read]` is visible)
// 3. Move the value out of `buffer[read]`
// 4. Store `read_index` with Release (hands the slot back to the producer)
//
// ## Single-Writer Invariants
//
// - `write_index`: written only by the `Producer` handle
// - `read_index`: written only by the `Consumer` handle
// - `buffer[i]`: written by the producer while `i` is outside
//   `[read, write)`, read by the consumer while `i` is inside it
//
// `split()` takes `&mut self` and hands out one handle per side, so these
// invariants hold for safe code.
//
// =============================================================================

/// Wait-free bounded SPSC queue, generic over its slot storage.
///
/// Use the aliases [`HeapQueue`] (runtime capacity) and [`InlineQueue`]
/// (compile-time capacity, no allocation) rather than naming `S` directly.
///
/// # Memory Layout
///
/// ```text
/// ┌────────────────────────────────────────────────────────────────────┐
/// │ write_index: CachePadded<AtomicUsize>  ← Producer writes           │
/// ├────────────────────────────────────────────────────────────────────┤
/// │ read_index: CachePadded<AtomicUsize>   ← Consumer writes           │
/// ├────────────────────────────────────────────────────────────────────┤
/// │ storage: S   (pointer to heap slots, or the slots themselves)      │
/// └────────────────────────────────────────────────────────────────────┘
/// ```
///
/// # Example
///
/// ```
/// use ringspsc_rs::HeapQueue;
///
/// let mut queue = HeapQueue::<u64>::with_capacity(4).unwrap();
/// let (mut producer, mut consumer) = queue.split();
///
/// std::thread::scope(|s| {
///     s.spawn(move || {
///         for i in 0..100 {
///             while !producer.push(i) {
///                 std::hint::spin_loop();
///             }
///         }
///     });
///
///     let mut expected = 0;
///     while expected < 100 {
///         if let Some(v) = consumer.pop() {
///             assert_eq!(v, expected);
///             expected += 1;
///         }
///     }
/// });
/// ```
#[repr(C)]
pub struct SpscQueue<T, S: Storage<T>> {
    /// Next slot to write (written by producer, read by consumer)
    write_index: CachePadded<AtomicUsize>,
    /// Next slot to read (written by consumer, read by producer)
    read_index: CachePadded<AtomicUsize>,
    storage: S,
    _marker: PhantomData<T>,
}

// Safety: the queue is Sync as long as T is Send.
// Each slot is accessed by exactly one side at a time, and ownership of a
// slot changes hands only through the Release/Acquire cursor handshake.
// `Storage` implementors guarantee `slots()` may be called from both sides
// at once.
unsafe impl<T: Send, S: Storage<T> + Send> Sync for SpscQueue<T, S> {}

/// Opts a role handle out of `Sync`.
///
/// `&Consumer` exposes `&T` through `peek`; sharing it between threads would
/// give two threads `&T` to a value that may not be `Sync`.
type NotSync = PhantomData<*const ()>;

/// Heap-backed queue with a capacity chosen at construction.
pub type HeapQueue<T> = SpscQueue<T, HeapStorage<T>>;

/// Inline queue holding `N` values without any allocation.
pub type InlineQueue<T, const N: usize> = SpscQueue<T, InlineStorage<T, N>>;

/// 1K usable slots, inline (~8KB for u64)
pub type InlineQueue1K<T> = InlineQueue<T, 1023>;

/// 4K usable slots, inline; fits in L1 cache (~32KB for u64)
pub type InlineQueue4K<T> = InlineQueue<T, 4095>;

/// 16K usable slots, inline (~128KB for u64, mind the thread stack size)
pub type InlineQueue16K<T> = InlineQueue<T, 16383>;

impl<T> SpscQueue<T, HeapStorage<T>> {
    /// Creates a queue that can hold `capacity` values.
    ///
    /// Allocates `capacity + 1` slots. A capacity of 0 is treated as 1.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(Config::new(capacity))
    }

    /// Creates a queue from a [`Config`].
    pub fn with_config(config: Config) -> Result<Self> {
        HeapStorage::with_config(config).map(Self::from_storage)
    }
}

impl<T, const N: usize> SpscQueue<T, InlineStorage<T, N>> {
    /// Creates an empty inline queue of capacity `N`.
    ///
    /// Usable in `const` and `static` initializers. Fails to compile when
    /// `N == 0`.
    pub const fn new() -> Self {
        Self {
            write_index: CachePadded::new(AtomicUsize::new(0)),
            read_index: CachePadded::new(AtomicUsize::new(0)),
            storage: InlineStorage::new(),
            _marker: PhantomData,
        }
    }
}

impl<T, const N: usize> Default for SpscQueue<T, InlineStorage<T, N>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Storage<T>> SpscQueue<T, S> {
    /// Wraps an empty storage in a queue.
    pub fn from_storage(storage: S) -> Self {
        debug_assert_min_slots!(storage.slots().len());
        Self {
            write_index: CachePadded::new(AtomicUsize::new(0)),
            read_index: CachePadded::new(AtomicUsize::new(0)),
            storage,
            _marker: PhantomData,
        }
    }

    // ---------------------------------------------------------------------
    // CAPACITY & STATUS
    // ---------------------------------------------------------------------

    /// Number of values the queue can hold (`slots - 1`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slot_count() - 1
    }

    #[inline]
    fn slot_count(&self) -> usize {
        self.storage.slots().len()
    }

    #[inline]
    fn next_index(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slot_count() {
            0
        } else {
            next
        }
    }

    /// Number of values ready to pop.
    ///
    /// Exact only when called from the consumer side; anywhere else it is a
    /// snapshot that may already be stale when it returns.
    #[inline]
    pub fn read_available(&self) -> usize {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Relaxed);
        if write >= read {
            write - read
        } else {
            write + self.slot_count() - read
        }
    }

    /// Number of values that can be pushed before the queue is full.
    ///
    /// Exact only when called from the producer side; anywhere else it is a
    /// snapshot that may already be stale when it returns.
    #[inline]
    pub fn write_available(&self) -> usize {
        let write = self.write_index.load(Ordering::Relaxed);
        let read = self.read_index.load(Ordering::Acquire);
        if write < read {
            read - write - 1
        } else {
            self.slot_count() - write + read - 1
        }
    }

    /// Returns true if the queue held no values at the time of the call.
    ///
    /// Advisory only: never use it in place of the result of `push`/`pop`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.write_index.load(Ordering::Relaxed) == self.read_index.load(Ordering::Relaxed)
    }

    /// Returns true if no slot was free at the time of the call. Advisory.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.write_available() == 0
    }

    // ---------------------------------------------------------------------
    // ROLE HANDLES
    // ---------------------------------------------------------------------

    /// Splits the queue into its producer and consumer halves.
    ///
    /// The handles borrow the queue; move each one to its own thread (for
    /// example with [`std::thread::scope`]).
    pub fn split(&mut self) -> (Producer<'_, T, S>, Consumer<'_, T, S>) {
        let queue = &*self;
        (
            Producer {
                queue,
                _not_sync: PhantomData,
            },
            Consumer {
                queue,
                _not_sync: PhantomData,
            },
        )
    }

    /// Creates a producer handle from a shared reference.
    ///
    /// Lets queues living in a `static` be used without `split`.
    ///
    /// # Safety
    ///
    /// No other `Producer` for this queue may be alive at the same time.
    pub unsafe fn producer_unchecked(&self) -> Producer<'_, T, S> {
        Producer {
            queue: self,
            _not_sync: PhantomData,
        }
    }

    /// Creates a consumer handle from a shared reference.
    ///
    /// # Safety
    ///
    /// No other `Consumer` for this queue may be alive at the same time.
    pub unsafe fn consumer_unchecked(&self) -> Consumer<'_, T, S> {
        Consumer {
            queue: self,
            _not_sync: PhantomData,
        }
    }

    // ---------------------------------------------------------------------
    // LIFECYCLE
    // ---------------------------------------------------------------------

    /// Empties the queue and rewinds both cursors to slot 0.
    ///
    /// Values still in the queue are dropped. Requires `&mut self`, so no
    /// producer or consumer can be running concurrently.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn reset(&mut self) {
        let dropped = self.drop_live();
        *self.write_index.get_mut() = 0;
        *self.read_index.get_mut() = 0;
        debug!(dropped, capacity = self.capacity(), "queue reset");
    }

    /// Drops every value in `[read, write)`. Returns how many were dropped.
    fn drop_live(&mut self) -> usize {
        let write = *self.write_index.get_mut();
        let mut read = *self.read_index.get_mut();
        let mut dropped = 0;

        while read != write {
            // SAFETY: `&mut self` excludes both handles, and every slot in
            // `[read, write)` holds an initialized value that has not been
            // moved out.
            unsafe {
                (*self.storage.slots()[read].get()).assume_init_drop();
            }
            read = self.next_index(read);
            dropped += 1;
        }

        *self.read_index.get_mut() = read;
        dropped
    }

    // ---------------------------------------------------------------------
    // PRODUCER SIDE
    // ---------------------------------------------------------------------

    /// # Safety
    ///
    /// Must only be called by the single producer.
    #[inline]
    unsafe fn push_slot(&self, item: T) -> std::result::Result<(), T> {
        let slots = self.storage.slots();
        let write = self.write_index.load(Ordering::Relaxed);
        debug_assert_cursor_in_bounds!("write", write, slots.len());

        let next = self.next_index(write);
        if next == self.read_index.load(Ordering::Acquire) {
            return Err(item);
        }

        // SAFETY: `write` is in bounds, and the slot is outside
        // `[read, write)`, so the consumer will not touch it until the
        // Release store below publishes it.
        unsafe {
            (*slot(slots, write).get()).write(item);
        }
        self.write_index.store(next, Ordering::Release);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // CONSUMER SIDE
    // ---------------------------------------------------------------------

    /// # Safety
    ///
    /// Must only be called by the single consumer.
    #[inline]
    unsafe fn pop_slot(&self) -> Option<T> {
        let slots = self.storage.slots();
        let read = self.read_index.load(Ordering::Relaxed);
        debug_assert_cursor_in_bounds!("read", read, slots.len());

        if read == self.write_index.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: the Acquire load above synchronizes with the producer's
        // Release store, so the value in `buffer[read]` is initialized and
        // visible. The producer will not reuse the slot until `read_index`
        // moves past it.
        let item = unsafe { (*slot(slots, read).get()).assume_init_read() };
        self.read_index.store(self.next_index(read), Ordering::Release);
        Some(item)
    }

    /// # Safety
    ///
    /// Must only be called by the single consumer.
    #[inline]
    unsafe fn front(&self) -> Option<&T> {
        let slots = self.storage.slots();
        let read = self.read_index.load(Ordering::Relaxed);
        if read == self.write_index.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: same reasoning as `pop_slot`; the value stays in place
        // until the consumer advances `read_index`.
        Some(unsafe { (*slot(slots, read).get()).assume_init_ref() })
    }

    /// # Safety
    ///
    /// Must only be called by the single consumer, after it observed
    /// `read_available() > 0`.
    #[inline]
    unsafe fn front_unchecked(&self) -> &T {
        let slots = self.storage.slots();
        let read = self.read_index.load(Ordering::Relaxed);
        debug_assert_front_live!(read, self.write_index.load(Ordering::Relaxed));

        // SAFETY: the caller's earlier `read_available()` performed the
        // Acquire load that made this slot visible.
        unsafe { (*slot(slots, read).get()).assume_init_ref() }
    }
}

/// Unchecked slot lookup. Callers guarantee `index < slots.len()`.
#[inline]
unsafe fn slot<T>(slots: &[Slot<T>], index: usize) -> &Slot<T> {
    debug_assert!(index < slots.len());
    // SAFETY: guaranteed by the caller
    unsafe { slots.get_unchecked(index) }
}

impl<T, S: Storage<T>> Drop for SpscQueue<T, S> {
    fn drop(&mut self) {
        let dropped = self.drop_live();
        if dropped > 0 {
            trace!(dropped, "dropped live values with queue");
        }
    }
}

impl<T, S: Storage<T>> fmt::Debug for SpscQueue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscQueue")
            .field("capacity", &self.capacity())
            .field("write_index", &self.write_index.load(Ordering::Relaxed))
            .field("read_index", &self.read_index.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PRODUCER HANDLE
// =============================================================================

/// The producer half of an [`SpscQueue`].
///
/// Only one exists per queue; `push` takes `&mut self` so the handle cannot
/// be used from two threads at once. The handle is `Send` but not `Sync`:
///
/// ```compile_fail
/// use ringspsc_rs::HeapQueue;
///
/// fn assert_sync<T: Sync>(_: &T) {}
///
/// let mut queue = HeapQueue::<u64>::with_capacity(4).unwrap();
/// let (producer, _consumer) = queue.split();
/// assert_sync(&producer);
/// ```
pub struct Producer<'a, T, S: Storage<T>> {
    queue: &'a SpscQueue<T, S>,
    _not_sync: NotSync,
}

// Safety: moving the handle moves the producer role; the queue it points to
// is Sync under the same bounds.
unsafe impl<T: Send, S: Storage<T> + Send> Send for Producer<'_, T, S> {}

impl<T, S: Storage<T>> Producer<'_, T, S> {
    /// Pushes `item`. Returns `false` (and drops `item`) if the queue is full.
    ///
    /// Wait-free: never loops, never blocks.
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        self.try_push(item).is_ok()
    }

    /// Pushes `item`, handing it back inside the error if the queue is full.
    #[inline]
    pub fn try_push(&mut self, item: T) -> std::result::Result<(), PushError<T>> {
        // SAFETY: this handle is the only producer
        unsafe { self.queue.push_slot(item) }.map_err(PushError)
    }

    /// Free slots as seen by the producer. Exact from this side.
    #[inline]
    pub fn write_available(&self) -> usize {
        self.queue.write_available()
    }

    /// Returns true if the next `push` would fail (unless the consumer pops first).
    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Queue capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

impl<T, S: Storage<T>> fmt::Debug for Producer<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("write_available", &self.write_available())
            .finish()
    }
}

// =============================================================================
// CONSUMER HANDLE
// =============================================================================

/// The consumer half of an [`SpscQueue`].
///
/// `Send` but not `Sync`, so a `&T` from [`peek`](Consumer::peek) stays on
/// the consumer's thread even when `T` itself is not `Sync`:
///
/// ```compile_fail
/// use ringspsc_rs::HeapQueue;
/// use std::cell::Cell;
///
/// let mut queue = HeapQueue::<Cell<u64>>::with_capacity(4).unwrap();
/// let (_producer, consumer) = queue.split();
/// let consumer = &consumer;
///
/// std::thread::scope(|s| {
///     s.spawn(move || consumer.peek().map(|c| c.set(1)));
///     consumer.peek().map(|c| c.set(2));
/// });
/// ```
pub struct Consumer<'a, T, S: Storage<T>> {
    queue: &'a SpscQueue<T, S>,
    _not_sync: NotSync,
}

// Safety: moving the handle moves the consumer role; the queue it points to
// is Sync under the same bounds.
unsafe impl<T: Send, S: Storage<T> + Send> Send for Consumer<'_, T, S> {}

impl<T, S: Storage<T>> Consumer<'_, T, S> {
    /// Pops the oldest value, or `None` if the queue is empty.
    ///
    /// Wait-free: never loops, never blocks.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: this handle is the only consumer
        unsafe { self.queue.pop_slot() }
    }

    /// Borrows the oldest value without removing it.
    ///
    /// The borrow keeps `pop` from being called until it ends, so the
    /// reference can never dangle.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        // SAFETY: this handle is the only consumer
        unsafe { self.queue.front() }
    }

    /// Borrows the oldest value without checking that there is one.
    ///
    /// # Safety
    ///
    /// `read_available()` must have returned a non-zero value on this
    /// consumer since the last `pop`. Checked only in debug builds.
    #[inline]
    pub unsafe fn peek_unchecked(&self) -> &T {
        // SAFETY: forwarded to the caller
        unsafe { self.queue.front_unchecked() }
    }

    /// Values ready to pop. Exact from this side.
    #[inline]
    pub fn read_available(&self) -> usize {
        self.queue.read_available()
    }

    /// Returns true if the queue held no values at the time of the call.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Iterator that pops until the queue is observed empty.
    pub fn drain(&mut self) -> Drain<'_, T, S> {
        Drain { queue: self.queue }
    }
}

impl<T, S: Storage<T>> fmt::Debug for Consumer<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("read_available", &self.read_available())
            .finish()
    }
}

/// Iterator returned by [`Consumer::drain`].
///
/// Borrows the consumer mutably, so it is the only thing popping while it
/// lives. Stops at the first empty observation; values pushed afterwards
/// stay in the queue. A producer pushing while the drain runs can keep it
/// going past `capacity` values, so there is no upper bound on its length.
pub struct Drain<'c, T, S: Storage<T>> {
    queue: &'c SpscQueue<T, S>,
}

impl<T, S: Storage<T>> Iterator for Drain<'_, T, S> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        // SAFETY: created from `&mut Consumer`, the only consumer
        unsafe { self.queue.pop_slot() }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.read_available(), None)
    }
}
