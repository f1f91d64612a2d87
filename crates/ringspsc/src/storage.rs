//! Backing slot buffers for [`SpscQueue`](crate::SpscQueue).
//!
//! Two storages implement [`Storage`]:
//!
//! - [`HeapStorage<T>`]: a boxed slice sized at construction time.
//! - [`InlineStorage<T, N>`]: slots embedded directly in the value, sized by
//!   a const parameter. No allocation, `const fn` construction.
//!
//! Both always hold one slot more than their usable capacity. The extra
//! slot is never live at the same time as all the others; it is what lets
//! the queue tell a full ring from an empty one by comparing cursors.
//!
//! Storages never drop element values. They only know how many slots there
//! are, not which of them are live; the queue owns that bookkeeping.

use crate::error::{Error, Result};
use crate::trace::{debug, warn};
use crate::Config;

use std::cell::UnsafeCell;
use std::mem::{self, MaybeUninit};

/// One ring slot: interior-mutable, possibly uninitialized.
pub type Slot<T> = UnsafeCell<MaybeUninit<T>>;

/// Contiguous slots of known, fixed length.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - `slots()` returns the same slice (same address, same length) for the
///   whole lifetime of the storage value,
/// - `slots()` may be called from the producer and consumer threads at the
///   same time (it must not touch unsynchronized state of its own), and
/// - the slice holds at least 2 slots.
///
/// The queue indexes the slice without bounds checks based on these
/// guarantees.
pub unsafe trait Storage<T> {
    /// The slot buffer. Its length is `capacity + 1`.
    fn slots(&self) -> &[Slot<T>];
}

// =============================================================================
// HEAP STORAGE
// =============================================================================

/// Heap-allocated slot buffer with a runtime capacity.
///
/// Uses `Box<[Slot<T>]>`: the length is fixed at construction and the
/// buffer is released exactly once when the storage is dropped.
///
/// For zero-sized `T` no bytes are allocated, but the slice length still
/// reports `capacity + 1` and drives all indexing.
pub struct HeapStorage<T> {
    slots: Box<[Slot<T>]>,
}

impl<T> HeapStorage<T> {
    /// Allocates `capacity + 1` slots (`capacity` 0 is treated as 1).
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(Config::new(capacity))
    }

    /// Allocates the slots described by `config`.
    pub fn with_config(config: Config) -> Result<Self> {
        let requested = config.capacity;
        let slots = config
            .slots()
            .ok_or(Error::CapacityOverflow { requested })?;

        let fits = mem::size_of::<Slot<T>>()
            .checked_mul(slots)
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(Error::CapacityOverflow { requested });
        }

        let mut buffer: Vec<Slot<T>> = Vec::new();
        if let Err(source) = buffer.try_reserve_exact(slots) {
            warn!(slots, error = %source, "ring slot allocation failed");
            return Err(Error::Alloc { slots, source });
        }
        buffer.resize_with(slots, || UnsafeCell::new(MaybeUninit::uninit()));

        debug!(
            slots,
            bytes = slots * mem::size_of::<T>(),
            "allocated heap ring storage"
        );
        Ok(Self {
            slots: buffer.into_boxed_slice(),
        })
    }
}

// SAFETY: the boxed slice is never reallocated, `slots()` only reads the
// box pointer and length, and `with_config` always allocates
// `effective_capacity() + 1 >= 2` slots.
unsafe impl<T> Storage<T> for HeapStorage<T> {
    #[inline]
    fn slots(&self) -> &[Slot<T>] {
        &self.slots
    }
}

// =============================================================================
// INLINE STORAGE
// =============================================================================

/// Inline slot buffer with compile-time capacity `N`.
///
/// Holds `N + 1` slots laid out contiguously: the `#[repr(C)]` layout puts
/// `spare` immediately after `slots`, and both have the same element type,
/// so there is no padding between them.
///
/// ```text
/// ┌──────────────────────────────────────────┬───────┐
/// │ slots: [Slot<T>; N]                      │ spare │
/// └──────────────────────────────────────────┴───────┘
///   index 0 .. N-1                             index N
/// ```
///
/// `N == 0` is rejected at compile time.
#[repr(C)]
pub struct InlineStorage<T, const N: usize> {
    slots: [Slot<T>; N],
    spare: Slot<T>,
}

impl<T, const N: usize> InlineStorage<T, N> {
    const NON_EMPTY: () = assert!(N > 0, "InlineStorage capacity must be > 0");

    /// Creates storage with every slot logically empty.
    pub const fn new() -> Self {
        // Compile-time assertion
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;

        Self {
            slots: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
            spare: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

impl<T, const N: usize> Default for InlineStorage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: the slots live inside `self`, so the slice is stable while `self`
// is borrowed, `slots()` is pure address arithmetic, and `N > 0` is asserted
// at compile time in `new`.
unsafe impl<T, const N: usize> Storage<T> for InlineStorage<T, N> {
    #[inline]
    fn slots(&self) -> &[Slot<T>] {
        // SAFETY: `#[repr(C)]` places `spare` directly after `slots` with no
        // padding (same element type), the pointer is derived from `self` so
        // it covers both fields, and `Slot<T>` is valid for any bit pattern.
        unsafe { std::slice::from_raw_parts((self as *const Self).cast::<Slot<T>>(), N + 1) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_storage_allocates_capacity_plus_one() {
        let storage = HeapStorage::<u64>::new(16).unwrap();
        assert_eq!(storage.slots().len(), 17);
    }

    #[test]
    fn test_heap_storage_zero_capacity_clamped() {
        let storage = HeapStorage::<u64>::new(0).unwrap();
        assert_eq!(storage.slots().len(), 2);
    }

    #[test]
    fn test_heap_storage_zero_sized_type_tracks_length() {
        let storage = HeapStorage::<()>::new(1_000).unwrap();
        assert_eq!(storage.slots().len(), 1_001);
    }

    #[test]
    fn test_heap_storage_overflow() {
        let err = HeapStorage::<u64>::new(usize::MAX).err().unwrap();
        assert_eq!(err, Error::CapacityOverflow { requested: usize::MAX });

        // Fits in usize slots but not in isize::MAX bytes
        let err = HeapStorage::<u64>::new(usize::MAX / 4).err().unwrap();
        assert_eq!(err, Error::CapacityOverflow { requested: usize::MAX / 4 });
    }

    #[test]
    fn test_inline_storage_is_contiguous() {
        let storage = InlineStorage::<u32, 7>::new();
        let slots = storage.slots();
        assert_eq!(slots.len(), 8);

        let base = slots.as_ptr() as usize;
        let spare = std::ptr::addr_of!(storage.spare) as usize;
        assert_eq!(spare - base, 7 * mem::size_of::<Slot<u32>>());
    }

    #[test]
    fn test_inline_storage_size_has_no_overhead() {
        assert_eq!(
            mem::size_of::<InlineStorage<u64, 15>>(),
            16 * mem::size_of::<u64>()
        );
        assert_eq!(mem::size_of::<InlineStorage<(), 15>>(), 0);
    }

    #[test]
    fn test_inline_storage_zero_sized_type() {
        let storage = InlineStorage::<(), 3>::new();
        assert_eq!(storage.slots().len(), 4);
    }
}
