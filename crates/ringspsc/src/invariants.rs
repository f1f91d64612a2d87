//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`debug_assert!`), so the wait-free paths pay
//! nothing for them in release builds.

// =============================================================================
// Cursor bounds
// =============================================================================

/// Assert that a cursor lies inside the slot buffer.
///
/// **Invariant**: `0 ≤ cursor < slots` (i.e. `[0, N]` for `N + 1` slots)
///
/// Used in: `push()` and `pop()` after loading their own cursor
macro_rules! debug_assert_cursor_in_bounds {
    ($name:literal, $cursor:expr, $slots:expr) => {
        debug_assert!(
            $cursor < $slots,
            "{} cursor {} out of bounds for {} slots",
            $name,
            $cursor,
            $slots
        )
    };
}

// =============================================================================
// Live slot check
// =============================================================================

/// Assert that the front slot holds a live value before it is borrowed.
///
/// **Invariant**: `read_index != write_index` ⟺ `buffer[read_index]` is initialized
///
/// Used in: `peek_unchecked()`
macro_rules! debug_assert_front_live {
    ($read:expr, $write:expr) => {
        debug_assert!(
            $read != $write,
            "peek on empty queue: read cursor {} == write cursor {}",
            $read,
            $write
        )
    };
}

// =============================================================================
// Storage shape
// =============================================================================

/// Assert that storage provides room for at least one value plus the
/// reserved slot.
///
/// Used in: `SpscQueue::from_storage()`
macro_rules! debug_assert_min_slots {
    ($slots:expr) => {
        debug_assert!(
            $slots >= 2,
            "storage must provide at least 2 slots, got {}",
            $slots
        )
    };
}

pub(crate) use debug_assert_cursor_in_bounds;
pub(crate) use debug_assert_front_live;
pub(crate) use debug_assert_min_slots;
