//! # Memory Geometry

use kernel_memory_addresses::{PageSize, Size4K};

/// Size of one page frame in bytes.
pub const PAGE_SIZE: u64 = Size4K::SIZE;

/// Number of buddy orders; the largest buddy block is `2^(MAX_ORDER - 1)` pages.
pub const MAX_ORDER: u32 = 11;

/// Order of a pageblock, the unit in which migrate types are assigned.
pub const PAGEBLOCK_ORDER: u32 = MAX_ORDER - 1;

/// Number of page frames in one pageblock.
pub const PAGEBLOCK_FRAMES: u64 = 1 << PAGEBLOCK_ORDER;

/// Alignment applied to every contiguous reservation (base and size).
///
/// A reservation aligned like this always starts and ends on a pageblock
/// boundary and on the largest buddy block boundary, so it can be handed to
/// the page allocator whole.
pub const RESERVATION_ALIGNMENT: u64 = PAGE_SIZE << max_u32(MAX_ORDER - 1, PAGEBLOCK_ORDER);

const fn max_u32(a: u32, b: u32) -> u32 {
    if a > b { a } else { b }
}

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(PAGEBLOCK_ORDER < MAX_ORDER);
    assert!(RESERVATION_ALIGNMENT.is_power_of_two());
    assert!(RESERVATION_ALIGNMENT >= PAGE_SIZE * PAGEBLOCK_FRAMES);
};
