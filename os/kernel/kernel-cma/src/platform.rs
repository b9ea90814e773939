//! # Platform Collaborators
//!
//! The contiguous allocator does not own physical memory. It reserves it
//! through the early boot memory map, classifies and migrates it through
//! the page allocator, and lets architecture code adjust caching. Each of
//! these is a trait so the allocator can run on any kernel (and under
//! host tests with in-memory doubles).
//!
//! ```text
//!  boot:   EarlyMemoryMap ──reserve──► ReservationRegistry ──► ArchFixup
//!                                             │
//!  init:                          activate_all_pending ──► PageAllocator::release_pageblock
//!                                             │        └─► Introspection
//!  steady:                                   Cma ──► PageAllocator::isolate_range / free_range
//! ```

use crate::error::MigrateError;
use crate::pageblock::PageBlockFlags;
use crate::region::Region;
use kernel_memory_addresses::{PageFrame, PhysicalAddress};

/// Memory zone identifier as assigned by the page allocator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ZoneId(pub u8);

/// The boot-time physical memory map, usable before the page allocator exists.
pub trait EarlyMemoryMap {
    /// Total bytes of physical memory known to the map.
    fn total_memory(&self) -> u64;

    /// Whether any byte of `[base, base + size)` is already claimed.
    fn is_reserved(&self, base: PhysicalAddress, size: u64) -> bool;

    /// Claim exactly `[base, base + size)`. Returns `false` if that is impossible.
    fn reserve(&mut self, base: PhysicalAddress, size: u64) -> bool;

    /// Find and claim a free `size`-byte range aligned to `align` that ends at
    /// or below `limit` (anywhere if `None`).
    fn allocate(
        &mut self,
        size: u64,
        align: u64,
        limit: Option<PhysicalAddress>,
    ) -> Option<PhysicalAddress>;
}

impl<M: EarlyMemoryMap + ?Sized> EarlyMemoryMap for &mut M {
    fn total_memory(&self) -> u64 {
        (**self).total_memory()
    }

    fn is_reserved(&self, base: PhysicalAddress, size: u64) -> bool {
        (**self).is_reserved(base, size)
    }

    fn reserve(&mut self, base: PhysicalAddress, size: u64) -> bool {
        (**self).reserve(base, size)
    }

    fn allocate(
        &mut self,
        size: u64,
        align: u64,
        limit: Option<PhysicalAddress>,
    ) -> Option<PhysicalAddress> {
        (**self).allocate(size, align, limit)
    }
}

/// The general page allocator, once zones and page metadata exist.
///
/// All methods take `&self`: the allocator is shared with every other user
/// of physical memory and does its own locking.
pub trait PageAllocator {
    /// Zone of `frame`, or `None` if the frame has no page metadata.
    fn zone_of(&self, frame: PageFrame) -> Option<ZoneId>;

    /// Hand the pageblock starting at `first` to the allocator as free
    /// pages carrying `flags`.
    fn release_pageblock(&self, first: PageFrame, flags: PageBlockFlags);

    /// Migrate movable data out of `[start, start + count)` and take the
    /// frames out of circulation so the caller owns them.
    ///
    /// # Errors
    /// [`MigrateError::Busy`] when unmovable pages occupy the range; any
    /// other error is not worth retrying elsewhere.
    fn isolate_range(&self, start: PageFrame, count: u64) -> Result<(), MigrateError>;

    /// Return previously isolated frames to general use.
    fn free_range(&self, start: PageFrame, count: u64);
}

impl<P: PageAllocator + ?Sized> PageAllocator for &P {
    fn zone_of(&self, frame: PageFrame) -> Option<ZoneId> {
        (**self).zone_of(frame)
    }

    fn release_pageblock(&self, first: PageFrame, flags: PageBlockFlags) {
        (**self).release_pageblock(first, flags);
    }

    fn isolate_range(&self, start: PageFrame, count: u64) -> Result<(), MigrateError> {
        (**self).isolate_range(start, count)
    }

    fn free_range(&self, start: PageFrame, count: u64) {
        (**self).free_range(start, count);
    }
}

/// Architecture hook run once per successful reservation, e.g. to remap
/// the range with DMA-coherent cache attributes.
pub trait ArchFixup {
    fn fixup(&mut self, base: PhysicalAddress, size: u64);
}

impl ArchFixup for () {
    fn fixup(&mut self, _base: PhysicalAddress, _size: u64) {}
}

impl<A: ArchFixup + ?Sized> ArchFixup for &mut A {
    fn fixup(&mut self, base: PhysicalAddress, size: u64) {
        (**self).fixup(base, size);
    }
}

/// Host introspection surface (debugfs, sysfs, a shell command, ...).
pub trait Introspection {
    /// Called once for each region when it becomes live.
    fn register_region(&mut self, region: &Region);
}

impl Introspection for () {
    fn register_region(&mut self, _region: &Region) {}
}
