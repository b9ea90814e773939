//! # Pageblock Classification
//!
//! The page allocator tracks one small flag word per pageblock
//! (`2^PAGEBLOCK_ORDER` frames). Its migrate type decides what may be
//! placed there: contiguous areas are released as [`MigrateType::Cma`], so
//! the page allocator only puts *movable* data into them and the
//! contiguous allocator can always evict it again.

use bitfield_struct::bitfield;

/// Mobility class of a pageblock.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum MigrateType {
    /// Pinned kernel allocations.
    Unmovable = 0,
    /// User pages and page cache; relocatable.
    Movable = 1,
    /// Caches that can be dropped on demand.
    Reclaimable = 2,
    /// Reserved for contiguous allocations; movable data only.
    Cma = 3,
    /// Temporarily withdrawn while a range is being migrated.
    Isolate = 4,
}

impl MigrateType {
    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decode three bits; unknown encodings read as [`MigrateType::Unmovable`].
    #[inline]
    #[must_use]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b111 {
            1 => Self::Movable,
            2 => Self::Reclaimable,
            3 => Self::Cma,
            4 => Self::Isolate,
            _ => Self::Unmovable,
        }
    }
}

/// Per-pageblock flag word handed to the page allocator.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct PageBlockFlags {
    /// Bits 0-2: migrate type.
    #[bits(3, default = MigrateType::Unmovable)]
    pub migrate_type: MigrateType,

    /// Bits 3-7: reserved.
    #[bits(5)]
    __: u8,
}

impl PageBlockFlags {
    /// Flags for a pageblock that belongs to a contiguous area.
    #[inline]
    #[must_use]
    pub const fn cma() -> Self {
        Self::new().with_migrate_type(MigrateType::Cma)
    }
}
