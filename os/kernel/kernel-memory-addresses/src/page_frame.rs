use crate::{PageSize, PhysicalAddress, Size4K};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Physical page frame number (PFN) of a 4 KiB frame.
///
/// Frame `n` covers the physical bytes `[n * 4096, (n + 1) * 4096)`.
/// Contiguous allocators hand out runs of frames, so arithmetic on frame
/// numbers is the common currency between the bitmap and the page allocator.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::*;
/// let f = PageFrame::new(0x400);
/// assert_eq!(f.base().as_u64(), 0x0040_0000);
/// assert!(f.is_aligned_to_order(10));
/// assert!(!(f + 1).is_aligned_to_order(1));
/// assert_eq!((f + 8).offset_from(f), Some(8));
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageFrame(u64);

impl PageFrame {
    #[inline]
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// The frame containing `addr`.
    #[inline]
    #[must_use]
    pub const fn containing(addr: PhysicalAddress) -> Self {
        addr.frame()
    }

    #[inline]
    #[must_use]
    pub const fn number(self) -> u64 {
        self.0
    }

    /// First byte of this frame.
    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 << Size4K::SHIFT)
    }

    /// `true` if the frame number is a multiple of `2^order`.
    #[inline]
    #[must_use]
    pub const fn is_aligned_to_order(self, order: u32) -> bool {
        order >= u64::BITS || self.0 & ((1 << order) - 1) == 0
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, frames: u64) -> Option<Self> {
        match self.0.checked_add(frames) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn checked_sub(self, frames: u64) -> Option<Self> {
        match self.0.checked_sub(frames) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Number of frames from `origin` to `self`, or `None` if `self` lies below it.
    #[inline]
    #[must_use]
    pub const fn offset_from(self, origin: Self) -> Option<u64> {
        self.0.checked_sub(origin.0)
    }
}

impl fmt::Debug for PageFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PFN({:#x})", self.0)
    }
}

impl fmt::Display for PageFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Add<u64> for PageFrame {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for PageFrame {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
