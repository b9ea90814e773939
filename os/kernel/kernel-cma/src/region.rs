//! # Regions and Owners

use core::fmt;
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{PageFrame, PhysicalAddress};

/// Identifier of a device that may own a dedicated contiguous area.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device {}", self.0)
    }
}

/// Who a region is dedicated to.
///
/// A device without a region of its own is served from the default region.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Owner {
    #[default]
    Default,
    Device(DeviceId),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default area"),
            Self::Device(dev) => fmt::Display::fmt(dev, f),
        }
    }
}

impl From<DeviceId> for Owner {
    fn from(dev: DeviceId) -> Self {
        Self::Device(dev)
    }
}

/// Index of a region in the allocator's arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RegionId(usize);

impl RegionId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cma{}", self.0)
    }
}

/// One activated, physically contiguous range of page frames.
///
/// The geometry is immutable once activated. The matching allocation
/// bitmap lives behind the allocator's lock, not here.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Region {
    id: RegionId,
    base: PageFrame,
    frame_count: u64,
    owner: Owner,
}

impl Region {
    pub(crate) const fn new(id: RegionId, base: PageFrame, frame_count: u64, owner: Owner) -> Self {
        Self {
            id,
            base,
            frame_count,
            owner,
        }
    }

    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    #[must_use]
    pub const fn base(&self) -> PageFrame {
        self.base
    }

    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.owner
    }

    /// First frame past the region.
    #[must_use]
    pub const fn end(&self) -> PageFrame {
        PageFrame::new(self.base.number() + self.frame_count)
    }

    #[must_use]
    pub const fn base_address(&self) -> PhysicalAddress {
        self.base.base()
    }

    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.frame_count * PAGE_SIZE
    }

    /// `true` if `[start, start + count)` lies entirely inside this region.
    #[must_use]
    pub const fn contains(&self, start: PageFrame, count: u64) -> bool {
        let Some(offset) = start.offset_from(self.base) else {
            return false;
        };
        match offset.checked_add(count) {
            Some(end) => end <= self.frame_count,
            None => false,
        }
    }

    /// Bitmap index of `frame`, which must lie inside the region or at its end.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn bit_index(&self, frame: PageFrame) -> usize {
        // Activation rejects regions whose frame count does not fit `usize`.
        (frame.number() - self.base.number()) as usize
    }

    pub(crate) const fn frame_at(&self, bit: usize) -> PageFrame {
        PageFrame::new(self.base.number() + bit as u64)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): frames {}..{} ({} MiB at {})",
            self.id,
            self.owner,
            self.base,
            self.end(),
            self.size_bytes() / kernel_info::cma::SZ_1M,
            self.base_address()
        )
    }
}
