//! # The Contiguous Allocator
//!
//! [`Cma`] hands out physically contiguous, aligned frame ranges from the
//! activated regions. Every bitmap lives behind one FIFO ticket lock; a
//! caller holds it for the whole search-and-migrate loop, which may take a
//! while, so waiters are served strictly in arrival order.

use crate::bitmap::FrameBitmap;
use crate::config::CmaConfig;
use crate::error::{AllocError, MigrateError};
use crate::platform::PageAllocator;
use crate::region::{Owner, Region, RegionId};
use crate::report::RegionReport;
use arrayvec::ArrayVec;
use kernel_info::cma::MAX_CMA_AREAS;
use kernel_memory_addresses::PageFrame;
use kernel_sync::TicketMutex;
use log::{debug, info, warn};

/// A successful allocation: the caller owns `[start, start + count)` until
/// it passes the same pair to [`Cma::release`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Allocation {
    region: RegionId,
    start: PageFrame,
    count: u64,
    align_order: u32,
}

impl Allocation {
    #[must_use]
    pub const fn region(&self) -> RegionId {
        self.region
    }

    #[must_use]
    pub const fn start(&self) -> PageFrame {
        self.start
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Alignment order actually applied, after clamping.
    #[must_use]
    pub const fn align_order(&self) -> u32 {
        self.align_order
    }
}

pub struct Cma<P> {
    config: CmaConfig,
    pages: P,
    regions: ArrayVec<Region, MAX_CMA_AREAS>,
    /// Indexed by [`RegionId`].
    bitmaps: TicketMutex<ArrayVec<FrameBitmap, MAX_CMA_AREAS>>,
}

impl<P: PageAllocator> Cma<P> {
    pub(crate) fn from_parts(
        config: CmaConfig,
        pages: P,
        regions: ArrayVec<Region, MAX_CMA_AREAS>,
        bitmaps: ArrayVec<FrameBitmap, MAX_CMA_AREAS>,
    ) -> Self {
        Self {
            config,
            pages,
            regions,
            bitmaps: TicketMutex::new(bitmaps),
        }
    }

    /// All live regions, in activation order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    #[must_use]
    pub fn default_region(&self) -> Option<&Region> {
        self.regions.iter().find(|r| r.owner() == Owner::Default)
    }

    /// The region serving `owner`: its own, else the default one.
    #[must_use]
    pub fn region_for(&self, owner: Owner) -> Option<&Region> {
        self.regions
            .iter()
            .find(|r| r.owner() == owner)
            .or_else(|| self.default_region())
    }

    #[must_use]
    pub const fn pages(&self) -> &P {
        &self.pages
    }

    /// Largest alignment order [`allocate`](Self::allocate) honours.
    #[must_use]
    pub const fn max_align_order(&self) -> u32 {
        let max = self.config.max_align_order();
        if max < usize::BITS - 1 { max } else { usize::BITS - 1 }
    }

    fn effective_align_order(&self, requested: u32) -> u32 {
        let max = self.max_align_order();
        if requested > max {
            warn!("cma: alignment order {requested} clamped to {max}");
            max
        } else {
            requested
        }
    }

    /// Allocate `count` contiguous frames whose first frame is aligned to
    /// `2^align_order` frames, from the region serving `owner`.
    ///
    /// Movable pages currently occupying the chosen range are migrated away
    /// by the page allocator. This may block for as long as migration takes.
    ///
    /// # Errors
    /// * [`AllocError::ZeroCount`] for `count == 0`.
    /// * [`AllocError::NoRegion`] if neither `owner` nor the default area has a region.
    /// * [`AllocError::InsufficientSpace`] if no suitable free run remains.
    /// * [`AllocError::MigrationFailed`] on a non-retryable migration error.
    pub fn allocate(
        &self,
        owner: Owner,
        count: u64,
        align_order: u32,
    ) -> Result<Allocation, AllocError> {
        if count == 0 {
            return Err(AllocError::ZeroCount);
        }
        let align_order = self.effective_align_order(align_order);
        let region = self.region_for(owner).ok_or(AllocError::NoRegion(owner))?;

        let insufficient = AllocError::InsufficientSpace { count };
        if count > region.frame_count() {
            return Err(insufficient);
        }
        let nr = usize::try_from(count).map_err(|_| insufficient)?;
        let mask = (1u64 << align_order) - 1;
        let align_mask = usize::try_from(mask).map_err(|_| insufficient)?;
        let align_offset =
            usize::try_from(region.base().number() & mask).map_err(|_| insufficient)?;

        let mut bitmaps = self.bitmaps.lock();
        let bitmap = &mut bitmaps[region.id().index()];
        let mut from = 0;
        loop {
            let Some(bit) = bitmap.find_zero_area(from, nr, align_mask, align_offset) else {
                debug!("cma: {}: no free run of {count} frames", region.id());
                return Err(insufficient);
            };
            let start = region.frame_at(bit);
            match self.pages.isolate_range(start, count) {
                Ok(()) => {
                    bitmap.set_range(bit, nr);
                    return Ok(Allocation {
                        region: region.id(),
                        start,
                        count,
                        align_order,
                    });
                }
                Err(MigrateError::Busy) => {
                    debug!("cma: frames {start}+{count} busy, retrying");
                    from = bit + nr;
                }
                Err(err) => {
                    warn!("cma: migrating frames {start}+{count} failed: {err}");
                    return Err(AllocError::MigrationFailed(err));
                }
            }
        }
    }

    /// Return `[start, start + count)` to the region serving `owner`.
    ///
    /// Returns `false` and changes nothing if `count` is zero or the range
    /// does not lie entirely inside that region. Whether the frames were
    /// actually allocated is not checked.
    pub fn release(&self, owner: Owner, start: PageFrame, count: u64) -> bool {
        if count == 0 {
            return false;
        }
        let Some(region) = self.region_for(owner) else {
            return false;
        };
        if !region.contains(start, count) {
            warn!("cma: release of frames {start}+{count} outside {region}");
            return false;
        }

        let first = region.bit_index(start);
        let end = region.bit_index(start + count);
        self.bitmaps.with_lock(|bitmaps| {
            bitmaps[region.id().index()].clear_range(first, end - first);
            self.pages.free_range(start, count);
        });
        true
    }

    /// Snapshot of a region's allocation state.
    ///
    /// Returns `None` for an unknown region or if the snapshot cannot be allocated.
    #[must_use]
    pub fn describe(&self, id: RegionId) -> Option<RegionReport> {
        let region = *self.region(id)?;
        let snapshot = self
            .bitmaps
            .with_lock(|bitmaps| bitmaps[id.index()].try_clone())
            .inspect_err(|_| warn!("cma: no memory for a snapshot of {id}"))
            .ok()?;
        Some(RegionReport::new(region, snapshot))
    }

    /// Write the state of every region to the log.
    pub fn log_report(&self) {
        for region in &self.regions {
            let Some(report) = self.describe(region.id()) else {
                continue;
            };
            info!(
                "{region}: {} used, {} free",
                report.used_frames(),
                report.free_frames()
            );
            for run in report.runs() {
                info!("  {run}");
            }
        }
    }
}
