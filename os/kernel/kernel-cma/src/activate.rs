//! # Region Activation
//!
//! Turns the boot-time reservation table into a live allocator once the
//! page allocator knows about zones and page metadata.

use crate::bitmap::FrameBitmap;
use crate::cma::Cma;
use crate::error::ActivateError;
use crate::pageblock::PageBlockFlags;
use crate::platform::{ArchFixup, EarlyMemoryMap, Introspection, PageAllocator};
use crate::region::{Region, RegionId};
use crate::registry::{PendingReservation, ReservationRegistry};
use arrayvec::ArrayVec;
use kernel_info::cma::MAX_CMA_AREAS;
use kernel_info::memory::{PAGE_SIZE, PAGEBLOCK_FRAMES};
use kernel_memory_addresses::PageFrame;
use log::{error, info};

/// Reservations that could not be activated, with the reason.
pub type DroppedReservations = ArrayVec<(PendingReservation, ActivateError), MAX_CMA_AREAS>;

impl<M: EarlyMemoryMap, A: ArchFixup> ReservationRegistry<M, A> {
    /// Activate every pending reservation, in declaration order.
    ///
    /// A reservation that fails validation is logged and dropped without
    /// touching its pages; the others still become regions. The returned
    /// [`Cma`] only ever contains fully constructed regions.
    pub fn activate_all_pending<P, I>(
        self,
        pages: P,
        introspection: &mut I,
    ) -> (Cma<P>, DroppedReservations)
    where
        P: PageAllocator,
        I: Introspection + ?Sized,
    {
        let (config, pending) = self.into_parts();
        let mut regions = ArrayVec::new();
        let mut bitmaps = ArrayVec::new();
        let mut dropped = DroppedReservations::new();

        for reservation in pending {
            let id = RegionId::new(regions.len());
            match activate_one(&pages, id, &reservation) {
                Ok((region, bitmap)) => {
                    info!("cma: activated {region}");
                    introspection.register_region(&region);
                    regions.push(region);
                    bitmaps.push(bitmap);
                }
                Err(err) => {
                    error!(
                        "cma: dropping reservation at {} for {}: {err}",
                        reservation.start(),
                        reservation.owner()
                    );
                    dropped.push((reservation, err));
                }
            }
        }

        (Cma::from_parts(config, pages, regions, bitmaps), dropped)
    }
}

fn activate_one<P: PageAllocator>(
    pages: &P,
    id: RegionId,
    reservation: &PendingReservation,
) -> Result<(Region, FrameBitmap), ActivateError> {
    let base = reservation.start().frame();
    let frame_count = reservation.size() / PAGE_SIZE;

    check_single_zone(pages, base, frame_count)?;

    let bits = usize::try_from(frame_count).map_err(|_| ActivateError::OutOfMemory)?;
    let bitmap = FrameBitmap::try_new(bits).map_err(|_| ActivateError::OutOfMemory)?;

    let flags = PageBlockFlags::cma();
    let mut block = 0;
    while block < frame_count {
        pages.release_pageblock(base + block, flags);
        block += PAGEBLOCK_FRAMES;
    }

    Ok((
        Region::new(id, base, frame_count, reservation.owner()),
        bitmap,
    ))
}

fn check_single_zone<P: PageAllocator>(
    pages: &P,
    base: PageFrame,
    frame_count: u64,
) -> Result<(), ActivateError> {
    let zone = pages
        .zone_of(base)
        .ok_or(ActivateError::UnbackedFrame { frame: base })?;
    for offset in 1..frame_count {
        let frame = base + offset;
        match pages.zone_of(frame) {
            Some(z) if z == zone => {}
            Some(_) => return Err(ActivateError::CrossZoneRange { frame }),
            None => return Err(ActivateError::UnbackedFrame { frame }),
        }
    }
    Ok(())
}
