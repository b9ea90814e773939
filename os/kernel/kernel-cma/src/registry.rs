//! # Boot Reservation Registry
//!
//! Early in boot, before the page allocator exists, platform code and
//! device drivers declare the physical ranges they want set aside. The
//! registry claims each range from the [`EarlyMemoryMap`] immediately and
//! remembers it as a [`PendingReservation`]; nothing is usable for
//! allocation until [`activate_all_pending`](ReservationRegistry::activate_all_pending)
//! turns the table into a live [`Cma`](crate::Cma).
//!
//! All ranges are aligned to [`RESERVATION_ALIGNMENT`] so every area covers
//! whole pageblocks and can serve the largest alignment a caller may ask for.

use crate::config::CmaConfig;
use crate::error::ReserveError;
use crate::platform::{ArchFixup, EarlyMemoryMap};
use crate::region::Owner;
use arrayvec::ArrayVec;
use kernel_info::cma::{MAX_CMA_AREAS, SZ_1M};
use kernel_info::memory::RESERVATION_ALIGNMENT;
use kernel_memory_addresses::PhysicalAddress;
use log::{error, info};

/// A claimed, not yet activated range.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PendingReservation {
    start: PhysicalAddress,
    size: u64,
    owner: Owner,
}

impl PendingReservation {
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    /// Size in bytes, a multiple of [`RESERVATION_ALIGNMENT`].
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.owner
    }
}

/// Boot-time builder for the contiguous allocator.
///
/// Single-threaded by construction: every declaration takes `&mut self`.
pub struct ReservationRegistry<M: EarlyMemoryMap, A: ArchFixup = ()> {
    config: CmaConfig,
    memory: M,
    fixup: A,
    pending: ArrayVec<PendingReservation, MAX_CMA_AREAS>,
}

impl<M: EarlyMemoryMap> ReservationRegistry<M> {
    pub fn new(config: CmaConfig, memory: M) -> Self {
        Self::with_fixup(config, memory, ())
    }
}

impl<M: EarlyMemoryMap, A: ArchFixup> ReservationRegistry<M, A> {
    pub fn with_fixup(config: CmaConfig, memory: M, fixup: A) -> Self {
        Self {
            config,
            memory,
            fixup,
            pending: ArrayVec::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CmaConfig {
        &self.config
    }

    #[must_use]
    pub fn pending(&self) -> &[PendingReservation] {
        &self.pending
    }

    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    /// Reserve `size` bytes for `owner`.
    ///
    /// With `base_hint` the exact (aligned) range is claimed; otherwise the
    /// early memory map picks any free aligned range. Either way the range
    /// must end at or below `limit`. Returns the aligned start of the claimed
    /// range.
    ///
    /// # Errors
    /// * [`ReserveError::InvalidArgument`] for a zero size, a range that
    ///   overflows once aligned, or a hinted range that ends above `limit`.
    /// * [`ReserveError::RegistryFull`] when all slots are taken.
    /// * [`ReserveError::DuplicateOwner`] when `owner` already has a reservation.
    /// * [`ReserveError::AddressBusy`] when the hinted range is already claimed.
    /// * [`ReserveError::OutOfMemory`] when no suitable range is free.
    pub fn declare_reservation(
        &mut self,
        owner: Owner,
        size: u64,
        base_hint: Option<PhysicalAddress>,
        limit: Option<PhysicalAddress>,
    ) -> Result<PhysicalAddress, ReserveError> {
        let mib = size
            .checked_next_multiple_of(RESERVATION_ALIGNMENT)
            .unwrap_or(size)
            .div_ceil(SZ_1M);
        self.try_declare(owner, size, base_hint, limit)
            .inspect(|start| info!("cma: reserved {mib} MiB at {start} for {owner}"))
            .inspect_err(|err| error!("cma: failed to reserve {mib} MiB for {owner}: {err}"))
    }

    fn try_declare(
        &mut self,
        owner: Owner,
        size: u64,
        base_hint: Option<PhysicalAddress>,
        limit: Option<PhysicalAddress>,
    ) -> Result<PhysicalAddress, ReserveError> {
        if size == 0 {
            return Err(ReserveError::InvalidArgument);
        }
        if self.pending.is_full() {
            return Err(ReserveError::RegistryFull);
        }
        if self.pending.iter().any(|p| p.owner == owner) {
            return Err(ReserveError::DuplicateOwner(owner));
        }

        let size = size
            .checked_next_multiple_of(RESERVATION_ALIGNMENT)
            .ok_or(ReserveError::InvalidArgument)?;
        let limit = limit.map(|limit| limit.align_down(RESERVATION_ALIGNMENT));

        let start = if let Some(hint) = base_hint {
            let base = hint
                .checked_align_up(RESERVATION_ALIGNMENT)
                .ok_or(ReserveError::InvalidArgument)?;
            let end = base.checked_add(size).ok_or(ReserveError::InvalidArgument)?;
            if limit.is_some_and(|limit| end > limit) {
                return Err(ReserveError::InvalidArgument);
            }
            if self.memory.is_reserved(base, size) || !self.memory.reserve(base, size) {
                return Err(ReserveError::AddressBusy);
            }
            base
        } else {
            self.memory
                .allocate(size, RESERVATION_ALIGNMENT, limit)
                .ok_or(ReserveError::OutOfMemory)?
        };

        self.fixup.fixup(start, size);
        self.pending.push(PendingReservation { start, size, owner });
        Ok(start)
    }

    /// Reserve the default area sized by the configuration.
    ///
    /// Returns `Ok(None)` when the configured size is zero.
    ///
    /// # Errors
    /// Any [`ReserveError`] from [`declare_reservation`](Self::declare_reservation).
    pub fn reserve_default(&mut self) -> Result<Option<PhysicalAddress>, ReserveError> {
        let size = self
            .config
            .default_area_size(self.memory.total_memory());
        if size == 0 {
            info!("cma: default area disabled");
            return Ok(None);
        }
        let limit = self.config.limit();
        self.declare_reservation(Owner::Default, size, None, limit)
            .map(Some)
    }

    pub(crate) fn into_parts(self) -> (CmaConfig, ArrayVec<PendingReservation, MAX_CMA_AREAS>) {
        (self.config, self.pending)
    }
}
