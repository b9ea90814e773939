use crate::region::Owner;
use kernel_memory_addresses::PageFrame;

/// Boot-time failure of [`declare_reservation`](crate::ReservationRegistry::declare_reservation).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReserveError {
    #[error("invalid reservation size or address")]
    InvalidArgument,
    #[error("requested range overlaps an existing reservation")]
    AddressBusy,
    #[error("no free physical range of the requested size")]
    OutOfMemory,
    #[error("reservation table is full")]
    RegistryFull,
    #[error("{0} already has a pending reservation")]
    DuplicateOwner(Owner),
}

/// Activation failure; the affected reservation is dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivateError {
    #[error("frame {frame} lies in a different zone than the region base")]
    CrossZoneRange { frame: PageFrame },
    #[error("frame {frame} has no page metadata")]
    UnbackedFrame { frame: PageFrame },
    #[error("failed to allocate the region bitmap")]
    OutOfMemory,
}

/// Failure reported by [`PageAllocator::isolate_range`](crate::PageAllocator::isolate_range).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrateError {
    /// The range holds unmovable or pinned pages; another range may succeed.
    #[error("range busy")]
    Busy,
    #[error("{0}")]
    Failed(&'static str),
}

/// Steady-state failure of [`Cma::allocate`](crate::Cma::allocate).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("zero-length allocation")]
    ZeroCount,
    #[error("no contiguous area serves {0}")]
    NoRegion(Owner),
    #[error("no free aligned run of {count} frames")]
    InsufficientSpace { count: u64 },
    #[error("migration failed: {0}")]
    MigrationFailed(MigrateError),
}

/// Malformed configuration value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed size value")]
    InvalidSize,
    #[error("size value does not fit 64 bits")]
    Overflow,
}
