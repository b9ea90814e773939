//! # Contiguous Memory Area Defaults
//!
//! Build-time defaults for the contiguous allocator. The runtime
//! configuration starts from these and may be overridden by the kernel
//! command line (`cma=<size>`).

/// Number of device-specific areas that may be declared during boot.
pub const DEVICE_AREAS: usize = 7;

/// Capacity of the early reservation table: one default area plus the device areas.
pub const MAX_CMA_AREAS: usize = 1 + DEVICE_AREAS;

/// Largest alignment order an allocation may request; larger requests are clamped.
pub const MAX_ALIGN_ORDER: u32 = 8;

/// Default fixed size of the global area, in MiB.
pub const DEFAULT_SIZE_MBYTES: u64 = 16;

/// Default size of the global area as a percentage of total memory.
pub const DEFAULT_SIZE_PERCENTAGE: u8 = 10;

/// One mebibyte.
pub const SZ_1M: u64 = 1024 * 1024;

const _: () = {
    assert!(MAX_CMA_AREAS > DEVICE_AREAS);
    assert!(DEFAULT_SIZE_PERCENTAGE <= 100);
    assert!(MAX_ALIGN_ORDER < u64::BITS);
};
