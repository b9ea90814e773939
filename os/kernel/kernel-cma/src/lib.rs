//! # Contiguous Memory Area Allocator
//!
//! Devices that do DMA without an IOMMU need buffers that are physically
//! contiguous and often aligned well beyond a single page. This crate sets
//! such ranges aside at boot, lends them to the general page allocator for
//! *movable* data while unused, and reclaims them by migration when a
//! driver asks for a contiguous run.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │           Reservation Registry (early boot)         │
//! │    • Aligned ranges claimed from the memory map     │
//! │    • One default area plus per-device areas         │
//! └─────────────────┬───────────────────────────────────┘
//!                   │ activate_all_pending()
//! ┌─────────────────▼───────────────────────────────────┐
//! │              Region Activator                       │
//! │    • Single-zone validation                         │
//! │    • Pageblocks released as MigrateType::Cma        │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │                 Cma (steady state)                  │
//! │    • Bitmap first-fit with physical alignment       │
//! │    • Migration through the page allocator           │
//! │    • One FIFO ticket lock over all bitmaps          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Components
//!
//! * [`ReservationRegistry`]: boot-time builder; see [`registry`].
//! * [`Cma`]: allocation and release of frame runs; see [`cma`].
//! * [`RegionReport`]: snapshot of a region for diagnostics.
//! * [`CmaConfig`]: size policy, alignment limit, `cma=` command-line override.
//! * [`platform`]: the traits the host kernel implements.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kernel_cma::{CmaConfig, DeviceId, Owner, ReservationRegistry};
//!
//! let config = CmaConfig::default().apply_cmdline(cmdline)?;
//! let mut registry = ReservationRegistry::new(config, &mut memblock);
//! registry.reserve_default()?;
//! registry.declare_reservation(DeviceId(3).into(), 8 << 20, None, None)?;
//!
//! // later, once zones exist
//! let (cma, _dropped) = registry.activate_all_pending(&page_alloc, &mut ());
//! let buf = cma.allocate(Owner::Device(DeviceId(3)), 256, 4)?;
//! cma.release(Owner::Device(DeviceId(3)), buf.start(), buf.count());
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod activate;
pub mod bitmap;
pub mod cma;
pub mod config;
pub mod error;
pub mod pageblock;
pub mod platform;
pub mod region;
pub mod registry;
pub mod report;

pub use activate::DroppedReservations;
pub use cma::{Allocation, Cma};
pub use config::{CmaConfig, SizePolicy, parse_size};
pub use error::{ActivateError, AllocError, ConfigError, MigrateError, ReserveError};
pub use pageblock::{MigrateType, PageBlockFlags};
pub use platform::{ArchFixup, EarlyMemoryMap, Introspection, PageAllocator, ZoneId};
pub use region::{DeviceId, Owner, Region, RegionId};
pub use registry::{PendingReservation, ReservationRegistry};
pub use report::{RegionReport, Run, RunState};
