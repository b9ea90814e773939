//! # Kernel Memory Configuration
//!
//! This crate is the single source of truth for the compile-time memory
//! constants shared by the page allocator and the contiguous memory area
//! (CMA) allocator. Every value here is a `const`, validated by compile-time
//! assertions, so a bad configuration fails the build rather than the boot.
//!
//! ## Overview
//!
//! The contiguous allocator and the general page allocator have to agree on
//! a few numbers:
//!
//! * the **page size** (the granularity of one bitmap bit),
//! * the **largest buddy order** and the **pageblock order** (the unit in
//!   which memory is classified as movable, unmovable or CMA),
//! * the **capacity** of the early reservation table,
//! * the **default sizing policy** used when the command line does not
//!   request an explicit CMA size.
//!
//! ## Modules
//!
//! ### Memory Geometry ([`memory`])
//! Page size, buddy orders and pageblock geometry:
//!
//! ```text
//!  one pageblock = 2^PAGEBLOCK_ORDER pages
//! ┌──────┬──────┬──────┬─ ─ ─ ─┬──────┐
//! │ 4KiB │ 4KiB │ 4KiB │       │ 4KiB │   → classified as a whole
//! └──────┴──────┴──────┴─ ─ ─ ─┴──────┘
//!  ^ base is aligned to PAGE_SIZE << max(MAX_ORDER - 1, PAGEBLOCK_ORDER)
//! ```
//!
//! ### Contiguous Memory Area Defaults ([`cma`])
//! Table capacity, alignment clamp and the default size policy values.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::memory::{PAGE_SIZE, RESERVATION_ALIGNMENT};
//!
//! assert_eq!(PAGE_SIZE, 4096);
//! assert_eq!(RESERVATION_ALIGNMENT % PAGE_SIZE, 0);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod cma;
pub mod memory;
