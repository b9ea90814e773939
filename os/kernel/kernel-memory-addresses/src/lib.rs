//! # Physical Memory Address Types
//!
//! Strongly typed wrappers for physical byte addresses and page frame
//! numbers used by the physical memory allocators.
//!
//! ## Overview
//!
//! | Type | Unit | Description |
//! |------|------|-------------|
//! | [`PhysicalAddress`] | bytes | A physical (RAM) address. |
//! | [`PageFrame`] | 4 KiB frames | A page frame number (PFN). |
//! | [`PageSize`] | – | Marker trait for supported page sizes. |
//!
//! Converting between the two is explicit:
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0080_0123);
//! let frame = pa.frame();
//! assert_eq!(frame.number(), 0x800);
//! assert_eq!(frame.base(), PhysicalAddress::new(0x0080_0000));
//! ```
//!
//! ## Design Notes
//!
//! - The types are `#[repr(transparent)]` over `u64` and implement `Copy`,
//!   `Eq`, `Ord` and `Hash`.
//! - Alignment helpers are `const fn`; the fallible variants return `None`
//!   instead of wrapping so callers never see a silently wrong range.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod page_frame;
mod page_size;
mod physical_address;

pub use page_frame::PageFrame;
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;

/// Align `x` down to the nearest multiple of `a`.
///
/// ### Preconditions
/// - `a` must be **non-zero** and a **power of two**.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::align_down;
/// assert_eq!(align_down(0,      4096), 0);
/// assert_eq!(align_down(4095,   4096), 0);
/// assert_eq!(align_down(8191,   4096), 4096);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_down(x: u64, a: u64) -> u64 {
    x & !(a - 1)
}

/// Align `x` up to the nearest multiple of `a`.
///
/// ### Preconditions
/// - `a` must be **non-zero** and a **power of two**.
/// - `x + (a - 1)` must **not overflow** `u64`; use
///   [`PhysicalAddress::checked_align_up`] when the input is untrusted.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::align_up;
/// assert_eq!(align_up(0,       4096), 0);
/// assert_eq!(align_up(1,       4096), 4096);
/// assert_eq!(align_up(4097,    4096), 8192);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_up(x: u64, a: u64) -> u64 {
    (x + a - 1) & !(a - 1)
}
