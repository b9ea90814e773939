//! # Frame Bitmap
//!
//! Fixed-size bit vector with one bit per page frame of a region:
//! `1` = allocated, `0` = free. The bit primitives come from `bitvec`; the
//! aligned first-fit search is built on top of them.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;
use core::fmt;

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Clone, PartialEq, Eq)]
pub struct FrameBitmap {
    bits: BitVec<u64, Lsb0>,
}

/// A maximal run of equal bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitRun {
    pub start: usize,
    pub len: usize,
    pub set: bool,
}

impl FrameBitmap {
    /// Allocate a zeroed bitmap of `len` bits.
    ///
    /// # Errors
    /// Returns the allocator's error instead of aborting when the backing
    /// words cannot be allocated.
    pub fn try_new(len: usize) -> Result<Self, TryReserveError> {
        let words = len.div_ceil(WORD_BITS);
        let mut buf = Vec::new();
        buf.try_reserve_exact(words)?;
        buf.resize(words, 0u64);
        Ok(Self::from_words(buf, len))
    }

    /// Fallible copy, used for diagnostics snapshots.
    ///
    /// # Errors
    /// Returns the allocator's error when the copy cannot be allocated.
    pub fn try_clone(&self) -> Result<Self, TryReserveError> {
        let raw = self.bits.as_raw_slice();
        let mut buf = Vec::new();
        buf.try_reserve_exact(raw.len())?;
        buf.extend_from_slice(raw);
        Ok(Self::from_words(buf, self.len()))
    }

    fn from_words(words: Vec<u64>, len: usize) -> Self {
        let mut bits = BitVec::from_vec(words);
        bits.truncate(len);
        Self { bits }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// # Panics
    /// If `idx` is out of range.
    #[inline]
    #[must_use]
    pub fn test(&self, idx: usize) -> bool {
        assert!(idx < self.len(), "bit {idx} out of range ({} bits)", self.len());
        self.bits[idx]
    }

    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    #[must_use]
    pub fn count_zeros(&self) -> usize {
        self.bits.count_zeros()
    }

    /// Set bits `[start, start + count)`.
    ///
    /// # Panics
    /// If the range exceeds the bitmap.
    pub fn set_range(&mut self, start: usize, count: usize) {
        self.update_range(start, count, true);
    }

    /// Clear bits `[start, start + count)`.
    ///
    /// # Panics
    /// If the range exceeds the bitmap.
    pub fn clear_range(&mut self, start: usize, count: usize) {
        self.update_range(start, count, false);
    }

    fn update_range(&mut self, start: usize, count: usize, set: bool) {
        let len = self.len();
        let end = start
            .checked_add(count)
            .filter(|&end| end <= len)
            .unwrap_or_else(|| panic!("bit range {start}+{count} exceeds {len} bits"));
        self.bits[start..end].fill(set);
    }

    /// Index of the first clear bit at or after `from`.
    #[must_use]
    pub fn find_next_zero(&self, from: usize) -> Option<usize> {
        if from >= self.len() {
            return None;
        }
        self.bits[from..].first_zero().map(|i| from + i)
    }

    /// Index of the first set bit in `[from, end)`.
    #[must_use]
    pub fn find_next_one(&self, from: usize, end: usize) -> Option<usize> {
        let end = end.min(self.len());
        if from >= end {
            return None;
        }
        self.bits[from..end].first_one().map(|i| from + i)
    }

    /// Find the first run of `count` clear bits at or after `start` whose
    /// index `i` satisfies `(i + align_offset) & align_mask == 0`.
    ///
    /// `align_mask` must be `2^k - 1`; `align_offset` lets callers align the
    /// *physical* frame (`base + i`) rather than the bit index.
    #[must_use]
    pub fn find_zero_area(
        &self,
        mut start: usize,
        count: usize,
        align_mask: usize,
        align_offset: usize,
    ) -> Option<usize> {
        loop {
            let idx = self.find_next_zero(start)?;
            let aligned = (idx.checked_add(align_offset)?.checked_add(align_mask)? & !align_mask)
                - align_offset;
            let end = aligned.checked_add(count)?;
            if end > self.len() {
                return None;
            }
            match self.find_next_one(aligned, end) {
                Some(busy) => start = busy + 1,
                None => return Some(aligned),
            }
        }
    }

    /// Iterate over maximal runs of equal bits, front to back.
    #[must_use]
    pub const fn runs(&self) -> BitRuns<'_> {
        BitRuns {
            bitmap: self,
            pos: 0,
        }
    }
}

impl fmt::Debug for FrameBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBitmap")
            .field("len", &self.len())
            .field("set", &self.count_ones())
            .finish()
    }
}

/// Iterator returned by [`FrameBitmap::runs`].
pub struct BitRuns<'a> {
    bitmap: &'a FrameBitmap,
    pos: usize,
}

impl Iterator for BitRuns<'_> {
    type Item = BitRun;

    fn next(&mut self) -> Option<BitRun> {
        let len = self.bitmap.len();
        if self.pos >= len {
            return None;
        }
        let start = self.pos;
        let set = self.bitmap.test(start);
        let end = if set {
            self.bitmap.find_next_zero(start)
        } else {
            self.bitmap.find_next_one(start, len)
        }
        .unwrap_or(len);
        self.pos = end;
        Some(BitRun {
            start,
            len: end - start,
            set,
        })
    }
}
