//! # Diagnostics
//!
//! A [`RegionReport`] is a copy of one region's bitmap taken under the
//! allocator lock. It can be inspected and printed without holding up
//! allocations; it may be stale by the time it is read.

use crate::bitmap::{BitRuns, FrameBitmap};
use crate::region::Region;
use core::fmt;
use kernel_memory_addresses::PageFrame;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RunState {
    Free,
    Used,
}

/// A maximal stretch of frames in the same state.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Run {
    pub start: PageFrame,
    pub state: RunState,
    pub len: u64,
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            RunState::Free => "free",
            RunState::Used => "used",
        };
        write!(f, "{}+{}: {state}", self.start, self.len)
    }
}

#[derive(Clone, Debug)]
pub struct RegionReport {
    region: Region,
    snapshot: FrameBitmap,
}

impl RegionReport {
    pub(crate) const fn new(region: Region, snapshot: FrameBitmap) -> Self {
        Self { region, snapshot }
    }

    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    #[must_use]
    pub const fn total_frames(&self) -> u64 {
        self.region.frame_count()
    }

    #[must_use]
    pub fn used_frames(&self) -> u64 {
        self.snapshot.count_ones() as u64
    }

    #[must_use]
    pub fn free_frames(&self) -> u64 {
        self.snapshot.count_zeros() as u64
    }

    /// The copied bitmap.
    #[must_use]
    pub const fn bitmap(&self) -> &FrameBitmap {
        &self.snapshot
    }

    /// Free and used runs, front to back. Can be called any number of times.
    #[must_use]
    pub const fn runs(&self) -> Runs<'_> {
        Runs {
            region: &self.region,
            inner: self.snapshot.runs(),
        }
    }
}

impl fmt::Display for RegionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} used, {} free",
            self.region,
            self.used_frames(),
            self.free_frames()
        )?;
        for run in self.runs() {
            writeln!(f, "  {run}")?;
        }
        Ok(())
    }
}

/// Iterator returned by [`RegionReport::runs`].
pub struct Runs<'a> {
    region: &'a Region,
    inner: BitRuns<'a>,
}

impl Iterator for Runs<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        self.inner.next().map(|run| Run {
            start: self.region.frame_at(run.start),
            state: if run.set { RunState::Used } else { RunState::Free },
            len: run.len as u64,
        })
    }
}
