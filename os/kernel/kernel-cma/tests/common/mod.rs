//! In-memory stand-ins for the early memory map and the page allocator.

#![allow(dead_code)]

use kernel_cma::{
    ArchFixup, Cma, CmaConfig, EarlyMemoryMap, Introspection, MigrateError, Owner,
    PageAllocator, PageBlockFlags, Region, RegionId, ReservationRegistry, ZoneId,
};
use kernel_memory_addresses::{PageFrame, PhysicalAddress};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::Mutex;

pub const MIB: u64 = 1024 * 1024;
pub const GIB: u64 = 1024 * MIB;

/// Memblock-like early map: a flat RAM size and a list of claimed ranges.
pub struct FakeMemblock {
    total: u64,
    reserved: Vec<(u64, u64)>,
}

impl FakeMemblock {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            reserved: Vec::new(),
        }
    }

    pub fn with_reserved(mut self, base: u64, size: u64) -> Self {
        self.reserved.push((base, size));
        self
    }

    pub fn reserved(&self) -> &[(u64, u64)] {
        &self.reserved
    }

    fn overlaps(&self, base: u64, size: u64) -> bool {
        self.reserved
            .iter()
            .any(|&(b, s)| base < b + s && b < base + size)
    }
}

impl EarlyMemoryMap for FakeMemblock {
    fn total_memory(&self) -> u64 {
        self.total
    }

    fn is_reserved(&self, base: PhysicalAddress, size: u64) -> bool {
        self.overlaps(base.as_u64(), size)
    }

    fn reserve(&mut self, base: PhysicalAddress, size: u64) -> bool {
        let base = base.as_u64();
        if base + size > self.total || self.overlaps(base, size) {
            return false;
        }
        self.reserved.push((base, size));
        true
    }

    // Top-down, like memblock.
    fn allocate(
        &mut self,
        size: u64,
        align: u64,
        limit: Option<PhysicalAddress>,
    ) -> Option<PhysicalAddress> {
        let top = limit.map_or(self.total, |l| l.as_u64().min(self.total));
        let mut candidate = top.checked_sub(size)? / align * align;
        loop {
            if !self.overlaps(candidate, size) {
                self.reserved.push((candidate, size));
                return Some(PhysicalAddress::new(candidate));
            }
            candidate = candidate.checked_sub(align)?;
        }
    }
}

#[derive(Default)]
struct PageState {
    busy: HashSet<u64>,
    fatal: HashSet<u64>,
    pageblocks: HashMap<u64, PageBlockFlags>,
    isolated: Vec<(u64, u64)>,
    freed: Vec<(u64, u64)>,
    isolate_calls: usize,
}

/// Page allocator with configurable zones and pages that refuse migration.
pub struct FakePages {
    zones: Vec<(Range<u64>, ZoneId)>,
    state: Mutex<PageState>,
}

impl FakePages {
    /// Every frame below 4 GiB in zone 0.
    pub fn flat() -> Self {
        Self::with_zones(vec![(0..(4 * GIB) >> 12, ZoneId(0))])
    }

    pub fn with_zones(zones: Vec<(Range<u64>, ZoneId)>) -> Self {
        Self {
            zones,
            state: Mutex::new(PageState::default()),
        }
    }

    /// Unmovable page: isolating a range containing it reports `Busy`.
    pub fn pin(&self, frame: PageFrame) {
        self.state.lock().unwrap().busy.insert(frame.number());
    }

    pub fn unpin(&self, frame: PageFrame) {
        self.state.lock().unwrap().busy.remove(&frame.number());
    }

    /// Page whose migration fails outright.
    pub fn poison(&self, frame: PageFrame) {
        self.state.lock().unwrap().fatal.insert(frame.number());
    }

    pub fn isolate_calls(&self) -> usize {
        self.state.lock().unwrap().isolate_calls
    }

    pub fn pageblock(&self, frame: PageFrame) -> Option<PageBlockFlags> {
        self.state
            .lock()
            .unwrap()
            .pageblocks
            .get(&frame.number())
            .copied()
    }

    pub fn pageblock_count(&self) -> usize {
        self.state.lock().unwrap().pageblocks.len()
    }

    pub fn isolated(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().isolated.clone()
    }

    pub fn freed(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().freed.clone()
    }
}

impl PageAllocator for FakePages {
    fn zone_of(&self, frame: PageFrame) -> Option<ZoneId> {
        self.zones
            .iter()
            .find(|(range, _)| range.contains(&frame.number()))
            .map(|&(_, zone)| zone)
    }

    fn release_pageblock(&self, first: PageFrame, flags: PageBlockFlags) {
        self.state
            .lock()
            .unwrap()
            .pageblocks
            .insert(first.number(), flags);
    }

    fn isolate_range(&self, start: PageFrame, count: u64) -> Result<(), MigrateError> {
        let mut state = self.state.lock().unwrap();
        state.isolate_calls += 1;
        let range = start.number()..start.number() + count;
        if state.fatal.iter().any(|f| range.contains(f)) {
            return Err(MigrateError::Failed("page cannot be migrated"));
        }
        if state.busy.iter().any(|f| range.contains(f)) {
            return Err(MigrateError::Busy);
        }
        state.isolated.push((start.number(), count));
        Ok(())
    }

    fn free_range(&self, start: PageFrame, count: u64) {
        self.state
            .lock()
            .unwrap()
            .freed
            .push((start.number(), count));
    }
}

#[derive(Default)]
pub struct RecordingFixup {
    pub calls: Vec<(PhysicalAddress, u64)>,
}

impl ArchFixup for RecordingFixup {
    fn fixup(&mut self, base: PhysicalAddress, size: u64) {
        self.calls.push((base, size));
    }
}

#[derive(Default)]
pub struct RecordingIntrospection {
    pub registered: Vec<RegionId>,
}

impl Introspection for RecordingIntrospection {
    fn register_region(&mut self, region: &Region) {
        self.registered.push(region.id());
    }
}

/// Frame number of the first frame at physical address `addr`.
pub const fn frame(addr: u64) -> PageFrame {
    PageFrame::new(addr >> 12)
}

/// Allocator with a single region of `size` bytes at `base`.
pub fn single_region<P: PageAllocator>(
    config: CmaConfig,
    pages: P,
    owner: Owner,
    base: u64,
    size: u64,
) -> Cma<P> {
    let mut memblock = FakeMemblock::new(4 * GIB);
    let mut registry = ReservationRegistry::new(config, &mut memblock);
    registry
        .declare_reservation(owner, size, Some(PhysicalAddress::new(base)), None)
        .unwrap();
    let (cma, dropped) = registry.activate_all_pending(pages, &mut ());
    assert!(dropped.is_empty());
    cma
}
