mod common;

use common::{FakeMemblock, FakePages, GIB, MIB, RecordingFixup, RecordingIntrospection, frame};
use kernel_cma::{
    ActivateError, CmaConfig, DeviceId, MigrateType, Owner, ReservationRegistry, ReserveError,
    SizePolicy, ZoneId,
};
use kernel_memory_addresses::PhysicalAddress;

fn dev(n: u32) -> Owner {
    Owner::Device(DeviceId(n))
}

fn pa(addr: u64) -> Option<PhysicalAddress> {
    Some(PhysicalAddress::new(addr))
}

#[test]
fn zero_size_is_rejected() {
    let mut mem = FakeMemblock::new(GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    assert_eq!(
        registry.declare_reservation(Owner::Default, 0, None, None),
        Err(ReserveError::InvalidArgument)
    );
    assert!(registry.pending().is_empty());
}

#[test]
fn hint_and_size_are_aligned_up() {
    let mut mem = FakeMemblock::new(2 * GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);

    let start = registry
        .declare_reservation(dev(1), MIB, pa(0x4000_1000), None)
        .unwrap();
    assert_eq!(start, PhysicalAddress::new(0x4040_0000));

    let pending = registry.pending()[0];
    assert_eq!(pending.size(), 4 * MIB);
    assert_eq!(pending.owner(), dev(1));
    drop(registry);
    assert_eq!(mem.reserved(), &[(0x4040_0000, 4 * MIB)]);
}

#[test]
fn claimed_hint_is_busy() {
    let mut mem = FakeMemblock::new(2 * GIB).with_reserved(0x4000_0000, 0x1000);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    assert_eq!(
        registry.declare_reservation(dev(1), 4 * MIB, pa(0x4000_0000), None),
        Err(ReserveError::AddressBusy)
    );
    assert!(registry.pending().is_empty());
}

#[test]
fn no_free_range_is_out_of_memory() {
    let mut mem = FakeMemblock::new(16 * MIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    assert_eq!(
        registry.declare_reservation(Owner::Default, 32 * MIB, None, None),
        Err(ReserveError::OutOfMemory)
    );
}

#[test]
fn limit_bounds_the_placement() {
    let mut mem = FakeMemblock::new(GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    let start = registry
        .declare_reservation(Owner::Default, 8 * MIB, None, pa(0x1000_1234))
        .unwrap();
    assert_eq!(start, PhysicalAddress::new(0x1000_0000 - 8 * MIB));
}

#[test]
fn hinted_range_above_limit_is_rejected() {
    let mut mem = FakeMemblock::new(GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    assert_eq!(
        registry.declare_reservation(Owner::Default, 8 * MIB, pa(0x2000_0000), pa(0x1000_0000)),
        Err(ReserveError::InvalidArgument)
    );
    // straddling the limit is just as wrong
    assert_eq!(
        registry.declare_reservation(Owner::Default, 8 * MIB, pa(0x0FC0_0000), pa(0x1000_0000)),
        Err(ReserveError::InvalidArgument)
    );
    // ending exactly at the limit is fine
    assert_eq!(
        registry.declare_reservation(Owner::Default, 8 * MIB, pa(0x0F80_0000), pa(0x1000_0000)),
        Ok(PhysicalAddress::new(0x0F80_0000))
    );
    drop(registry);
    assert_eq!(mem.reserved(), &[(0x0F80_0000, 8 * MIB)]);
}

#[test]
fn full_registry_does_not_claim_memory() {
    let mut mem = FakeMemblock::new(GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    registry
        .declare_reservation(Owner::Default, 4 * MIB, None, None)
        .unwrap();
    for n in 1..=7 {
        registry
            .declare_reservation(dev(n), 4 * MIB, None, None)
            .unwrap();
    }
    assert_eq!(
        registry.declare_reservation(dev(8), 4 * MIB, None, None),
        Err(ReserveError::RegistryFull)
    );
    assert_eq!(registry.pending().len(), 8);
    drop(registry);
    assert_eq!(mem.reserved().len(), 8);
}

#[test]
fn second_reservation_for_owner_is_rejected() {
    let mut mem = FakeMemblock::new(GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    registry
        .declare_reservation(dev(1), 4 * MIB, None, None)
        .unwrap();
    assert_eq!(
        registry.declare_reservation(dev(1), 4 * MIB, None, None),
        Err(ReserveError::DuplicateOwner(dev(1)))
    );
    drop(registry);
    assert_eq!(mem.reserved().len(), 1);
}

#[test]
fn fixup_sees_every_reservation() {
    let mut mem = FakeMemblock::new(GIB);
    let mut fixup = RecordingFixup::default();
    let mut registry =
        ReservationRegistry::with_fixup(CmaConfig::default(), &mut mem, &mut fixup);
    let a = registry
        .declare_reservation(dev(1), 4 * MIB, pa(0x0800_0000), None)
        .unwrap();
    let _ = registry.declare_reservation(dev(1), 4 * MIB, None, None);
    let b = registry
        .declare_reservation(dev(2), 6 * MIB, None, None)
        .unwrap();
    drop(registry);
    assert_eq!(fixup.calls, vec![(a, 4 * MIB), (b, 8 * MIB)]);
}

fn default_size(config: CmaConfig) -> Option<u64> {
    let mut mem = FakeMemblock::new(GIB);
    let mut registry = ReservationRegistry::new(config, &mut mem);
    registry.reserve_default().unwrap()?;
    Some(registry.pending()[0].size())
}

#[test]
fn default_size_follows_policy() {
    let config = CmaConfig::default();
    assert_eq!(default_size(config), Some(16 * MIB));
    // 10% of 1 GiB is 107372544 bytes, rounded up to whole 4 MiB units
    assert_eq!(
        default_size(config.with_policy(SizePolicy::Percentage)),
        Some(104 * MIB)
    );
    assert_eq!(
        default_size(config.with_policy(SizePolicy::Minimum)),
        Some(16 * MIB)
    );
    assert_eq!(
        default_size(config.with_policy(SizePolicy::Maximum)),
        Some(104 * MIB)
    );
}

#[test]
fn zero_default_size_reserves_nothing() {
    let mut mem = FakeMemblock::new(GIB);
    let config = CmaConfig::default().with_fixed_bytes(0);
    let mut registry = ReservationRegistry::new(config, &mut mem);
    assert_eq!(registry.reserve_default(), Ok(None));
    assert!(registry.pending().is_empty());
    drop(registry);
    assert!(mem.reserved().is_empty());
}

#[test]
fn cmdline_overrides_default_size() {
    let config = CmaConfig::default()
        .apply_cmdline("console=ttyS0 cma=64M quiet")
        .unwrap();
    assert_eq!(default_size(config), Some(64 * MIB));
}

#[test]
fn cross_zone_reservation_is_dropped() {
    // zone boundary in the middle of the second reservation
    let pages = FakePages::with_zones(vec![
        (0..0x40600, ZoneId(0)),
        (0x40600..0x100000, ZoneId(1)),
    ]);
    let mut mem = FakeMemblock::new(4 * GIB);
    let mut introspection = RecordingIntrospection::default();
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    registry
        .declare_reservation(Owner::Default, 4 * MIB, pa(0x4000_0000), None)
        .unwrap();
    registry
        .declare_reservation(dev(1), 4 * MIB, pa(0x4040_0000), None)
        .unwrap();
    registry
        .declare_reservation(dev(2), 4 * MIB, pa(0x4080_0000), None)
        .unwrap();

    let (cma, dropped) = registry.activate_all_pending(&pages, &mut introspection);

    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].0.owner(), dev(1));
    assert_eq!(
        dropped[0].1,
        ActivateError::CrossZoneRange {
            frame: frame(0x4060_0000)
        }
    );

    let owners: Vec<_> = cma.regions().iter().map(|r| r.owner()).collect();
    assert_eq!(owners, vec![Owner::Default, dev(2)]);
    let ids: Vec<_> = cma.regions().iter().map(|r| r.id()).collect();
    assert_eq!(introspection.registered, ids);
    assert_eq!(ids[1].index(), 1);

    // the dropped range was never handed to the page allocator
    assert!(pages.pageblock(frame(0x4040_0000)).is_none());
    assert_eq!(pages.pageblock_count(), 2);

    // device 1 now falls back to the default area
    assert_eq!(cma.region_for(dev(1)).unwrap().owner(), Owner::Default);
}

#[test]
fn frames_without_metadata_are_rejected() {
    let pages = FakePages::with_zones(vec![(0..0x40000, ZoneId(0))]);
    let mut mem = FakeMemblock::new(4 * GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    registry
        .declare_reservation(Owner::Default, 4 * MIB, pa(0x4000_0000), None)
        .unwrap();

    let (cma, dropped) = registry.activate_all_pending(&pages, &mut ());
    assert!(cma.regions().is_empty());
    assert_eq!(
        dropped[0].1,
        ActivateError::UnbackedFrame {
            frame: frame(0x4000_0000)
        }
    );
    assert_eq!(pages.pageblock_count(), 0);
}

#[test]
fn activation_releases_pageblocks_as_cma() {
    let pages = FakePages::flat();
    let mut mem = FakeMemblock::new(4 * GIB);
    let mut registry = ReservationRegistry::new(CmaConfig::default(), &mut mem);
    registry
        .declare_reservation(Owner::Default, 8 * MIB, pa(0x4000_0000), None)
        .unwrap();
    let (cma, dropped) = registry.activate_all_pending(&pages, &mut ());
    assert!(dropped.is_empty());

    let region = cma.default_region().unwrap();
    assert_eq!(region.base(), frame(0x4000_0000));
    assert_eq!(region.frame_count(), 2048);

    assert_eq!(pages.pageblock_count(), 2);
    for addr in [0x4000_0000, 0x4040_0000] {
        let flags = pages.pageblock(frame(addr)).unwrap();
        assert_eq!(flags.migrate_type(), MigrateType::Cma);
    }

    let report = cma.describe(region.id()).unwrap();
    assert_eq!(report.free_frames(), 2048);
}
