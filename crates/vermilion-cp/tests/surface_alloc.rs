//! Surface allocator scenarios: merging, shrinking, and teardown as seen
//! through the mirrored hardware registers.

use vermilion_cp::regs::{
    REG_SURFACE0_INFO, REG_SURFACE0_LOWER, REG_SURFACE0_UPPER, SURFACE_REG_STRIDE,
};
use vermilion_cp::surface::MAX_VIRT_SURFACES;
use vermilion_cp::{ClientId, SurfaceError, SurfaceTable, VecSurfaceRegs};

const FLAGS: u32 = 0x3;

#[test]
fn front_back_pair_shares_one_slot() {
    let mut table = SurfaceTable::new();
    let mut regs = VecSurfaceRegs::new();
    let c = ClientId(1);

    table.alloc(c, 100, 200, FLAGS, &mut regs).unwrap();
    table.alloc(c, 200, 300, FLAGS, &mut regs).unwrap();

    let s = table.slot(0).unwrap();
    assert_eq!((s.lower, s.upper, s.flags, s.refcount), (100, 300, FLAGS, 2));
    assert_eq!(table.active_slots(), 1);

    // The merged bounds are what the hardware sees.
    assert_eq!(regs.last(REG_SURFACE0_INFO), Some(FLAGS));
    assert_eq!(regs.last(REG_SURFACE0_LOWER), Some(100));
    assert_eq!(regs.last(REG_SURFACE0_UPPER), Some(300));

    // Freeing one half shrinks the slot; freeing the other disables it.
    table.free(c, 100, &mut regs).unwrap();
    assert_eq!(regs.last(REG_SURFACE0_LOWER), Some(200));
    table.free(c, 200, &mut regs).unwrap();
    assert_eq!(regs.last(REG_SURFACE0_INFO), Some(0));
    assert_eq!(table.active_slots(), 0);
}

#[test]
fn second_slot_mirrors_at_its_own_stride() {
    let mut table = SurfaceTable::new();
    let mut regs = VecSurfaceRegs::new();
    let c = ClientId(1);

    table.alloc(c, 0x1000, 0x2000, FLAGS, &mut regs).unwrap();
    table.alloc(c, 0x4000, 0x5000, FLAGS + 4, &mut regs).unwrap();

    assert_eq!(
        regs.last(REG_SURFACE0_LOWER + SURFACE_REG_STRIDE),
        Some(0x4000)
    );
    assert_eq!(
        regs.last(REG_SURFACE0_INFO + SURFACE_REG_STRIDE),
        Some(FLAGS + 4)
    );
}

#[test]
fn virtual_handles_are_a_hard_cap() {
    let mut table = SurfaceTable::new();
    let mut regs = VecSurfaceRegs::new();
    let c = ClientId(1);

    // Alternating flags pack two handles per slot without ever merging a
    // third time: 16 handles fit, the 17th does not.
    for i in 0..MAX_VIRT_SURFACES as u32 {
        let base = i / 2 * 0x1000 + (i % 2) * 0x100;
        table
            .alloc(c, base, base + 0x100, FLAGS + 8 * (i / 2), &mut regs)
            .unwrap();
    }
    assert!(matches!(
        table.alloc(c, 0x0010_0000, 0x0010_0100, FLAGS, &mut regs),
        Err(SurfaceError::TableExhausted)
    ));
}

#[test]
fn client_teardown_releases_everything_they_held() {
    let mut table = SurfaceTable::new();
    let mut regs = VecSurfaceRegs::new();

    table.alloc(ClientId(1), 100, 200, FLAGS, &mut regs).unwrap();
    table.alloc(ClientId(1), 200, 300, FLAGS, &mut regs).unwrap();
    table.alloc(ClientId(2), 0x1000, 0x2000, FLAGS, &mut regs).unwrap();

    table.release_client(ClientId(1), &mut regs);

    assert_eq!(table.active_slots(), 1);
    assert_eq!(table.slot(1).unwrap().lower, 0x1000);
    // Client 2's surface survives and can still be freed normally.
    table.free(ClientId(2), 0x1000, &mut regs).unwrap();
    assert_eq!(table.active_slots(), 0);
}
