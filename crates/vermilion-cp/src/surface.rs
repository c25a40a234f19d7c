//! On-chip surface allocator.
//!
//! The hardware has [`MAX_SURFACES`] surface slots, each describing a byte
//! range of card memory plus a tiling/swapping flags word. Userspace holds
//! virtual handles; adjacent allocations with identical flags share one
//! physical slot (refcount at most 2), which is how a front/back buffer
//! pair fits a single slot. Every mutation is mirrored to the surface
//! registers so the table and the hardware never disagree.

use tracing::debug;

use crate::context::ClientId;
use crate::error::SurfaceError;
use crate::regs::{REG_SURFACE0_INFO, REG_SURFACE0_LOWER, REG_SURFACE0_UPPER, SURFACE_REG_STRIDE};

pub const MAX_SURFACES: usize = 8;
pub const MAX_VIRT_SURFACES: usize = 2 * MAX_SURFACES;

/// Surface bounds are word granular.
pub const SURFACE_ALIGN_MASK: u32 = 0x3;

/// Sink for surface register programming. The production implementation
/// writes MMIO; tests record.
pub trait SurfaceRegs {
    fn write_reg(&mut self, reg: u32, value: u32);
}

/// Recording register sink for tests.
#[derive(Debug, Default)]
pub struct VecSurfaceRegs {
    pub writes: Vec<(u32, u32)>,
}

impl VecSurfaceRegs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to `reg`, if any.
    pub fn last(&self, reg: u32) -> Option<u32> {
        self.writes.iter().rev().find(|(r, _)| *r == reg).map(|(_, v)| *v)
    }
}

impl SurfaceRegs for VecSurfaceRegs {
    fn write_reg(&mut self, reg: u32, value: u32) {
        self.writes.push((reg, value));
    }
}

/// One physical surface slot. Bounds are half-open `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub lower: u32,
    pub upper: u32,
    pub flags: u32,
    pub refcount: u8,
}

/// One userspace handle onto (part of) a physical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VirtSurface {
    owner: ClientId,
    slot: usize,
    lower: u32,
    upper: u32,
    flags: u32,
}

#[derive(Debug, Default)]
pub struct SurfaceTable {
    slots: [Option<Surface>; MAX_SURFACES],
    virts: [Option<VirtSurface>; MAX_VIRT_SURFACES],
}

impl SurfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, index: usize) -> Option<&Surface> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    pub fn active_slots(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    fn program_slot(&self, index: usize, regs: &mut impl SurfaceRegs) {
        let stride = SURFACE_REG_STRIDE * index as u32;
        match self.slots[index] {
            Some(s) => {
                regs.write_reg(REG_SURFACE0_INFO + stride, s.flags);
                regs.write_reg(REG_SURFACE0_LOWER + stride, s.lower);
                regs.write_reg(REG_SURFACE0_UPPER + stride, s.upper);
            }
            None => {
                regs.write_reg(REG_SURFACE0_INFO + stride, 0);
                regs.write_reg(REG_SURFACE0_LOWER + stride, 0);
                regs.write_reg(REG_SURFACE0_UPPER + stride, 0);
            }
        }
    }

    /// Allocate `[lower, upper)` with `flags` for `client`, merging into an
    /// adjacent singly-referenced slot with identical flags when possible.
    /// Returns the virtual handle.
    pub fn alloc(
        &mut self,
        client: ClientId,
        lower: u32,
        upper: u32,
        flags: u32,
        regs: &mut impl SurfaceRegs,
    ) -> Result<usize, SurfaceError> {
        if lower >= upper
            || flags == 0
            || lower & SURFACE_ALIGN_MASK != 0
            || upper & SURFACE_ALIGN_MASK != 0
        {
            return Err(SurfaceError::BadRange { lower, upper });
        }

        // No overlap with any active slot, regardless of flags.
        for s in self.slots.iter().flatten() {
            let starts_inside = lower >= s.lower && lower < s.upper;
            let spans_start = lower < s.lower && upper > s.lower;
            if starts_inside || spans_start {
                return Err(SurfaceError::Conflict { lower, upper });
            }
        }

        let handle = self
            .virts
            .iter()
            .position(|v| v.is_none())
            .ok_or(SurfaceError::TableExhausted)?;

        // Extend an adjacent compatible slot instead of burning a new one.
        let mut merged = None;
        for (i, entry) in self.slots.iter_mut().enumerate() {
            let Some(s) = entry else { continue };
            if s.refcount != 1 || s.flags != flags {
                continue;
            }
            if upper == s.lower {
                s.lower = lower;
            } else if s.upper == lower {
                s.upper = upper;
            } else {
                continue;
            }
            s.refcount = 2;
            merged = Some(i);
            break;
        }
        if let Some(i) = merged {
            self.virts[handle] = Some(VirtSurface {
                owner: client,
                slot: i,
                lower,
                upper,
                flags,
            });
            debug!(slot = i, lower = format_args!("0x{lower:08x}"), "surface merged");
            self.program_slot(i, regs);
            return Ok(handle);
        }

        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(SurfaceError::TableExhausted)?;
        self.slots[slot] = Some(Surface {
            lower,
            upper,
            flags,
            refcount: 1,
        });
        self.virts[handle] = Some(VirtSurface {
            owner: client,
            slot,
            lower,
            upper,
            flags,
        });
        debug!(slot, lower = format_args!("0x{lower:08x}"), "surface allocated");
        self.program_slot(slot, regs);
        Ok(handle)
    }

    /// Release the virtual surface `client` allocated at `lower`. A shared
    /// slot shrinks by the released range; the last reference disables the
    /// slot entirely.
    pub fn free(
        &mut self,
        client: ClientId,
        lower: u32,
        regs: &mut impl SurfaceRegs,
    ) -> Result<(), SurfaceError> {
        let handle = self
            .virts
            .iter()
            .position(|v| matches!(v, Some(v) if v.owner == client && v.lower == lower))
            .ok_or(SurfaceError::NotFound { lower })?;
        let virt = self.virts[handle].take().ok_or(SurfaceError::NotFound { lower })?;

        let slot = virt.slot;
        let Some(s) = &mut self.slots[slot] else {
            return Err(SurfaceError::NotFound { lower });
        };
        s.refcount -= 1;
        if s.refcount == 0 {
            self.slots[slot] = None;
        } else {
            if s.lower == virt.lower {
                s.lower = virt.upper;
            }
            if s.upper == virt.upper {
                s.upper = virt.lower;
            }
        }
        debug!(slot, lower = format_args!("0x{lower:08x}"), "surface freed");
        self.program_slot(slot, regs);
        Ok(())
    }

    /// Session teardown: release every virtual surface `client` still holds.
    pub fn release_client(&mut self, client: ClientId, regs: &mut impl SurfaceRegs) {
        let owned: Vec<u32> = self
            .virts
            .iter()
            .flatten()
            .filter(|v| v.owner == client)
            .map(|v| v.lower)
            .collect();
        for lower in owned {
            // The handle was found above; a scan race is impossible under
            // the caller's lock.
            let _ = self.free(client, lower, regs);
        }
    }
}
