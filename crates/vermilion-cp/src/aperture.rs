//! GPU-visible apertures and the historical offset fixup heuristic.
//!
//! Userspace from several driver eras submits addresses in three different
//! conventions: absolute card addresses, zero-based framebuffer offsets, and
//! offsets relative to the end of the framebuffer that really mean GART
//! space. The fixup below reconstructs a valid card address from any of the
//! three, or rejects the value outright.

use tracing::debug;

use crate::error::ValidateError;

/// The two GPU-visible address windows. Sizes are in bytes; ranges are
/// half-open `[base, base + size)` and must not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApertureMap {
    pub fb_base: u32,
    pub fb_size: u32,
    pub gart_base: u32,
    pub gart_size: u32,
}

impl ApertureMap {
    /// True if `addr` falls inside the framebuffer or GART aperture.
    pub fn contains(&self, addr: u64) -> bool {
        let fb = u64::from(self.fb_base)..u64::from(self.fb_base) + u64::from(self.fb_size);
        let gart =
            u64::from(self.gart_base)..u64::from(self.gart_base) + u64::from(self.gart_size);
        fb.contains(&addr) || gart.contains(&addr)
    }

    /// Last byte address of the framebuffer aperture (inclusive), `-1` for
    /// an empty framebuffer.
    fn fb_end(&self) -> i64 {
        i64::from(self.fb_base) + i64::from(self.fb_size) - 1
    }
}

/// Validate `raw` against the apertures, applying legacy fixup tiers in
/// order. `fb_delta` is the per-session relocation added to zero-based
/// framebuffer offsets.
///
/// Tiers, first match wins:
/// 1. `raw` already falls in an aperture: accepted unchanged.
/// 2. values below `fb_size + gart_size` are zero-based: add `fb_delta`.
/// 3. values past the framebuffer end are GART-relative: rebase onto the
///    GART aperture.
/// Whatever the tiers produce must land in an aperture or the offset is
/// rejected.
pub fn fix_offset(map: &ApertureMap, fb_delta: i64, raw: u32) -> Result<u32, ValidateError> {
    if map.contains(u64::from(raw)) {
        return Ok(raw);
    }

    let mut off = i64::from(raw);
    if u64::from(raw) < u64::from(map.fb_size) + u64::from(map.gart_size) {
        off += fb_delta;
    }

    let fb_end = map.fb_end();
    if off > fb_end {
        off = off - fb_end - 1 + i64::from(map.gart_base);
    }

    if off >= 0 && map.contains(off as u64) {
        let fixed = off as u32;
        debug!(raw = format_args!("0x{raw:08x}"), fixed = format_args!("0x{fixed:08x}"), "offset fixed up");
        Ok(fixed)
    } else {
        Err(ValidateError::InvalidOffset { offset: raw })
    }
}
