//! Dirty-bit driven state upload.
//!
//! A session keeps a shadow of the 3D register file; when groups of it go
//! stale the driver marks dirty bits and the emitter replays just those
//! groups to the ring. Every address the snapshot carries is validated
//! before the first ring word goes out, so a bad offset costs nothing but
//! the rejection.

use bitflags::bitflags;

use crate::context::{DeviceContext, SessionContext};
use crate::error::DispatchError;
use crate::regs::*;
use crate::ring::RingWriter;

bitflags! {
    /// Stale register groups. Bit 7 is reserved for the transform engine
    /// group, which uploads through vector writes instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u32 {
        const CONTEXT = 1 << 0;
        const VERTFMT = 1 << 1;
        const LINE = 1 << 2;
        const BUMPMAP = 1 << 3;
        const MASKS = 1 << 4;
        const VIEWPORT = 1 << 5;
        const SETUP = 1 << 6;
        const MISC = 1 << 8;
        const TEX0 = 1 << 9;
        const TEX1 = 1 << 10;
        const TEX2 = 1 << 11;
        const ZBIAS = 1 << 12;
    }
}

/// Shadow of the context register file, one field per register in layout
/// order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextRegs {
    pub misc: u32,
    pub fog_color: u32,
    pub solid_color: u32,
    pub blend_cntl: u32,
    pub depth_offset: u32,
    pub depth_pitch: u32,
    pub zstencil_cntl: u32,
    pub pipe_cntl: u32,
    pub color_cntl: u32,
    pub color_offset: u32,
    pub color_pitch: u32,
    pub coord_fmt: u32,
    pub line_pattern: u32,
    pub line_state: u32,
    pub line_width: u32,
    pub lum_matrix: u32,
    pub rot_matrix_0: u32,
    pub rot_matrix_1: u32,
    pub stencil_refmask: u32,
    pub rop_cntl: u32,
    pub plane_mask: u32,
    pub vport_xscale: u32,
    pub vport_xoffset: u32,
    pub vport_yscale: u32,
    pub vport_yoffset: u32,
    pub vport_zscale: u32,
    pub vport_zoffset: u32,
    pub ge_cntl: u32,
    pub ge_cntl_status: u32,
    pub rs_misc: u32,
    pub zbias_factor: u32,
    pub zbias_constant: u32,
}

/// Shadow of one texture unit's register block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureRegs {
    pub filter: u32,
    pub format: u32,
    pub offset: u32,
    pub cblend: u32,
    pub ablend: u32,
    pub factor: u32,
    pub border_color: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub dirty: DirtyFlags,
    pub context: ContextRegs,
    pub tex: [TextureRegs; 3],
}

impl Default for DirtyFlags {
    fn default() -> Self {
        DirtyFlags::empty()
    }
}

const TEX_DIRTY: [DirtyFlags; 3] = [DirtyFlags::TEX0, DirtyFlags::TEX1, DirtyFlags::TEX2];

fn put_regs(ring: &mut impl RingWriter, reg: u32, values: &[u32]) {
    ring.write(cp_packet0(reg, values.len() as u32 - 1));
    for &v in values {
        ring.write(v);
    }
}

/// Upload every dirty group of `state`, then clear the dirty bits.
///
/// All offsets in the dirty groups are fixed up before any ring traffic,
/// so either the whole upload happens or none of it does.
pub fn emit_state(
    dev: &DeviceContext,
    session: &SessionContext,
    ring: &mut impl RingWriter,
    state: &mut StateSnapshot,
) -> Result<(), DispatchError> {
    let dirty = state.dirty;

    let mut ctx = state.context;
    if dirty.contains(DirtyFlags::CONTEXT) {
        ctx.depth_offset = dev.fix_offset(session, ctx.depth_offset)?;
        ctx.color_offset = dev.fix_offset(session, ctx.color_offset)?;
    }
    let mut tex = state.tex;
    for (i, flag) in TEX_DIRTY.iter().enumerate() {
        if dirty.contains(*flag) {
            tex[i].offset = dev.fix_offset(session, tex[i].offset)?;
        }
    }

    if dirty.contains(DirtyFlags::CONTEXT) {
        ring.reserve(14)?;
        put_regs(
            ring,
            REG_RB_MISC,
            &[
                ctx.misc,
                ctx.fog_color,
                ctx.solid_color,
                ctx.blend_cntl,
                ctx.depth_offset,
                ctx.depth_pitch,
                ctx.zstencil_cntl,
            ],
        );
        put_regs(
            ring,
            REG_PIPE_CNTL,
            &[ctx.pipe_cntl, ctx.color_cntl, ctx.color_offset],
        );
        put_regs(ring, REG_RB_COLOR_PITCH, &[ctx.color_pitch]);
        ring.commit();
    }

    if dirty.contains(DirtyFlags::VERTFMT) {
        ring.reserve(2)?;
        put_regs(ring, REG_GE_COORD_FMT, &[ctx.coord_fmt]);
        ring.commit();
    }

    if dirty.contains(DirtyFlags::LINE) {
        ring.reserve(5)?;
        put_regs(ring, REG_RS_LINE_PATTERN, &[ctx.line_pattern, ctx.line_state]);
        put_regs(ring, REG_GE_LINE_WIDTH, &[ctx.line_width]);
        ring.commit();
    }

    if dirty.contains(DirtyFlags::BUMPMAP) {
        ring.reserve(5)?;
        put_regs(ring, REG_TX_LUM_MATRIX, &[ctx.lum_matrix]);
        put_regs(ring, REG_TX_ROT_MATRIX_0, &[ctx.rot_matrix_0, ctx.rot_matrix_1]);
        ring.commit();
    }

    if dirty.contains(DirtyFlags::MASKS) {
        ring.reserve(4)?;
        put_regs(
            ring,
            REG_RB_STENCIL_REFMASK,
            &[ctx.stencil_refmask, ctx.rop_cntl, ctx.plane_mask],
        );
        ring.commit();
    }

    if dirty.contains(DirtyFlags::VIEWPORT) {
        ring.reserve(7)?;
        put_regs(
            ring,
            REG_GE_VPORT_XSCALE,
            &[
                ctx.vport_xscale,
                ctx.vport_xoffset,
                ctx.vport_yscale,
                ctx.vport_yoffset,
                ctx.vport_zscale,
                ctx.vport_zoffset,
            ],
        );
        ring.commit();
    }

    if dirty.contains(DirtyFlags::SETUP) {
        ring.reserve(4)?;
        put_regs(ring, REG_GE_CNTL, &[ctx.ge_cntl]);
        put_regs(ring, REG_GE_CNTL_STATUS, &[ctx.ge_cntl_status]);
        ring.commit();
    }

    if dirty.contains(DirtyFlags::MISC) {
        ring.reserve(2)?;
        put_regs(ring, REG_RS_MISC, &[ctx.rs_misc]);
        ring.commit();
    }

    for (i, flag) in TEX_DIRTY.iter().enumerate() {
        if !dirty.contains(*flag) {
            continue;
        }
        let t = &tex[i];
        ring.reserve(9)?;
        put_regs(
            ring,
            REG_TX_FILTER_0 + TX_UNIT_STRIDE * i as u32,
            &[t.filter, t.format, t.offset, t.cblend, t.ablend, t.factor],
        );
        put_regs(ring, REG_TX_BORDER_COLOR_0 + 4 * i as u32, &[t.border_color]);
        ring.commit();
    }

    if dirty.contains(DirtyFlags::ZBIAS) {
        ring.reserve(3)?;
        put_regs(
            ring,
            REG_GE_ZBIAS_FACTOR,
            &[ctx.zbias_factor, ctx.zbias_constant],
        );
        ring.commit();
    }

    state.dirty = DirtyFlags::empty();
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::aperture::ApertureMap;
    use crate::context::{ClientId, Microcode};
    use crate::error::ValidateError;
    use crate::ring::VecRing;

    fn fixtures() -> (DeviceContext, SessionContext) {
        let dev = DeviceContext::new(
            ApertureMap {
                fb_base: 0x1000_0000,
                fb_size: 0x0100_0000,
                gart_base: 0x2000_0000,
                gart_size: 0x0100_0000,
            },
            Microcode::V1,
            0,
        );
        let mut session = SessionContext::new(ClientId(3));
        session.fb_delta = 0x1000_0000;
        (dev, session)
    }

    #[test]
    fn context_group_emits_fourteen_words() {
        let (dev, session) = fixtures();
        let mut ring = VecRing::new();
        let mut state = StateSnapshot {
            dirty: DirtyFlags::CONTEXT,
            ..Default::default()
        };
        state.context.depth_offset = 0x1000;
        state.context.color_offset = 0x2000;
        state.context.color_pitch = 0x500;

        emit_state(&dev, &session, &mut ring, &mut state).unwrap();

        assert_eq!(ring.committed_words().len(), 14);
        assert_eq!(ring.words[0], cp_packet0(REG_RB_MISC, 6));
        // Offsets were relocated before hitting the ring.
        assert_eq!(ring.words[5], 0x1000_1000);
        assert_eq!(ring.words[8], cp_packet0(REG_PIPE_CNTL, 2));
        assert_eq!(ring.words[11], 0x1000_2000);
        assert_eq!(ring.words[12], cp_packet0(REG_RB_COLOR_PITCH, 0));
        assert_eq!(ring.words[13], 0x500);
        assert_eq!(state.dirty, DirtyFlags::empty());
    }

    #[test]
    fn group_word_counts_match_hardware_layout() {
        let (dev, session) = fixtures();
        let cases = [
            (DirtyFlags::CONTEXT, 14),
            (DirtyFlags::VERTFMT, 2),
            (DirtyFlags::LINE, 5),
            (DirtyFlags::BUMPMAP, 5),
            (DirtyFlags::MASKS, 4),
            (DirtyFlags::VIEWPORT, 7),
            (DirtyFlags::SETUP, 4),
            (DirtyFlags::MISC, 2),
            (DirtyFlags::TEX0, 9),
            (DirtyFlags::TEX1, 9),
            (DirtyFlags::TEX2, 9),
            (DirtyFlags::ZBIAS, 3),
        ];
        for (flag, words) in cases {
            let mut ring = VecRing::new();
            let mut state = StateSnapshot {
                dirty: flag,
                ..Default::default()
            };
            emit_state(&dev, &session, &mut ring, &mut state).unwrap();
            assert_eq!(ring.committed_words().len(), words, "{flag:?}");
        }
    }

    #[test]
    fn bad_offset_means_zero_ring_writes() {
        let (dev, session) = fixtures();
        let mut ring = VecRing::new();
        let mut state = StateSnapshot {
            dirty: DirtyFlags::CONTEXT | DirtyFlags::VIEWPORT | DirtyFlags::TEX1,
            ..Default::default()
        };
        // Context offsets are fine; the texture offset is garbage.
        state.tex[1].offset = 0xf000_0000;

        let err = emit_state(&dev, &session, &mut ring, &mut state).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Validate(ValidateError::InvalidOffset { .. })
        ));
        assert!(ring.words.is_empty());
        // Dirty bits survive so the caller can retry after fixing things.
        assert!(state.dirty.contains(DirtyFlags::VIEWPORT));
    }

    #[test]
    fn texture_group_targets_the_right_unit() {
        let (dev, session) = fixtures();
        let mut ring = VecRing::new();
        let mut state = StateSnapshot {
            dirty: DirtyFlags::TEX2,
            ..Default::default()
        };
        state.tex[2].offset = 0x1000_4000;
        state.tex[2].border_color = 0xff00ff00;

        emit_state(&dev, &session, &mut ring, &mut state).unwrap();
        assert_eq!(
            ring.words[0],
            cp_packet0(REG_TX_FILTER_0 + 2 * TX_UNIT_STRIDE, 5)
        );
        assert_eq!(ring.words[3], 0x1000_4000);
        assert_eq!(ring.words[7], cp_packet0(REG_TX_BORDER_COLOR_2, 0));
        assert_eq!(ring.words[8], 0xff00ff00);
    }
}
