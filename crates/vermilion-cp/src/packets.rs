//! Type-0 state packet table and validation.
//!
//! A type-0 sub-command names one entry of [`STATE_PACKETS`] by id and
//! carries exactly that entry's word count as payload. Most entries are
//! plain register values and pass through verbatim; the handful that carry
//! GPU addresses get each address routed through the offset fixup before
//! anything reaches the ring.

use crate::context::{DeviceContext, SessionContext};
use crate::error::ValidateError;
use crate::regs::*;

/// One type-0 packet: payload words land at `reg`, `reg + 4`, ...
#[derive(Debug, Clone, Copy)]
pub struct StatePacket {
    pub reg: u32,
    pub len: u16,
    pub name: &'static str,
}

const fn pkt(reg: u32, len: u16, name: &'static str) -> StatePacket {
    StatePacket { reg, len, name }
}

/// Packet ids, indices into [`STATE_PACKETS`]. The numbering is ABI: ids
/// appear verbatim in submitted command buffers.
pub mod pkt_id {
    pub const CTX_MISC: u8 = 0;
    pub const CTX_COLOR: u8 = 1;
    pub const RB_COLOR_PITCH: u8 = 2;
    pub const RS_LINE_PATTERN: u8 = 3;
    pub const GE_LINE_WIDTH: u8 = 4;
    pub const TX_LUM_MATRIX: u8 = 5;
    pub const TX_ROT_MATRIX: u8 = 6;
    pub const RB_STENCIL_REFMASK: u8 = 7;
    pub const GE_VPORT: u8 = 8;
    pub const GE_CNTL: u8 = 9;
    pub const GE_CNTL_STATUS: u8 = 10;
    pub const RS_MISC: u8 = 11;
    pub const TX_FILTER_0: u8 = 12;
    pub const TX_BORDER_COLOR_0: u8 = 13;
    pub const TX_FILTER_1: u8 = 14;
    pub const TX_BORDER_COLOR_1: u8 = 15;
    pub const TX_FILTER_2: u8 = 16;
    pub const TX_BORDER_COLOR_2: u8 = 17;
    pub const GE_ZBIAS: u8 = 18;
    pub const GE_OUTPUT_VTX_FMT: u8 = 19;
    pub const GE_MATERIAL: u8 = 20;
    pub const V2_TX_CBLEND_0: u8 = 21;
    pub const V2_TX_CBLEND_1: u8 = 22;
    pub const V2_TX_CBLEND_2: u8 = 23;
    pub const V2_TX_CBLEND_3: u8 = 24;
    pub const V2_TX_CBLEND_4: u8 = 25;
    pub const V2_TX_CBLEND_5: u8 = 26;
    pub const V2_TX_CBLEND_6: u8 = 27;
    pub const V2_TX_CBLEND_7: u8 = 28;
    pub const V2_GE_LIGHT_MODEL_CTL: u8 = 29;
    pub const V2_TX_FACTOR: u8 = 30;
    pub const V2_GE_VTX_FMT: u8 = 31;
    pub const V2_VP_CTL: u8 = 32;
    pub const V2_GE_MATRIX_SEL: u8 = 33;
    pub const V2_GE_TEX_PROC_CTL_2: u8 = 34;
    pub const V2_GE_UCP_VERT_BLEND_CTL: u8 = 35;
    pub const V2_TX_FILTER_0: u8 = 36;
    pub const V2_TX_FILTER_1: u8 = 37;
    pub const V2_TX_FILTER_2: u8 = 38;
    pub const V2_TX_FILTER_3: u8 = 39;
    pub const V2_TX_FILTER_4: u8 = 40;
    pub const V2_TX_FILTER_5: u8 = 41;
    pub const V2_TX_OFFSET_0: u8 = 42;
    pub const V2_TX_OFFSET_1: u8 = 43;
    pub const V2_TX_OFFSET_2: u8 = 44;
    pub const V2_TX_OFFSET_3: u8 = 45;
    pub const V2_TX_OFFSET_4: u8 = 46;
    pub const V2_TX_OFFSET_5: u8 = 47;
    pub const V2_GE_VTE_CNTL: u8 = 48;
    pub const V2_GE_OUTPUT_VTX_COMP_SEL: u8 = 49;
    pub const V2_TX_TAM_DEBUG3: u8 = 50;
    pub const V2_PIPE_CNTL_X: u8 = 51;
    pub const V2_RB_DEPTHXY_OFFSET: u8 = 52;
    pub const V2_RS_AUX_SCISSOR_CNTL: u8 = 53;
    pub const V2_RS_SCISSOR_0: u8 = 54;
    pub const V2_RS_SCISSOR_1: u8 = 55;
    pub const V2_RS_SCISSOR_2: u8 = 56;
    pub const V2_VP_CTL_STATUS: u8 = 57;
    pub const V2_GE_VTX_STATE_CNTL: u8 = 58;
    pub const V2_RS_POINTSIZE: u8 = 59;
    pub const V2_GE_INPUT_VTX_VECTOR_ADDR: u8 = 60;
    pub const V2_TX_CUBIC_FACES_0: u8 = 61;
    pub const V2_TX_CUBIC_OFFSETS_0: u8 = 62;
    pub const V2_TX_CUBIC_FACES_1: u8 = 63;
    pub const V2_TX_CUBIC_OFFSETS_1: u8 = 64;
    pub const V2_TX_CUBIC_FACES_2: u8 = 65;
    pub const V2_TX_CUBIC_OFFSETS_2: u8 = 66;
    pub const V2_TX_CUBIC_FACES_3: u8 = 67;
    pub const V2_TX_CUBIC_OFFSETS_3: u8 = 68;
    pub const V2_TX_CUBIC_FACES_4: u8 = 69;
    pub const V2_TX_CUBIC_OFFSETS_4: u8 = 70;
    pub const V2_TX_CUBIC_FACES_5: u8 = 71;
    pub const V2_TX_CUBIC_OFFSETS_5: u8 = 72;
    pub const TX_SIZE_0: u8 = 73;
    pub const TX_SIZE_1: u8 = 74;
    pub const TX_SIZE_2: u8 = 75;
    pub const V2_RB_BLEND_COLOR: u8 = 76;
    pub const V2_GE_POINT_SPRITE_CNTL: u8 = 77;
    pub const TX_CUBIC_FACES_0: u8 = 78;
    pub const TX_CUBIC_OFFSETS_0: u8 = 79;
    pub const TX_CUBIC_FACES_1: u8 = 80;
    pub const TX_CUBIC_OFFSETS_1: u8 = 81;
    pub const TX_CUBIC_FACES_2: u8 = 82;
    pub const TX_CUBIC_OFFSETS_2: u8 = 83;
    pub const V2_TX_TRI_PERF: u8 = 84;
    pub const V2_TX_AFS_0: u8 = 85;
    pub const V2_TX_AFS_1: u8 = 86;
    pub const V2_ATF_FACTOR: u8 = 87;
    pub const V2_TX_CTL_ALL_0: u8 = 88;
    pub const V2_TX_CTL_ALL_1: u8 = 89;
    pub const V2_TX_CTL_ALL_2: u8 = 90;
    pub const V2_TX_CTL_ALL_3: u8 = 91;
    pub const V2_TX_CTL_ALL_4: u8 = 92;
    pub const V2_TX_CTL_ALL_5: u8 = 93;
    pub const V2_VP_PVS_CNTL: u8 = 94;
}

pub const STATE_PACKET_COUNT: usize = 95;

/// The full packet id space. Entry order is ABI and must never change.
pub const STATE_PACKETS: [StatePacket; STATE_PACKET_COUNT] = [
    pkt(REG_RB_MISC, 7, "CTX_MISC"),
    pkt(REG_PIPE_CNTL, 3, "CTX_COLOR"),
    pkt(REG_RB_COLOR_PITCH, 1, "RB_COLOR_PITCH"),
    pkt(REG_RS_LINE_PATTERN, 2, "RS_LINE_PATTERN"),
    pkt(REG_GE_LINE_WIDTH, 1, "GE_LINE_WIDTH"),
    pkt(REG_TX_LUM_MATRIX, 1, "TX_LUM_MATRIX"),
    pkt(REG_TX_ROT_MATRIX_0, 2, "TX_ROT_MATRIX"),
    pkt(REG_RB_STENCIL_REFMASK, 3, "RB_STENCIL_REFMASK"),
    pkt(REG_GE_VPORT_XSCALE, 6, "GE_VPORT"),
    pkt(REG_GE_CNTL, 2, "GE_CNTL"),
    pkt(REG_GE_CNTL_STATUS, 1, "GE_CNTL_STATUS"),
    pkt(REG_RS_MISC, 1, "RS_MISC"),
    pkt(REG_TX_FILTER_0, 6, "TX_FILTER_0"),
    pkt(REG_TX_BORDER_COLOR_0, 1, "TX_BORDER_COLOR_0"),
    pkt(REG_TX_FILTER_0 + TX_UNIT_STRIDE, 6, "TX_FILTER_1"),
    pkt(REG_TX_BORDER_COLOR_1, 1, "TX_BORDER_COLOR_1"),
    pkt(REG_TX_FILTER_0 + 2 * TX_UNIT_STRIDE, 6, "TX_FILTER_2"),
    pkt(REG_TX_BORDER_COLOR_2, 1, "TX_BORDER_COLOR_2"),
    pkt(REG_GE_ZBIAS_FACTOR, 2, "GE_ZBIAS"),
    pkt(REG_GE_OUTPUT_VTX_FMT, 11, "GE_OUTPUT_VTX_FMT"),
    pkt(REG_GE_MATERIAL_EMISSIVE_RED, 17, "GE_MATERIAL"),
    pkt(V2_TX_CBLEND_0, 4, "V2_TX_CBLEND_0"),
    pkt(V2_TX_CBLEND_0 + V2_TX_CBLEND_STRIDE, 4, "V2_TX_CBLEND_1"),
    pkt(V2_TX_CBLEND_0 + 2 * V2_TX_CBLEND_STRIDE, 4, "V2_TX_CBLEND_2"),
    pkt(V2_TX_CBLEND_0 + 3 * V2_TX_CBLEND_STRIDE, 4, "V2_TX_CBLEND_3"),
    pkt(V2_TX_CBLEND_0 + 4 * V2_TX_CBLEND_STRIDE, 4, "V2_TX_CBLEND_4"),
    pkt(V2_TX_CBLEND_0 + 5 * V2_TX_CBLEND_STRIDE, 4, "V2_TX_CBLEND_5"),
    pkt(V2_TX_CBLEND_0 + 6 * V2_TX_CBLEND_STRIDE, 4, "V2_TX_CBLEND_6"),
    pkt(V2_TX_CBLEND_0 + 7 * V2_TX_CBLEND_STRIDE, 4, "V2_TX_CBLEND_7"),
    pkt(V2_GE_LIGHT_MODEL_CTL_0, 6, "V2_GE_LIGHT_MODEL_CTL"),
    pkt(V2_TX_FACTOR_0, 6, "V2_TX_FACTOR"),
    pkt(V2_GE_VTX_FMT_0, 4, "V2_GE_VTX_FMT"),
    pkt(V2_VP_CTL, 1, "V2_VP_CTL"),
    pkt(V2_GE_MATRIX_SEL_0, 5, "V2_GE_MATRIX_SEL"),
    pkt(V2_GE_TEX_PROC_CTL_2, 5, "V2_GE_TEX_PROC_CTL_2"),
    pkt(V2_GE_UCP_VERT_BLEND_CTL, 1, "V2_GE_UCP_VERT_BLEND_CTL"),
    pkt(V2_TX_FILTER_0, 6, "V2_TX_FILTER_0"),
    pkt(V2_TX_FILTER_0 + V2_TX_UNIT_STRIDE, 6, "V2_TX_FILTER_1"),
    pkt(V2_TX_FILTER_0 + 2 * V2_TX_UNIT_STRIDE, 6, "V2_TX_FILTER_2"),
    pkt(V2_TX_FILTER_0 + 3 * V2_TX_UNIT_STRIDE, 6, "V2_TX_FILTER_3"),
    pkt(V2_TX_FILTER_0 + 4 * V2_TX_UNIT_STRIDE, 6, "V2_TX_FILTER_4"),
    pkt(V2_TX_FILTER_0 + 5 * V2_TX_UNIT_STRIDE, 6, "V2_TX_FILTER_5"),
    pkt(V2_TX_OFFSET_0, 1, "V2_TX_OFFSET_0"),
    pkt(V2_TX_OFFSET_0 + V2_TX_OFFSET_STRIDE, 1, "V2_TX_OFFSET_1"),
    pkt(V2_TX_OFFSET_0 + 2 * V2_TX_OFFSET_STRIDE, 1, "V2_TX_OFFSET_2"),
    pkt(V2_TX_OFFSET_0 + 3 * V2_TX_OFFSET_STRIDE, 1, "V2_TX_OFFSET_3"),
    pkt(V2_TX_OFFSET_0 + 4 * V2_TX_OFFSET_STRIDE, 1, "V2_TX_OFFSET_4"),
    pkt(V2_TX_OFFSET_0 + 5 * V2_TX_OFFSET_STRIDE, 1, "V2_TX_OFFSET_5"),
    pkt(V2_GE_VTE_CNTL, 1, "V2_GE_VTE_CNTL"),
    pkt(V2_GE_OUTPUT_VTX_COMP_SEL, 1, "V2_GE_OUTPUT_VTX_COMP_SEL"),
    pkt(V2_TX_TAM_DEBUG3, 1, "V2_TX_TAM_DEBUG3"),
    pkt(V2_PIPE_CNTL_X, 1, "V2_PIPE_CNTL_X"),
    pkt(V2_RB_DEPTHXY_OFFSET, 1, "V2_RB_DEPTHXY_OFFSET"),
    pkt(V2_RS_AUX_SCISSOR_CNTL, 1, "V2_RS_AUX_SCISSOR_CNTL"),
    pkt(V2_RS_SCISSOR_TL_0, 2, "V2_RS_SCISSOR_0"),
    pkt(V2_RS_SCISSOR_TL_1, 2, "V2_RS_SCISSOR_1"),
    pkt(V2_RS_SCISSOR_TL_2, 2, "V2_RS_SCISSOR_2"),
    pkt(REG_GE_CNTL_STATUS, 1, "V2_VP_CTL_STATUS"),
    pkt(V2_GE_VTX_STATE_CNTL, 1, "V2_GE_VTX_STATE_CNTL"),
    pkt(V2_RS_POINTSIZE, 1, "V2_RS_POINTSIZE"),
    pkt(V2_GE_INPUT_VTX_VECTOR_ADDR_0, 4, "V2_GE_INPUT_VTX_VECTOR_ADDR"),
    pkt(V2_TX_CUBIC_FACES_0, 1, "V2_TX_CUBIC_FACES_0"),
    pkt(V2_TX_CUBIC_OFFSET_F1_0, 5, "V2_TX_CUBIC_OFFSETS_0"),
    pkt(V2_TX_CUBIC_FACES_0 + V2_TX_UNIT_STRIDE, 1, "V2_TX_CUBIC_FACES_1"),
    pkt(V2_TX_CUBIC_OFFSET_F1_0 + V2_TX_UNIT_STRIDE, 5, "V2_TX_CUBIC_OFFSETS_1"),
    pkt(V2_TX_CUBIC_FACES_0 + 2 * V2_TX_UNIT_STRIDE, 1, "V2_TX_CUBIC_FACES_2"),
    pkt(V2_TX_CUBIC_OFFSET_F1_0 + 2 * V2_TX_UNIT_STRIDE, 5, "V2_TX_CUBIC_OFFSETS_2"),
    pkt(V2_TX_CUBIC_FACES_0 + 3 * V2_TX_UNIT_STRIDE, 1, "V2_TX_CUBIC_FACES_3"),
    pkt(V2_TX_CUBIC_OFFSET_F1_0 + 3 * V2_TX_UNIT_STRIDE, 5, "V2_TX_CUBIC_OFFSETS_3"),
    pkt(V2_TX_CUBIC_FACES_0 + 4 * V2_TX_UNIT_STRIDE, 1, "V2_TX_CUBIC_FACES_4"),
    pkt(V2_TX_CUBIC_OFFSET_F1_0 + 4 * V2_TX_UNIT_STRIDE, 5, "V2_TX_CUBIC_OFFSETS_4"),
    pkt(V2_TX_CUBIC_FACES_0 + 5 * V2_TX_UNIT_STRIDE, 1, "V2_TX_CUBIC_FACES_5"),
    pkt(V2_TX_CUBIC_OFFSET_F1_0 + 5 * V2_TX_UNIT_STRIDE, 5, "V2_TX_CUBIC_OFFSETS_5"),
    pkt(REG_TX_SIZE_0, 2, "TX_SIZE_0"),
    pkt(REG_TX_SIZE_1, 2, "TX_SIZE_1"),
    pkt(REG_TX_SIZE_2, 2, "TX_SIZE_2"),
    pkt(V2_RB_BLEND_COLOR, 3, "V2_RB_BLEND_COLOR"),
    pkt(V2_GE_POINT_SPRITE_CNTL, 1, "V2_GE_POINT_SPRITE_CNTL"),
    pkt(REG_TX_CUBIC_FACES_0, 1, "TX_CUBIC_FACES_0"),
    pkt(REG_TX_CUBIC_OFFSET_T0_0, 5, "TX_CUBIC_OFFSETS_0"),
    pkt(REG_TX_CUBIC_FACES_1, 1, "TX_CUBIC_FACES_1"),
    pkt(REG_TX_CUBIC_OFFSET_T1_0, 5, "TX_CUBIC_OFFSETS_1"),
    pkt(REG_TX_CUBIC_FACES_2, 1, "TX_CUBIC_FACES_2"),
    pkt(REG_TX_CUBIC_OFFSET_T2_0, 5, "TX_CUBIC_OFFSETS_2"),
    pkt(V2_TX_TRI_PERF, 2, "V2_TX_TRI_PERF"),
    pkt(V2_TX_AFS_0, 32, "V2_TX_AFS_0"),
    pkt(V2_TX_AFS_1, 32, "V2_TX_AFS_1"),
    pkt(V2_TX_FACTOR_0, 8, "V2_ATF_FACTOR"),
    pkt(V2_TX_FILTER_0, 8, "V2_TX_CTL_ALL_0"),
    pkt(V2_TX_FILTER_0 + V2_TX_UNIT_STRIDE, 8, "V2_TX_CTL_ALL_1"),
    pkt(V2_TX_FILTER_0 + 2 * V2_TX_UNIT_STRIDE, 8, "V2_TX_CTL_ALL_2"),
    pkt(V2_TX_FILTER_0 + 3 * V2_TX_UNIT_STRIDE, 8, "V2_TX_CTL_ALL_3"),
    pkt(V2_TX_FILTER_0 + 4 * V2_TX_UNIT_STRIDE, 8, "V2_TX_CTL_ALL_4"),
    pkt(V2_TX_FILTER_0 + 5 * V2_TX_UNIT_STRIDE, 8, "V2_TX_CTL_ALL_5"),
    pkt(V2_VP_PVS_CNTL_1, 2, "V2_VP_PVS_CNTL"),
];

/// Payload word carrying the depth buffer address in `CTX_MISC`.
pub const CTX_MISC_DEPTH_OFFSET_WORD: usize =
    ((REG_RB_DEPTH_OFFSET - REG_RB_MISC) / 4) as usize;
/// Payload word carrying the color buffer address in `CTX_COLOR`.
pub const CTX_COLOR_OFFSET_WORD: usize = ((REG_RB_COLOR_OFFSET - REG_PIPE_CNTL) / 4) as usize;
/// Payload word carrying the texture address in the V1 `TX_FILTER_n` groups.
pub const TX_FILTER_OFFSET_WORD: usize = ((REG_TX_OFFSET_0 - REG_TX_FILTER_0) / 4) as usize;

fn fix_word(
    dev: &DeviceContext,
    session: &SessionContext,
    word: &mut u32,
) -> Result<(), ValidateError> {
    *word = dev.fix_offset(session, *word)?;
    Ok(())
}

/// Validate one type-0 packet payload in place. `payload.len()` must match
/// the table entry for `id`; the dispatcher guarantees this.
///
/// Address-carrying words are rewritten with their fixed-up values. The
/// depth packet additionally arms the session's depth-offset flag.
pub fn check_and_fix_packet0(
    dev: &DeviceContext,
    session: &mut SessionContext,
    id: u8,
    payload: &mut [u32],
) -> Result<(), ValidateError> {
    debug_assert_eq!(
        payload.len(),
        STATE_PACKETS
            .get(usize::from(id))
            .map_or(0, |p| usize::from(p.len))
    );

    match id {
        pkt_id::CTX_MISC => {
            fix_word(dev, session, &mut payload[CTX_MISC_DEPTH_OFFSET_WORD])?;
            session.have_depth_offset = true;
            Ok(())
        }
        pkt_id::CTX_COLOR => fix_word(dev, session, &mut payload[CTX_COLOR_OFFSET_WORD]),
        pkt_id::V2_TX_OFFSET_0
        | pkt_id::V2_TX_OFFSET_1
        | pkt_id::V2_TX_OFFSET_2
        | pkt_id::V2_TX_OFFSET_3
        | pkt_id::V2_TX_OFFSET_4
        | pkt_id::V2_TX_OFFSET_5 => fix_word(dev, session, &mut payload[0]),
        pkt_id::TX_FILTER_0 | pkt_id::TX_FILTER_1 | pkt_id::TX_FILTER_2 => {
            fix_word(dev, session, &mut payload[TX_FILTER_OFFSET_WORD])
        }
        pkt_id::V2_TX_CUBIC_OFFSETS_0
        | pkt_id::V2_TX_CUBIC_OFFSETS_1
        | pkt_id::V2_TX_CUBIC_OFFSETS_2
        | pkt_id::V2_TX_CUBIC_OFFSETS_3
        | pkt_id::V2_TX_CUBIC_OFFSETS_4
        | pkt_id::V2_TX_CUBIC_OFFSETS_5
        | pkt_id::TX_CUBIC_OFFSETS_0
        | pkt_id::TX_CUBIC_OFFSETS_1
        | pkt_id::TX_CUBIC_OFFSETS_2 => {
            for word in payload.iter_mut() {
                fix_word(dev, session, word)?;
            }
            Ok(())
        }
        // Remaining known ids carry no addresses and pass through verbatim.
        _ if usize::from(id) < STATE_PACKET_COUNT => Ok(()),
        _ => Err(ValidateError::UnknownOpcode {
            opcode: u32::from(id),
        }),
    }
}
