//! Vermilion register map and command packet encodings.
//!
//! Register constants are byte addresses in the device's MMIO space. The
//! `V2_` prefix marks registers that only exist on the second microcode
//! generation; everything else is common to V1 and V2.

// ---------------------------------------------------------------------------
// Render backend (RB)

pub const REG_RB_MISC: u32 = 0x1c14;
pub const REG_RB_FOG_COLOR: u32 = 0x1c18;
pub const REG_RB_SOLID_COLOR: u32 = 0x1c1c;
pub const REG_RB_BLEND_CNTL: u32 = 0x1c20;
pub const REG_RB_DEPTH_OFFSET: u32 = 0x1c24;
pub const REG_RB_DEPTH_PITCH: u32 = 0x1c28;
pub const REG_RB_ZSTENCIL_CNTL: u32 = 0x1c2c;
pub const REG_RB_COLOR_CNTL: u32 = 0x1c3c;
pub const REG_RB_COLOR_OFFSET: u32 = 0x1c40;
pub const REG_RB_COLOR_PITCH: u32 = 0x1c48;
pub const REG_RB_STENCIL_REFMASK: u32 = 0x1d7c;
pub const REG_RB_ROP_CNTL: u32 = 0x1d80;
pub const REG_RB_PLANE_MASK: u32 = 0x1d84;
pub const V2_RB_DEPTHXY_OFFSET: u32 = 0x1d60;
pub const V2_RB_BLEND_COLOR: u32 = 0x3218;

// ---------------------------------------------------------------------------
// Pipe control

pub const REG_PIPE_CNTL: u32 = 0x1c38;
pub const V2_PIPE_CNTL_X: u32 = 0x2cc4;

// ---------------------------------------------------------------------------
// Geometry engine (GE)

pub const REG_GE_CNTL: u32 = 0x1c4c;
pub const REG_GE_COORD_FMT: u32 = 0x1c50;
pub const REG_GE_CNTL_STATUS: u32 = 0x2140;
pub const REG_GE_VPORT_XSCALE: u32 = 0x1d98;
pub const REG_GE_ZBIAS_FACTOR: u32 = 0x1db0;
pub const REG_GE_ZBIAS_CONSTANT: u32 = 0x1db4;
pub const REG_GE_LINE_WIDTH: u32 = 0x1db8;
pub const REG_GE_SCALAR_INDX: u32 = 0x2200;
pub const REG_GE_SCALAR_DATA: u32 = 0x2204;
pub const REG_GE_VECTOR_INDX: u32 = 0x2208;
pub const REG_GE_VECTOR_DATA: u32 = 0x220c;
pub const REG_GE_MATERIAL_EMISSIVE_RED: u32 = 0x2210;
pub const REG_GE_OUTPUT_VTX_FMT: u32 = 0x2254;
pub const REG_GE_STATE_FLUSH: u32 = 0x2284;
pub const V2_GE_VTX_FMT_0: u32 = 0x2090;
pub const V2_GE_VTE_CNTL: u32 = 0x20b0;
pub const V2_GE_VTX_STATE_CNTL: u32 = 0x2180;
pub const V2_GE_MATRIX_SEL_0: u32 = 0x2230;
pub const V2_GE_OUTPUT_VTX_COMP_SEL: u32 = 0x2250;
pub const V2_GE_LIGHT_MODEL_CTL_0: u32 = 0x2268;
pub const V2_GE_INPUT_VTX_VECTOR_ADDR_0: u32 = 0x2290;
pub const V2_GE_TEX_PROC_CTL_2: u32 = 0x22a8;
pub const V2_GE_UCP_VERT_BLEND_CTL: u32 = 0x22c0;
pub const V2_GE_POINT_SPRITE_CNTL: u32 = 0x22c4;
pub const V2_VP_CTL: u32 = 0x2080;
pub const V2_VP_PVS_CNTL_1: u32 = 0x22d0;

/// Dword stride field position in the scalar index register.
pub const SCALAR_STRIDE_SHIFT: u32 = 28;
/// Octword stride field position in the vector index register.
pub const VECTOR_STRIDE_SHIFT: u32 = 4;

// ---------------------------------------------------------------------------
// Texture units (TX). V1 carries three units, V2 six.

pub const REG_TX_FILTER_0: u32 = 0x1c54;
pub const REG_TX_FORMAT_0: u32 = 0x1c58;
pub const REG_TX_OFFSET_0: u32 = 0x1c5c;
pub const REG_TX_CBLEND_0: u32 = 0x1c60;
pub const REG_TX_ABLEND_0: u32 = 0x1c64;
pub const REG_TX_FACTOR_0: u32 = 0x1c68;
/// Byte stride between the three V1 texture unit register blocks.
pub const TX_UNIT_STRIDE: u32 = 0x18;

pub const REG_TX_LUM_MATRIX: u32 = 0x1d00;
pub const REG_TX_SIZE_0: u32 = 0x1d04;
pub const REG_TX_SIZE_1: u32 = 0x1d0c;
pub const REG_TX_SIZE_2: u32 = 0x1d14;
pub const REG_TX_CUBIC_FACES_0: u32 = 0x1d24;
pub const REG_TX_CUBIC_FACES_1: u32 = 0x1d28;
pub const REG_TX_CUBIC_FACES_2: u32 = 0x1d2c;
pub const REG_TX_BORDER_COLOR_0: u32 = 0x1d40;
pub const REG_TX_BORDER_COLOR_1: u32 = 0x1d44;
pub const REG_TX_BORDER_COLOR_2: u32 = 0x1d48;
pub const REG_TX_ROT_MATRIX_0: u32 = 0x1d58;
pub const REG_TX_CUBIC_OFFSET_T0_0: u32 = 0x1dd0;
pub const REG_TX_CUBIC_OFFSET_T1_0: u32 = 0x1de4;
pub const REG_TX_CUBIC_OFFSET_T2_0: u32 = 0x1df8;

pub const V2_TX_FILTER_0: u32 = 0x2c00;
/// Byte stride between the six V2 texture unit register blocks.
pub const V2_TX_UNIT_STRIDE: u32 = 0x20;
pub const V2_TX_CUBIC_FACES_0: u32 = 0x2c18;
pub const V2_TX_OFFSET_0: u32 = 0x2d00;
pub const V2_TX_OFFSET_STRIDE: u32 = 0x18;
pub const V2_TX_TAM_DEBUG3: u32 = 0x2d9c;
pub const V2_TX_CUBIC_OFFSET_F1_0: u32 = 0x2e00;
pub const V2_TX_FACTOR_0: u32 = 0x2ee0;
pub const V2_TX_CBLEND_0: u32 = 0x2f00;
pub const V2_TX_CBLEND_STRIDE: u32 = 0x10;
pub const V2_TX_TRI_PERF: u32 = 0x2cf8;
pub const V2_TX_AFS_0: u32 = 0x3400;
pub const V2_TX_AFS_1: u32 = 0x3480;

// ---------------------------------------------------------------------------
// Raster state (RS)

pub const REG_RS_LINE_PATTERN: u32 = 0x1cd0;
pub const REG_RS_MISC: u32 = 0x26c4;
pub const V2_RS_POINTSIZE: u32 = 0x2648;
pub const V2_RS_AUX_SCISSOR_CNTL: u32 = 0x26f0;
pub const V2_RS_SCISSOR_TL_0: u32 = 0x1cd8;
pub const V2_RS_SCISSOR_TL_1: u32 = 0x1ce0;
pub const V2_RS_SCISSOR_TL_2: u32 = 0x1ce8;

// ---------------------------------------------------------------------------
// Clip rectangle, synchronization, scratch

pub const REG_CLIP_TOP_LEFT: u32 = 0x26c0;
/// Takes the inclusive bottom-right coordinate, `(y2 - 1) << 16 | (x2 - 1)`.
pub const REG_CLIP_BOTTOM_RIGHT: u32 = 0x1c44;

pub const REG_WAIT_UNTIL: u32 = 0x1720;
pub const WAIT_2D_IDLE_CLEAN: u32 = 1 << 16;
pub const WAIT_3D_IDLE_CLEAN: u32 = 1 << 17;

/// Scratch register the dispatcher writes DMA buffer ages into.
pub const REG_SCRATCH_DISPATCH_AGE: u32 = 0x15e4;

// ---------------------------------------------------------------------------
// Surface registers. Slot `i` lives at `REG_SURFACE0_* + i * SURFACE_REG_STRIDE`.

pub const REG_SURFACE0_LOWER: u32 = 0x0b04;
pub const REG_SURFACE0_UPPER: u32 = 0x0b08;
pub const REG_SURFACE0_INFO: u32 = 0x0b0c;
pub const SURFACE_REG_STRIDE: u32 = 16;

// ---------------------------------------------------------------------------
// Ring packet headers
//
// Type-0 header: bits 31:30 = 0, bits 29:16 = word count - 1, bit 15 =
// one-register mode, bits 12:0 = register byte address >> 2.
// Type-3 header: bits 31:30 = 3, bits 29:16 = count (payload words - 1),
// bits 15:8 = family.

/// Set in a type-0 header to write every payload word to the same register.
pub const ONE_REG_WR: u32 = 1 << 15;

/// Type-0 header writing `count + 1` words starting at `reg`.
#[inline]
pub const fn cp_packet0(reg: u32, count: u32) -> u32 {
    (count << 16) | (reg >> 2)
}

/// Type-0 header writing `count + 1` words, all to `reg`.
#[inline]
pub const fn cp_packet0_one_reg(reg: u32, count: u32) -> u32 {
    cp_packet0(reg, count) | ONE_REG_WR
}

/// Type-3 header for `family` with `count + 2` total packet words.
#[inline]
pub const fn cp_packet3(family: u32, count: u32) -> u32 {
    0xc000_0000 | family | (count << 16)
}

// ---------------------------------------------------------------------------
// Type-3 packet families (bits 15:8 of the header)

pub const P3_NOP: u32 = 0x1000;
pub const P3_RNDR_GEN_INDX_PRIM: u32 = 0x2300;
pub const P3_WAIT_FOR_IDLE: u32 = 0x2600;
pub const P3_3D_DRAW_IMMD: u32 = 0x2800;
pub const P3_3D_DRAW_VBUF: u32 = 0x2900;
pub const P3_3D_DRAW_INDX: u32 = 0x2a00;
pub const P3_LOAD_VBPNTR: u32 = 0x2f00;
pub const P3_3D_CLEAR_ZMASK: u32 = 0x3200;
pub const P3_INDX_BUFFER: u32 = 0x3300;
pub const P3_3D_DRAW_VBUF_2: u32 = 0x3400;
pub const P3_3D_DRAW_IMMD_2: u32 = 0x3500;
pub const P3_3D_DRAW_INDX_2: u32 = 0x3600;
pub const P3_3D_CLEAR_HIZ: u32 = 0x3700;
pub const P3_CNTL_HOSTDATA_BLT: u32 = 0x9400;
pub const P3_CNTL_PAINT_MULTI: u32 = 0x9a00;
pub const P3_CNTL_BITBLT_MULTI: u32 = 0x9b00;

/// Fixed register pattern an indexed-buffer load must carry in word 1.
pub const INDX_BUFFER_SANITY_MASK: u32 = 0x8000_ffff;
pub const INDX_BUFFER_SANITY_VALUE: u32 = 0x8000_0810;
