//! Command-stream gatekeeper for the Vermilion legacy GPU family.
//!
//! Userspace builds command buffers in a tagged sub-command format and the
//! kernel driver feeds this crate each submission. Nothing reaches the
//! hardware ring until it has been validated: every GPU address is checked
//! against (and, for legacy conventions, relocated into) the framebuffer
//! and GART apertures, packet lengths are checked against the buffer, and
//! microcode-generation-specific packet families are gated on the loaded
//! microcode. The crate also owns the on-chip surface table and the DMA
//! buffer retirement bookkeeping those submissions reference.
//!
//! The caller holds the per-device command lock around every entry point;
//! nothing here synchronizes internally.

pub mod aperture;
pub mod context;
pub mod dispatch;
pub mod dma;
pub mod error;
pub mod packet3;
pub mod packets;
pub mod regs;
pub mod ring;
pub mod state;
pub mod surface;
pub mod writer;

pub use aperture::{fix_offset, ApertureMap};
pub use context::{ClearFlags, ClientId, DeviceContext, Microcode, SessionContext};
pub use dispatch::{dispatch_cmdbuf, ClipRect, SubCommand, CMD_BUFFER_MAX_BYTES};
pub use dma::DmaBufferTable;
pub use error::{DispatchError, DmaError, RingFull, SurfaceError, ValidateError};
pub use packet3::{check_and_fix_packet3, ValidatedPacket3};
pub use packets::{check_and_fix_packet0, StatePacket, STATE_PACKETS};
pub use ring::{FixedRing, RingWriter, VecRing};
pub use state::{emit_state, ContextRegs, DirtyFlags, StateSnapshot, TextureRegs};
pub use surface::{SurfaceRegs, SurfaceTable, VecSurfaceRegs};
pub use writer::CmdStreamWriter;
