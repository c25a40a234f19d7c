//! Device-level and per-session validator state.

use bitflags::bitflags;

use crate::aperture::ApertureMap;
use crate::dma::DmaBufferTable;
use crate::error::ValidateError;

/// Opaque identifier for a userspace client holding a device file open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u32);

/// Microcode generation loaded on the device. Several type-3 families only
/// exist on one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Microcode {
    V1,
    V2,
}

bitflags! {
    /// Buffers a clear operation may touch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const FRONT = 1 << 0;
        const BACK = 1 << 1;
        const DEPTH = 1 << 2;
        const STENCIL = 1 << 3;
    }
}

/// State shared by every session on one device. The caller serializes
/// access with the per-device command lock, so none of this is internally
/// synchronized.
#[derive(Debug)]
pub struct DeviceContext {
    pub apertures: ApertureMap,
    pub microcode: Microcode,
    pub dma: DmaBufferTable,
}

impl DeviceContext {
    pub fn new(apertures: ApertureMap, microcode: Microcode, dma_buffer_count: usize) -> Self {
        Self {
            apertures,
            microcode,
            dma: DmaBufferTable::new(dma_buffer_count),
        }
    }

    pub fn fix_offset(&self, session: &SessionContext, raw: u32) -> Result<u32, ValidateError> {
        crate::aperture::fix_offset(&self.apertures, session.fb_delta, raw)
    }
}

/// Per-client validator state.
#[derive(Debug)]
pub struct SessionContext {
    pub client: ClientId,
    /// Relocation applied to zero-based framebuffer offsets this client
    /// submits (second fixup tier).
    pub fb_delta: i64,
    /// Set once the session has submitted a validated depth-buffer offset.
    /// Until then, clears must not touch depth or stencil.
    pub have_depth_offset: bool,
}

impl SessionContext {
    pub fn new(client: ClientId) -> Self {
        Self {
            client,
            fb_delta: 0,
            have_depth_offset: false,
        }
    }

    /// Downgrade a requested clear so it cannot scribble over memory the
    /// session never proved it owns: without a validated depth offset,
    /// depth and stencil clears are dropped.
    pub fn sanitize_clear_flags(&self, flags: ClearFlags) -> ClearFlags {
        if self.have_depth_offset {
            flags
        } else {
            flags & !(ClearFlags::DEPTH | ClearFlags::STENCIL)
        }
    }
}
