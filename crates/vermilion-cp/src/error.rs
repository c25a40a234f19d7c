//! Error types shared across the command-stream validator.

use thiserror::Error;

use crate::context::Microcode;

/// Rejection causes raised while validating a submitted command stream.
///
/// Every variant carries the offending value so callers can log a useful
/// diagnostic without re-parsing the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidateError {
    /// An address failed containment in both apertures even after every
    /// fixup tier was applied.
    #[error("offset 0x{offset:08x} lies outside the framebuffer and GART apertures")]
    InvalidOffset { offset: u32 },

    /// A declared packet length is inconsistent with the remaining buffer,
    /// or an internal count field is inconsistent with the actual payload.
    #[error("malformed packet: {reason}")]
    MalformedPacket { reason: &'static str },

    /// A packet id, type-3 family or sub-command tag the device does not
    /// recognise.
    #[error("unknown opcode 0x{opcode:08x}")]
    UnknownOpcode { opcode: u32 },

    /// A packet family that only exists on one microcode generation was
    /// submitted to a device running the other one.
    #[error("packet family 0x{family:04x} requires {required:?} microcode")]
    ChipMismatch { family: u32, required: Microcode },

    /// A fixed bit pattern the hardware relies on was not present.
    #[error("sanity check failed: found 0x{found:08x}, expected 0x{expected:08x}")]
    SanityCheckFailed { found: u32, expected: u32 },
}

/// Failures raised by the on-chip surface allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// Lower/upper bounds are misaligned, empty, or the flags word is zero.
    #[error("surface range [0x{lower:08x}, 0x{upper:08x}) is not allocatable")]
    BadRange { lower: u32, upper: u32 },

    /// The requested range overlaps an active surface with different flags,
    /// or an active surface that is already shared twice.
    #[error("surface range [0x{lower:08x}, 0x{upper:08x}) conflicts with an active surface")]
    Conflict { lower: u32, upper: u32 },

    /// All hardware slots (or all virtual handles) are in use.
    #[error("surface table exhausted")]
    TableExhausted,

    /// No surface owned by the calling session starts at this address.
    #[error("no surface owned by this client starts at 0x{lower:08x}")]
    NotFound { lower: u32 },
}

/// The ring cannot take a write group of the requested size right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ring full: need {needed} words, {free} free")]
pub struct RingFull {
    pub needed: u32,
    pub free: u32,
}

/// Failures raised while retiring DMA buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DmaError {
    #[error("DMA buffer index {index} out of range ({count} buffers)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("DMA buffer {index} is not owned by the submitting client")]
    NotOwner { index: usize },

    #[error("DMA buffer {index} is already pending retirement")]
    AlreadyPending { index: usize },
}

/// Top-level dispatch failure: validation, ring backpressure, or DMA
/// bookkeeping. The buffer is abandoned at the first error; ring groups
/// committed before the failure stay committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Ring(#[from] RingFull),

    #[error(transparent)]
    Dma(#[from] DmaError),

    #[error("command buffer of {size} bytes exceeds the submission cap")]
    BufferTooLarge { size: usize },
}
