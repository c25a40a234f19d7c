//! Type-3 packet validation.
//!
//! A type-3 packet is `0xC000_0000 | family | (count << 16)` followed by
//! `count + 1` payload words, so the whole packet spans `count + 2` words.
//! Validation works on a copy of the packet and returns the corrected copy;
//! the submitted buffer is never rewritten in place.

use tracing::trace;

use crate::context::{DeviceContext, Microcode, SessionContext};
use crate::error::ValidateError;
use crate::regs::*;

/// Largest `count` accepted for a vertex-array-pointer table: the header
/// word plus up to 12 arrays in 6 attribute/offset pair groups.
pub const VBPNTR_MAX_COUNT: u32 = 18;

/// Bits of the blit control word selecting which pitch/offset words follow.
pub const BLIT_SRC_PITCH_OFFSET: u32 = 1 << 0;
pub const BLIT_DST_PITCH_OFFSET: u32 = 1 << 1;

/// A validated type-3 packet: a corrected copy of the packet words, ready
/// to be written to the ring verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPacket3 {
    pub words: Vec<u32>,
}

impl ValidatedPacket3 {
    /// Words consumed from the submitted buffer.
    pub fn consumed(&self) -> usize {
        self.words.len()
    }
}

fn require(dev: &DeviceContext, family: u32, required: Microcode) -> Result<(), ValidateError> {
    if dev.microcode == required {
        Ok(())
    } else {
        Err(ValidateError::ChipMismatch { family, required })
    }
}

fn fix_word(
    dev: &DeviceContext,
    session: &SessionContext,
    pkt: &mut [u32],
    index: usize,
    what: &'static str,
) -> Result<(), ValidateError> {
    let word = pkt
        .get_mut(index)
        .ok_or(ValidateError::MalformedPacket { reason: what })?;
    *word = dev.fix_offset(session, *word)?;
    Ok(())
}

/// Validate the type-3 packet at the head of `words` (the unprocessed tail
/// of a command buffer). On success the returned packet holds exactly the
/// consumed words, with every GPU address fixed up.
pub fn check_and_fix_packet3(
    dev: &DeviceContext,
    session: &SessionContext,
    words: &[u32],
) -> Result<ValidatedPacket3, ValidateError> {
    let header = *words.first().ok_or(ValidateError::MalformedPacket {
        reason: "type-3 packet header missing",
    })?;

    if header >> 30 != 3 {
        return Err(ValidateError::UnknownOpcode { opcode: header });
    }
    let count = (header >> 16) & 0x3fff;
    let consumed = count as usize + 2;
    if consumed > words.len() {
        return Err(ValidateError::MalformedPacket {
            reason: "type-3 packet overruns the buffer",
        });
    }

    let mut pkt = words[..consumed].to_vec();
    let family = header & 0xff00;
    trace!(family = format_args!("0x{family:04x}"), count, "type-3 packet");

    match family {
        P3_NOP | P3_WAIT_FOR_IDLE | P3_3D_DRAW_IMMD | P3_3D_DRAW_VBUF | P3_3D_DRAW_INDX
        | P3_3D_CLEAR_ZMASK => {}

        P3_3D_DRAW_IMMD_2 | P3_3D_DRAW_VBUF_2 | P3_3D_DRAW_INDX_2 | P3_3D_CLEAR_HIZ => {
            require(dev, family, Microcode::V2)?;
        }

        P3_RNDR_GEN_INDX_PRIM => {
            require(dev, family, Microcode::V1)?;
            fix_word(dev, session, &mut pkt, 1, "indexed prim offset missing")?;
        }

        P3_INDX_BUFFER => {
            require(dev, family, Microcode::V2)?;
            let word1 = *pkt.get(1).ok_or(ValidateError::MalformedPacket {
                reason: "index buffer control word missing",
            })?;
            if word1 & INDX_BUFFER_SANITY_MASK != INDX_BUFFER_SANITY_VALUE {
                return Err(ValidateError::SanityCheckFailed {
                    found: word1,
                    expected: INDX_BUFFER_SANITY_VALUE,
                });
            }
            fix_word(dev, session, &mut pkt, 2, "index buffer offset missing")?;
        }

        P3_LOAD_VBPNTR => {
            if count > VBPNTR_MAX_COUNT {
                return Err(ValidateError::MalformedPacket {
                    reason: "too many vertex arrays",
                });
            }
            let narrays = *pkt.get(1).ok_or(ValidateError::MalformedPacket {
                reason: "vertex array count word missing",
            })? & !0xc000;

            // Arrays come in pairs sharing one attribute descriptor word:
            // [attr, offset, offset] per pair, odd tail [attr, offset].
            let mut k: u32 = 0;
            let mut i: usize = 2;
            while k < narrays && i < consumed {
                i += 1;
                fix_word(dev, session, &mut pkt, i, "vertex array table truncated")?;
                k += 1;
                i += 1;
                if k == narrays {
                    break;
                }
                fix_word(dev, session, &mut pkt, i, "vertex array table truncated")?;
                k += 1;
                i += 1;
            }
            if k != narrays || i != consumed {
                return Err(ValidateError::MalformedPacket {
                    reason: "vertex array count disagrees with packet length",
                });
            }
        }

        P3_CNTL_HOSTDATA_BLT | P3_CNTL_PAINT_MULTI | P3_CNTL_BITBLT_MULTI => {
            let control = *pkt.get(1).ok_or(ValidateError::MalformedPacket {
                reason: "blit control word missing",
            })?;
            if control & (BLIT_SRC_PITCH_OFFSET | BLIT_DST_PITCH_OFFSET) != 0 {
                fix_blit_offset(dev, session, &mut pkt, 2)?;
            }
            if control & BLIT_SRC_PITCH_OFFSET != 0 && control & BLIT_DST_PITCH_OFFSET != 0 {
                fix_blit_offset(dev, session, &mut pkt, 3)?;
            }
        }

        _ => return Err(ValidateError::UnknownOpcode { opcode: header }),
    }

    Ok(ValidatedPacket3 { words: pkt })
}

/// Blit pitch/offset words pack a 1 KiB-granular address in the low bits
/// and pitch in the high bits. Validate the address at full resolution and
/// splice the fixed value back under the pitch.
fn fix_blit_offset(
    dev: &DeviceContext,
    session: &SessionContext,
    pkt: &mut [u32],
    index: usize,
) -> Result<(), ValidateError> {
    let word = pkt.get_mut(index).ok_or(ValidateError::MalformedPacket {
        reason: "blit pitch/offset word missing",
    })?;
    let offset = *word << 10;
    let fixed = dev.fix_offset(session, offset)?;
    *word = (*word & 0xffc0_0000) | (fixed >> 10);
    Ok(())
}
