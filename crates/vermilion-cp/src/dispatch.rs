//! Sub-command decode and the dispatch loop.
//!
//! A submitted command buffer is a sequence of 4-byte little-endian
//! headers, each introducing one sub-command. The loop validates each
//! sub-command in full before emitting it; the first failure abandons the
//! rest of the buffer. Groups already committed to the ring stay there.

use tracing::{debug, trace};

use crate::context::{DeviceContext, SessionContext};
use crate::error::{DispatchError, RingFull, ValidateError};
use crate::packet3::check_and_fix_packet3;
use crate::packets::{check_and_fix_packet0, pkt_id, STATE_PACKETS};
use crate::regs::*;
use crate::ring::RingWriter;

/// Largest accepted command buffer submission.
pub const CMD_BUFFER_MAX_BYTES: usize = 64 * 1024;

// Sub-command tags, byte 0 of every header. ABI.
pub const CMD_PACKET: u8 = 0;
pub const CMD_SCALARS: u8 = 1;
pub const CMD_VECTORS: u8 = 2;
pub const CMD_DMA_DISCARD: u8 = 3;
pub const CMD_PACKET3: u8 = 4;
pub const CMD_PACKET3_CLIP: u8 = 5;
pub const CMD_SCALARS2: u8 = 6;
pub const CMD_WAIT: u8 = 7;
pub const CMD_VECLINEAR: u8 = 8;

/// Wait sub-command flag bits (header byte 1).
pub const WAIT_FLAG_2D: u8 = 1 << 0;
pub const WAIT_FLAG_3D: u8 = 1 << 1;

/// Scalar bank selected by `SCALARS2` starts at this index.
pub const SCALARS2_BANK_OFFSET: u32 = 0x100;

/// A clip rectangle, half-open in both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

/// One decoded sub-command header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubCommand {
    Packet { id: u8 },
    Scalars { offset: u8, stride: u8, count: u8 },
    Scalars2 { offset: u8, stride: u8, count: u8 },
    Vectors { offset: u8, stride: u8, count: u8 },
    VecLinear { addr_lo: u8, addr_hi: u8, count: u8 },
    DmaDiscard { index: u8 },
    Packet3,
    Packet3Clip,
    Wait { flags: u8 },
}

impl SubCommand {
    pub fn decode(header: u32) -> Result<Self, ValidateError> {
        let [tag, b1, b2, b3] = header.to_le_bytes();
        Ok(match tag {
            CMD_PACKET => SubCommand::Packet { id: b1 },
            CMD_SCALARS => SubCommand::Scalars {
                offset: b1,
                stride: b2,
                count: b3,
            },
            CMD_VECTORS => SubCommand::Vectors {
                offset: b1,
                stride: b2,
                count: b3,
            },
            CMD_DMA_DISCARD => SubCommand::DmaDiscard { index: b1 },
            CMD_PACKET3 => SubCommand::Packet3,
            CMD_PACKET3_CLIP => SubCommand::Packet3Clip,
            CMD_SCALARS2 => SubCommand::Scalars2 {
                offset: b1,
                stride: b2,
                count: b3,
            },
            CMD_WAIT => SubCommand::Wait { flags: b1 },
            CMD_VECLINEAR => SubCommand::VecLinear {
                addr_lo: b1,
                addr_hi: b2,
                count: b3,
            },
            _ => {
                return Err(ValidateError::UnknownOpcode {
                    opcode: u32::from(tag),
                })
            }
        })
    }
}

fn take<'a>(
    words: &'a [u32],
    cursor: &mut usize,
    n: usize,
) -> Result<&'a [u32], ValidateError> {
    let end = cursor
        .checked_add(n)
        .filter(|&end| end <= words.len())
        .ok_or(ValidateError::MalformedPacket {
            reason: "sub-command payload overruns the buffer",
        })?;
    let slice = &words[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn emit_wait(ring: &mut impl RingWriter, bits: u32) -> Result<(), RingFull> {
    ring.reserve(2)?;
    ring.write(cp_packet0(REG_WAIT_UNTIL, 0));
    ring.write(bits);
    ring.commit();
    Ok(())
}

fn emit_clip_rect(ring: &mut impl RingWriter, rect: &ClipRect) -> Result<(), RingFull> {
    // The second register takes the inclusive bottom-right coordinate.
    let br_x = u32::from(rect.x2).saturating_sub(1);
    let br_y = u32::from(rect.y2).saturating_sub(1);
    ring.reserve(4)?;
    ring.write(cp_packet0(REG_CLIP_TOP_LEFT, 0));
    ring.write((u32::from(rect.y1) << 16) | u32::from(rect.x1));
    ring.write(cp_packet0(REG_CLIP_BOTTOM_RIGHT, 0));
    ring.write((br_y << 16) | br_x);
    ring.commit();
    Ok(())
}

/// Upload `data` to the scalar file starting at `start`. Contents are
/// opaque to the hardware; only buffer-length consistency is validated.
fn emit_scalars(
    ring: &mut impl RingWriter,
    start: u32,
    stride: u32,
    data: &[u32],
) -> Result<(), RingFull> {
    if data.is_empty() {
        return Ok(());
    }
    ring.reserve(data.len() as u32 + 3)?;
    ring.write(cp_packet0(REG_GE_SCALAR_INDX, 0));
    ring.write(start | (stride << SCALAR_STRIDE_SHIFT));
    ring.write(cp_packet0_one_reg(REG_GE_SCALAR_DATA, data.len() as u32 - 1));
    for &w in data {
        ring.write(w);
    }
    ring.commit();
    Ok(())
}

/// Upload `data` to the vector file. The index write must be preceded by a
/// transform-engine state flush or the hardware can latch stale state.
fn emit_vectors(
    ring: &mut impl RingWriter,
    start: u32,
    stride: u32,
    data: &[u32],
) -> Result<(), RingFull> {
    if data.is_empty() {
        return Ok(());
    }
    ring.reserve(data.len() as u32 + 5)?;
    ring.write(cp_packet0(REG_GE_STATE_FLUSH, 0));
    ring.write(0);
    ring.write(cp_packet0(REG_GE_VECTOR_INDX, 0));
    ring.write(start | (stride << VECTOR_STRIDE_SHIFT));
    ring.write(cp_packet0_one_reg(REG_GE_VECTOR_DATA, data.len() as u32 - 1));
    for &w in data {
        ring.write(w);
    }
    ring.commit();
    Ok(())
}

/// Validate and dispatch one command buffer. Sub-commands are emitted in
/// order; the first failure aborts the remainder of the buffer without
/// unwinding groups that already committed.
pub fn dispatch_cmdbuf(
    dev: &mut DeviceContext,
    session: &mut SessionContext,
    ring: &mut impl RingWriter,
    bytes: &[u8],
    clip_rects: &[ClipRect],
) -> Result<(), DispatchError> {
    if bytes.len() > CMD_BUFFER_MAX_BYTES {
        return Err(DispatchError::BufferTooLarge { size: bytes.len() });
    }

    // Sub-commands are all whole words; stray trailing bytes are ignored.
    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let mut cursor = 0usize;
    while cursor < words.len() {
        let header = words[cursor];
        cursor += 1;
        let cmd = SubCommand::decode(header)?;
        trace!(?cmd, cursor, "sub-command");

        match cmd {
            SubCommand::Packet { id } => {
                let desc = STATE_PACKETS
                    .get(usize::from(id))
                    .ok_or(ValidateError::UnknownOpcode {
                        opcode: u32::from(id),
                    })?;
                let sz = usize::from(desc.len);
                let mut payload = take(&words, &mut cursor, sz)?.to_vec();
                check_and_fix_packet0(dev, session, id, &mut payload)?;

                // The vertex path control register only latches cleanly
                // after a transform-engine state flush.
                let flush = id == pkt_id::V2_VP_CTL;
                ring.reserve(sz as u32 + 1 + if flush { 2 } else { 0 })?;
                if flush {
                    ring.write(cp_packet0(REG_GE_STATE_FLUSH, 0));
                    ring.write(0);
                }
                ring.write(cp_packet0(desc.reg, sz as u32 - 1));
                for &w in &payload {
                    ring.write(w);
                }
                ring.commit();
            }

            SubCommand::Scalars {
                offset,
                stride,
                count,
            } => {
                let data = take(&words, &mut cursor, usize::from(count))?;
                emit_scalars(ring, u32::from(offset), u32::from(stride), data)?;
            }

            SubCommand::Scalars2 {
                offset,
                stride,
                count,
            } => {
                let data = take(&words, &mut cursor, usize::from(count))?;
                emit_scalars(
                    ring,
                    u32::from(offset) + SCALARS2_BANK_OFFSET,
                    u32::from(stride),
                    data,
                )?;
            }

            SubCommand::Vectors {
                offset,
                stride,
                count,
            } => {
                let data = take(&words, &mut cursor, usize::from(count))?;
                emit_vectors(ring, u32::from(offset), u32::from(stride), data)?;
            }

            SubCommand::VecLinear {
                addr_lo,
                addr_hi,
                count,
            } => {
                // `count` is in 4-dword vectors; zero uploads nothing.
                let sz = usize::from(count) * 4;
                let data = take(&words, &mut cursor, sz)?;
                let start = u32::from(addr_lo) | (u32::from(addr_hi) << 8);
                emit_vectors(ring, start, 1, data)?;
            }

            SubCommand::DmaDiscard { index } => {
                let age = dev.dma.discard(usize::from(index), session.client)?;
                debug!(index, age, "dma buffer discarded");
                ring.reserve(2)?;
                ring.write(cp_packet0(REG_SCRATCH_DISPATCH_AGE, 0));
                ring.write(age);
                ring.commit();
            }

            SubCommand::Packet3 => {
                let pkt = check_and_fix_packet3(dev, session, &words[cursor..])?;
                cursor += pkt.consumed();
                ring.reserve(pkt.words.len() as u32)?;
                for &w in &pkt.words {
                    ring.write(w);
                }
                ring.commit();
            }

            SubCommand::Packet3Clip => {
                let pkt = check_and_fix_packet3(dev, session, &words[cursor..])?;
                cursor += pkt.consumed();
                // No clip rectangles: the packet is consumed but nothing
                // reaches the hardware.
                for (i, rect) in clip_rects.iter().enumerate() {
                    if i > 0 {
                        emit_wait(ring, WAIT_3D_IDLE_CLEAN)?;
                    }
                    emit_clip_rect(ring, rect)?;
                    ring.reserve(pkt.words.len() as u32)?;
                    for &w in &pkt.words {
                        ring.write(w);
                    }
                    ring.commit();
                }
            }

            SubCommand::Wait { flags } => {
                const BOTH: u8 = WAIT_FLAG_2D | WAIT_FLAG_3D;
                let bits = match flags {
                    WAIT_FLAG_2D => WAIT_2D_IDLE_CLEAN,
                    WAIT_FLAG_3D => WAIT_3D_IDLE_CLEAN,
                    BOTH => WAIT_2D_IDLE_CLEAN | WAIT_3D_IDLE_CLEAN,
                    _ => {
                        return Err(DispatchError::Validate(ValidateError::MalformedPacket {
                            reason: "unrecognized wait flags",
                        }))
                    }
                };
                emit_wait(ring, bits)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aperture::ApertureMap;
    use crate::context::{ClientId, Microcode};
    use crate::ring::VecRing;
    use crate::writer::CmdStreamWriter;

    fn fixtures(microcode: Microcode) -> (DeviceContext, SessionContext) {
        let mut dev = DeviceContext::new(
            ApertureMap {
                fb_base: 0x1000_0000,
                fb_size: 0x0100_0000,
                gart_base: 0x2000_0000,
                gart_size: 0x0100_0000,
            },
            microcode,
            4,
        );
        let mut session = SessionContext::new(ClientId(9));
        session.fb_delta = 0x1000_0000;
        dev.dma.claim(0, session.client).unwrap();
        (dev, session)
    }

    #[test]
    fn oversized_buffer_rejected_before_parsing() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let bytes = vec![0u8; CMD_BUFFER_MAX_BYTES + 4];
        assert!(matches!(
            dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &bytes, &[]),
            Err(DispatchError::BufferTooLarge { .. })
        ));
        assert!(ring.words.is_empty());
    }

    #[test]
    fn scalars_emit_index_then_data() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.scalars(0x20, 1, &[7, 8, 9]);

        dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]).unwrap();

        assert_eq!(ring.words.len(), 6);
        assert_eq!(ring.words[0], cp_packet0(REG_GE_SCALAR_INDX, 0));
        assert_eq!(ring.words[1], 0x20 | (1 << SCALAR_STRIDE_SHIFT));
        assert_eq!(ring.words[2], cp_packet0_one_reg(REG_GE_SCALAR_DATA, 2));
        assert_eq!(&ring.words[3..], &[7, 8, 9]);
    }

    #[test]
    fn scalars2_target_the_upper_bank() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.scalars2(0x20, 1, &[1]);

        dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]).unwrap();
        assert_eq!(ring.words[1], 0x120 | (1 << SCALAR_STRIDE_SHIFT));
    }

    #[test]
    fn vectors_are_preceded_by_state_flush() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.vectors(4, 2, &[1, 2, 3, 4]);

        dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]).unwrap();

        assert_eq!(ring.words[0], cp_packet0(REG_GE_STATE_FLUSH, 0));
        assert_eq!(ring.words[2], cp_packet0(REG_GE_VECTOR_INDX, 0));
        assert_eq!(ring.words[3], 4 | (2 << VECTOR_STRIDE_SHIFT));
        assert_eq!(ring.words[4], cp_packet0_one_reg(REG_GE_VECTOR_DATA, 3));
    }

    #[test]
    fn veclinear_empty_upload_is_a_noop() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.veclinear(0x234, &[]);
        w.wait(WAIT_FLAG_2D);

        dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]).unwrap();
        // Only the wait made it to the ring.
        assert_eq!(ring.words.len(), 2);
        assert_eq!(ring.words[0], cp_packet0(REG_WAIT_UNTIL, 0));
        assert_eq!(ring.words[1], WAIT_2D_IDLE_CLEAN);
    }

    #[test]
    fn veclinear_packs_the_address() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.veclinear(0x234, &[0; 4]);

        dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]).unwrap();
        assert_eq!(ring.words[3], 0x234 | (1 << VECTOR_STRIDE_SHIFT));
    }

    #[test]
    fn wait_flags_validated() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        for flags in [WAIT_FLAG_2D, WAIT_FLAG_3D, WAIT_FLAG_2D | WAIT_FLAG_3D] {
            let mut ring = VecRing::new();
            let mut w = CmdStreamWriter::new();
            w.wait(flags);
            dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]).unwrap();
            assert_eq!(ring.words.len(), 2);
        }

        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.wait(4);
        assert!(matches!(
            dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]),
            Err(DispatchError::Validate(ValidateError::MalformedPacket { .. }))
        ));
    }

    #[test]
    fn dma_discard_stamps_the_age_register() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.dma_discard(0);

        dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]).unwrap();
        assert_eq!(ring.words[0], cp_packet0(REG_SCRATCH_DISPATCH_AGE, 0));
        assert_eq!(ring.words[1], 1);
        assert!(dev.dma.get(0).unwrap().pending);
    }

    #[test]
    fn unknown_tag_rejected() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        w.raw(&[9, 0, 0, 0]);
        assert!(matches!(
            dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]),
            Err(DispatchError::Validate(ValidateError::UnknownOpcode { opcode: 9 }))
        ));
    }

    #[test]
    fn truncated_payload_rejected() {
        let (mut dev, mut session) = fixtures(Microcode::V1);
        let mut ring = VecRing::new();
        let mut w = CmdStreamWriter::new();
        // Scalars header claiming 4 payload words, with only one present.
        w.raw(&[CMD_SCALARS, 0, 0, 4]);
        w.raw(&1u32.to_le_bytes());
        assert!(matches!(
            dispatch_cmdbuf(&mut dev, &mut session, &mut ring, &w.finish(), &[]),
            Err(DispatchError::Validate(ValidateError::MalformedPacket { .. }))
        ));
        assert!(ring.words.is_empty());
    }
}
