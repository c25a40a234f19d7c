//! Command buffer encoder.
//!
//! Builds the byte stream [`crate::dispatch::dispatch_cmdbuf`] consumes:
//! a sequence of 4-byte little-endian sub-command headers, each followed
//! by its payload words. Tests and benchmarks use this instead of
//! hand-packing words.

use crate::dispatch::{
    CMD_DMA_DISCARD, CMD_PACKET, CMD_PACKET3, CMD_PACKET3_CLIP, CMD_SCALARS, CMD_SCALARS2,
    CMD_VECLINEAR, CMD_VECTORS, CMD_WAIT,
};

#[derive(Debug, Default)]
pub struct CmdStreamWriter {
    bytes: Vec<u8>,
}

impl CmdStreamWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    fn header(&mut self, tag: u8, b1: u8, b2: u8, b3: u8) -> &mut Self {
        self.bytes.extend_from_slice(&[tag, b1, b2, b3]);
        self
    }

    fn words(&mut self, words: &[u32]) -> &mut Self {
        for w in words {
            self.bytes.extend_from_slice(&w.to_le_bytes());
        }
        self
    }

    /// Type-0 state packet. `payload` must match the table length for `id`.
    pub fn packet(&mut self, id: u8, payload: &[u32]) -> &mut Self {
        self.header(CMD_PACKET, id, 0, 0).words(payload)
    }

    pub fn scalars(&mut self, offset: u8, stride: u8, data: &[u32]) -> &mut Self {
        self.header(CMD_SCALARS, offset, stride, data.len() as u8)
            .words(data)
    }

    /// Like [`Self::scalars`] but targeting the upper scalar bank.
    pub fn scalars2(&mut self, offset: u8, stride: u8, data: &[u32]) -> &mut Self {
        self.header(CMD_SCALARS2, offset, stride, data.len() as u8)
            .words(data)
    }

    pub fn vectors(&mut self, offset: u8, stride: u8, data: &[u32]) -> &mut Self {
        self.header(CMD_VECTORS, offset, stride, data.len() as u8)
            .words(data)
    }

    /// `data.len()` must be a multiple of 4 (vectors of 4 dwords).
    pub fn veclinear(&mut self, addr: u16, data: &[u32]) -> &mut Self {
        debug_assert_eq!(data.len() % 4, 0);
        let [lo, hi] = addr.to_le_bytes();
        self.header(CMD_VECLINEAR, lo, hi, (data.len() / 4) as u8)
            .words(data)
    }

    pub fn dma_discard(&mut self, index: u8) -> &mut Self {
        self.header(CMD_DMA_DISCARD, index, 0, 0)
    }

    /// Raw type-3 packet, header word included (see [`crate::regs::cp_packet3`]).
    pub fn packet3(&mut self, words: &[u32]) -> &mut Self {
        self.header(CMD_PACKET3, 0, 0, 0).words(words)
    }

    /// Type-3 packet replayed once per clip rectangle.
    pub fn packet3_clip(&mut self, words: &[u32]) -> &mut Self {
        self.header(CMD_PACKET3_CLIP, 0, 0, 0).words(words)
    }

    pub fn wait(&mut self, flags: u8) -> &mut Self {
        self.header(CMD_WAIT, flags, 0, 0)
    }

    /// Append raw bytes, for malformed-input tests.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }
}
