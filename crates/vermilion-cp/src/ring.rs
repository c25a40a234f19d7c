//! Command ring abstraction.
//!
//! Emitters write in groups: `reserve` the group size, `write` exactly that
//! many words, then `commit` to publish. A failed `reserve` leaves the ring
//! untouched, so a dispatch loop can abort mid-buffer without tearing a
//! group in half.

use crate::error::RingFull;

pub trait RingWriter {
    /// Reserve room for a group of `words` ring words. Must succeed before
    /// any `write` of that group.
    fn reserve(&mut self, words: u32) -> Result<(), RingFull>;

    /// Append one word to the current group. Callers never write more words
    /// than they reserved.
    fn write(&mut self, word: u32);

    /// Publish everything written since the last commit.
    fn commit(&mut self);
}

/// Fixed-capacity circular ring, the shape the hardware consumes. `retire`
/// models the GPU read pointer advancing.
#[derive(Debug)]
pub struct FixedRing {
    buf: Vec<u32>,
    /// Next slot the CPU writes.
    tail: usize,
    /// Words written to the hardware but not yet retired.
    used: usize,
    /// Words reserved for the group currently being written.
    reserved: u32,
}

impl FixedRing {
    pub fn new(capacity_words: usize) -> Self {
        Self {
            buf: vec![0; capacity_words],
            tail: 0,
            used: 0,
            reserved: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn free_words(&self) -> u32 {
        (self.buf.len() - self.used) as u32
    }

    /// The GPU consumed `words` ring words.
    pub fn retire(&mut self, words: usize) {
        debug_assert!(words <= self.used);
        self.used -= words.min(self.used);
    }
}

impl RingWriter for FixedRing {
    fn reserve(&mut self, words: u32) -> Result<(), RingFull> {
        let free = self.free_words();
        if words > free {
            return Err(RingFull {
                needed: words,
                free,
            });
        }
        self.reserved = words;
        Ok(())
    }

    fn write(&mut self, word: u32) {
        debug_assert!(self.reserved > 0, "write outside a reserved group");
        self.buf[self.tail] = word;
        self.tail = (self.tail + 1) % self.buf.len();
        self.used += 1;
        self.reserved -= 1;
    }

    fn commit(&mut self) {
        debug_assert_eq!(self.reserved, 0, "committing a short group");
        // Hardware doorbell write happens here in the real device glue.
        self.reserved = 0;
    }
}

/// Unbounded recording ring for tests: captures every word and remembers
/// how many of them were committed.
#[derive(Debug, Default)]
pub struct VecRing {
    pub words: Vec<u32>,
    pub committed: usize,
    reserved: u32,
}

impl VecRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Words published by `commit`, excluding any torn tail.
    pub fn committed_words(&self) -> &[u32] {
        &self.words[..self.committed]
    }
}

impl RingWriter for VecRing {
    fn reserve(&mut self, words: u32) -> Result<(), RingFull> {
        self.reserved = words;
        Ok(())
    }

    fn write(&mut self, word: u32) {
        debug_assert!(self.reserved > 0, "write outside a reserved group");
        self.words.push(word);
        self.reserved -= 1;
    }

    fn commit(&mut self) {
        debug_assert_eq!(self.reserved, 0, "committing a short group");
        self.committed = self.words.len();
    }
}
