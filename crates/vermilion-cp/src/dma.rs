//! DMA buffer retirement bookkeeping.
//!
//! The dispatcher never touches DMA buffer contents; it only retires
//! buffers a client is done with. Retirement stamps the buffer with a
//! monotonically increasing age which the dispatcher mirrors into a scratch
//! register, so the driver can tell when the GPU has moved past it.

use crate::context::ClientId;
use crate::error::DmaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaBuffer {
    pub owner: Option<ClientId>,
    pub pending: bool,
    pub age: u32,
}

#[derive(Debug)]
pub struct DmaBufferTable {
    bufs: Vec<DmaBuffer>,
    next_age: u32,
}

impl DmaBufferTable {
    pub fn new(count: usize) -> Self {
        Self {
            bufs: vec![
                DmaBuffer {
                    owner: None,
                    pending: false,
                    age: 0,
                };
                count
            ],
            next_age: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.bufs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bufs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DmaBuffer> {
        self.bufs.get(index)
    }

    /// Hand buffer `index` to `client`. Driver-side allocation path.
    pub fn claim(&mut self, index: usize, client: ClientId) -> Result<(), DmaError> {
        let count = self.bufs.len();
        let buf = self
            .bufs
            .get_mut(index)
            .ok_or(DmaError::IndexOutOfRange { index, count })?;
        buf.owner = Some(client);
        buf.pending = false;
        Ok(())
    }

    /// Retire buffer `index` on behalf of `client`. Returns the age stamp
    /// the dispatcher must write to the scratch register.
    pub fn discard(&mut self, index: usize, client: ClientId) -> Result<u32, DmaError> {
        let count = self.bufs.len();
        let buf = self
            .bufs
            .get_mut(index)
            .ok_or(DmaError::IndexOutOfRange { index, count })?;
        if buf.owner != Some(client) {
            return Err(DmaError::NotOwner { index });
        }
        if buf.pending {
            return Err(DmaError::AlreadyPending { index });
        }
        self.next_age = self.next_age.wrapping_add(1);
        buf.pending = true;
        buf.age = self.next_age;
        Ok(buf.age)
    }

    /// The GPU reported progress through `age`; release every pending
    /// buffer stamped at or before it.
    pub fn reclaim_through(&mut self, age: u32) {
        for buf in &mut self.bufs {
            if buf.pending && buf.age <= age {
                buf.pending = false;
                buf.owner = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_requires_ownership() {
        let mut table = DmaBufferTable::new(2);
        table.claim(0, ClientId(1)).unwrap();

        assert!(matches!(
            table.discard(0, ClientId(2)),
            Err(DmaError::NotOwner { index: 0 })
        ));
        assert!(matches!(
            table.discard(1, ClientId(1)),
            Err(DmaError::NotOwner { index: 1 })
        ));
        assert!(matches!(
            table.discard(5, ClientId(1)),
            Err(DmaError::IndexOutOfRange { index: 5, count: 2 })
        ));

        let age = table.discard(0, ClientId(1)).unwrap();
        assert_eq!(age, 1);
        assert!(matches!(
            table.discard(0, ClientId(1)),
            Err(DmaError::AlreadyPending { index: 0 })
        ));
    }

    #[test]
    fn reclaim_releases_aged_buffers() {
        let mut table = DmaBufferTable::new(2);
        table.claim(0, ClientId(1)).unwrap();
        table.claim(1, ClientId(1)).unwrap();
        let a0 = table.discard(0, ClientId(1)).unwrap();
        let a1 = table.discard(1, ClientId(1)).unwrap();
        assert!(a1 > a0);

        table.reclaim_through(a0);
        assert_eq!(table.get(0).unwrap().owner, None);
        assert!(table.get(1).unwrap().pending);

        table.reclaim_through(a1);
        assert!(!table.get(1).unwrap().pending);
    }
}
