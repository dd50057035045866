use std::ops::Range;

use crate::error::{Error, Result};
use crate::MEMORY_SIZE;

/// Flat 64 KiB address space of the 8080.
///
/// Every `u16` is a valid address, so reads and writes cannot fail. Only
/// [`Memory::load`] has a bounds policy: images never wrap around the top of
/// the address space.
#[derive(Clone)]
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            bytes: Box::new([0; MEMORY_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("len", &MEMORY_SIZE)
            .finish_non_exhaustive()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a memory from a full 64 KiB image.
    pub fn from_image(image: &[u8]) -> Result<Self> {
        if image.len() != MEMORY_SIZE {
            return Err(Error::ImageSize { len: image.len() });
        }
        let mut memory = Self::new();
        memory.bytes.copy_from_slice(image);
        Ok(memory)
    }

    /// Copy `data` into memory starting at `offset`.
    ///
    /// Fails without touching memory when the data would run past 0xFFFF.
    pub fn load(&mut self, data: &[u8], offset: usize) -> Result<()> {
        let end = offset
            .checked_add(data.len())
            .filter(|end| *end <= MEMORY_SIZE)
            .ok_or(Error::OutOfRange {
                offset,
                len: data.len(),
            })?;
        self.bytes[offset..end].copy_from_slice(data);
        log::debug!("loaded {} bytes at {:#06x}", data.len(), offset);
        Ok(())
    }

    #[inline]
    pub fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    #[inline]
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize] = value;
    }

    /// Little-endian word read; the high byte address wraps at 0xFFFF.
    #[inline]
    pub fn read_word(&self, addr: u16) -> u16 {
        let lo = self.read_byte(addr);
        let hi = self.read_byte(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    #[inline]
    pub fn write_word(&mut self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(addr, lo);
        self.write_byte(addr.wrapping_add(1), hi);
    }

    /// Zero the whole address space.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// Borrow a window of memory, e.g. a frame buffer region.
    ///
    /// Panics if the range is not inside the address space, like slice
    /// indexing does.
    pub fn slice(&self, range: Range<usize>) -> &[u8] {
        &self.bytes[range]
    }
}
