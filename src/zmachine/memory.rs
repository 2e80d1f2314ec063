//! ZMachine [memory map](https://inform-fiction.org/zmachine/standards/z1point1/sect01.html)
use std::fmt;

use crate::{error::*, fatal_error};

use super::header::Header;

/// Memory map
pub struct Memory {
    /// Memory map bytes
    map: Vec<u8>,
    /// Byte address of the start of static memory
    static_mark: usize,
    /// Byte address of the start of high memory
    high_mark: usize,
    /// Pristine copy of the dynamic memory region
    dynamic: Vec<u8>,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Memory: {} bytes, static ${:05x}, high ${:05x}",
            self.map.len(),
            self.static_mark,
            self.high_mark
        )
    }
}

/// Assemble a word from high- and low-byte values
///
/// # Arguments
/// * `hb` - high byte value
/// * `lb` - low byte value
///
/// # Returns
/// Word value
pub fn word_value(hb: u8, lb: u8) -> u16 {
    ((hb as u16) << 8) | lb as u16
}

/// Break a word value down into high- and low-byte values
///
/// # Arguments
/// * `w` - Word value
///
/// # Returns
/// Tuple containing (high-byte, low-byte)
pub fn byte_values(w: u16) -> (u8, u8) {
    ((w >> 8) as u8, w as u8)
}

impl Memory {
    /// Constructor
    ///
    /// # Arguments
    /// * `map` - Vector of memory bytes
    /// * `header` - Header previously validated against `map`
    pub fn new(map: Vec<u8>, header: &Header) -> Memory {
        let static_mark = header.static_mark();
        let dynamic = map[..static_mark].to_vec();
        Memory {
            map,
            static_mark,
            high_mark: header.high_mark(),
            dynamic,
        }
    }

    /// Size of the memory map in bytes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Get the start of the [static](https://inform-fiction.org/zmachine/standards/z1point1/sect01.html#one) memory region
    ///
    /// # Returns
    /// Byte address of the start of the static memory region
    pub fn static_mark(&self) -> usize {
        self.static_mark
    }

    /// Get the start of the high memory region
    ///
    /// # Returns
    /// Byte address of the start of the high memory region
    pub fn high_mark(&self) -> usize {
        self.high_mark
    }

    /// Current contents of dynamic memory
    pub fn dynamic(&self) -> &[u8] {
        &self.map[..self.static_mark]
    }

    /// Copy a slice of the memory map, clipped to the end of memory
    ///
    /// # Arguments
    /// * `start` - address of the start of the slice
    /// * `length` - length of the slice
    ///
    /// # Returns
    /// Vector containing a copy of the requested slice of memory
    pub fn slice(&self, start: usize, length: usize) -> Vec<u8> {
        let start = usize::min(start, self.map.len());
        let end = usize::min(start.saturating_add(length), self.map.len());
        self.map[start..end].to_vec()
    }

    /// Calculate the checksum of the memory map.
    ///
    /// The pristine copy of dynamic memory is used for this calculation.
    ///
    /// # Arguments
    /// * `file_length` - File length declared by the header
    ///
    /// # Returns
    /// Checksum value
    pub fn checksum(&self, file_length: usize) -> u16 {
        let end = usize::min(file_length, self.map.len());
        let mut checksum: u16 = 0;
        for i in 0x40..end {
            let b = if i < self.dynamic.len() {
                self.dynamic[i]
            } else {
                self.map[i]
            };
            checksum = checksum.wrapping_add(b as u16);
        }
        checksum
    }

    /// Read a byte from dynamic or static memory.
    ///
    /// # Arguments
    /// * `address` - Address to read from
    ///
    /// # Returns
    /// [Result] with the byte value at the requested `address` or a [RuntimeError]
    pub fn read_byte(&self, address: usize) -> Result<u8, RuntimeError> {
        if address < self.high_mark && address < self.map.len() {
            Ok(self.map[address])
        } else {
            fatal_error!(
                ErrorCode::AccessViolation,
                "Byte read from ${:05x} outside of readable memory (${:05x})",
                address,
                self.high_mark
            )
        }
    }

    /// Read a word from dynamic or static memory.
    ///
    /// # Arguments
    /// * `address` - Address to read from
    ///
    /// # Returns
    /// [Result] with the word value at the requested `address` or a [RuntimeError]
    pub fn read_word(&self, address: usize) -> Result<u16, RuntimeError> {
        if address
            .checked_add(1)
            .is_some_and(|last| last < self.high_mark && last < self.map.len())
        {
            Ok(word_value(self.map[address], self.map[address + 1]))
        } else {
            fatal_error!(
                ErrorCode::AccessViolation,
                "Word read from ${:05x} outside of readable memory (${:05x})",
                address,
                self.high_mark
            )
        }
    }

    /// Write a byte to dynamic memory.
    ///
    /// # Arguments
    /// * `address` - Address to write to
    /// * `value` - Byte value to write
    ///
    /// # Returns
    /// Empty [Result] or a [RuntimeError]
    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<(), RuntimeError> {
        if address < self.static_mark {
            debug!(target: "app::state", "Write {:#02x} to ${:04x}", value, address);
            self.map[address] = value;
            Ok(())
        } else {
            fatal_error!(
                ErrorCode::AccessViolation,
                "Byte write to ${:05x} outside of dynamic memory (${:05x})",
                address,
                self.static_mark
            )
        }
    }

    /// Write a word to dynamic memory.
    ///
    /// # Arguments
    /// * `address` - Address to write to
    /// * `value` - Word value to write
    ///
    /// # Returns
    /// Empty [Result] or a [RuntimeError]
    pub fn write_word(&mut self, address: usize, value: u16) -> Result<(), RuntimeError> {
        if address.checked_add(1).is_some_and(|last| last < self.static_mark) {
            debug!(target: "app::state", "Write {:#04x} to ${:04x}", value, address);
            let (hb, lb) = byte_values(value);
            self.map[address] = hb;
            self.map[address + 1] = lb;
            Ok(())
        } else {
            fatal_error!(
                ErrorCode::AccessViolation,
                "Word write to ${:05x} outside of dynamic memory (${:05x})",
                address,
                self.static_mark
            )
        }
    }

    /// Read a byte from anywhere in memory, including high memory.
    ///
    /// # Arguments
    /// * `address` - Address to read from
    ///
    /// # Returns
    /// [Result] with the byte value at the requested `address` or a [RuntimeError]
    pub fn force_read_byte(&self, address: usize) -> Result<u8, RuntimeError> {
        match self.map.get(address) {
            Some(b) => Ok(*b),
            None => fatal_error!(
                ErrorCode::AccessViolation,
                "Byte address ${:05x} beyond end of memory (${:05x})",
                address,
                self.map.len()
            ),
        }
    }

    /// Read a word from anywhere in memory, including high memory.
    ///
    /// # Arguments
    /// * `address` - Address to read from
    ///
    /// # Returns
    /// [Result] with the word value at the requested `address` or a [RuntimeError]
    pub fn force_read_word(&self, address: usize) -> Result<u16, RuntimeError> {
        if address.checked_add(1).is_some_and(|last| last < self.map.len()) {
            Ok(word_value(self.map[address], self.map[address + 1]))
        } else {
            fatal_error!(
                ErrorCode::AccessViolation,
                "Word address ${:05x} beyond end of memory (${:05x})",
                address,
                self.map.len()
            )
        }
    }

    /// Write a byte anywhere in memory.
    ///
    /// # Arguments
    /// * `address` - Address to write to
    /// * `value` - Byte value to write
    ///
    /// # Returns
    /// Empty [Result] or a [RuntimeError]
    pub fn force_write_byte(&mut self, address: usize, value: u8) -> Result<(), RuntimeError> {
        match self.map.get_mut(address) {
            Some(b) => {
                *b = value;
                Ok(())
            }
            None => fatal_error!(
                ErrorCode::AccessViolation,
                "Byte address ${:05x} beyond end of memory (${:05x})",
                address,
                self.map.len()
            ),
        }
    }

    /// Write a word anywhere in memory.
    ///
    /// # Arguments
    /// * `address` - Address to write to
    /// * `value` - Word value to write
    ///
    /// # Returns
    /// Empty [Result] or a [RuntimeError]
    pub fn force_write_word(&mut self, address: usize, value: u16) -> Result<(), RuntimeError> {
        if address.checked_add(1).is_some_and(|last| last < self.map.len()) {
            let (hb, lb) = byte_values(value);
            self.map[address] = hb;
            self.map[address + 1] = lb;
            Ok(())
        } else {
            fatal_error!(
                ErrorCode::AccessViolation,
                "Word address ${:05x} beyond end of memory (${:05x})",
                address,
                self.map.len()
            )
        }
    }

    /// Reset dynamic memory back to the initial state
    pub fn reset(&mut self) {
        self.map[..self.dynamic.len()].copy_from_slice(&self.dynamic)
    }

    /// Replace dynamic memory, presumably from a saved game state
    ///
    /// # Arguments
    /// * `data` - Dynamic memory region to restore
    ///
    /// # Returns
    /// Empty [Result] or a [RuntimeError]
    pub fn restore(&mut self, data: &[u8]) -> Result<(), RuntimeError> {
        if data.len() != self.dynamic.len() {
            fatal_error!(
                ErrorCode::MalformedSaveState,
                "Restore dynamic memory size doesn't match: {:04x} != {:04x}",
                self.dynamic.len(),
                data.len()
            )
        } else {
            self.map[..data.len()].copy_from_slice(data);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{assert_ok, assert_ok_eq, test_util::test_map};

    use super::*;

    fn memory(version: u8) -> Memory {
        let mut map = test_map(version);
        for (i, b) in map.iter_mut().enumerate().skip(0x40) {
            *b = i as u8;
        }
        let header = assert_ok!(Header::try_from(&test_map(version)[..]));
        Memory::new(map, &header)
    }

    #[test]
    fn test_word_value() {
        for i in 0..=0xFFFF {
            let bytes = (i as u32).to_be_bytes();
            assert_eq!(word_value(bytes[2], bytes[3]), i as u16);
        }
    }

    #[test]
    fn test_byte_values() {
        for i in 0..=0xFFFF {
            let bytes = (i as u32).to_be_bytes();
            assert_eq!(byte_values(i), (bytes[2], bytes[3]));
        }
    }

    #[test]
    fn test_new() {
        let m = memory(5);
        assert_eq!(m.len(), 0x800);
        assert_eq!(m.static_mark(), 0x400);
        assert_eq!(m.high_mark(), 0x600);
        assert_eq!(m.dynamic.len(), 0x400);
        for i in 0x40..0x400 {
            assert_ok_eq!(m.read_byte(i), i as u8);
        }
    }

    #[test]
    fn test_read_byte_high_memory() {
        let m = memory(3);
        assert_ok_eq!(m.read_byte(0x5FF), 0xFF);
        let e = m.read_byte(0x600).unwrap_err();
        assert_eq!(e.code(), ErrorCode::AccessViolation);
        assert!(m.read_byte(0x800).is_err());
        assert_ok_eq!(m.force_read_byte(0x600), 0x00);
        assert!(m.force_read_byte(0x800).is_err());
    }

    #[test]
    fn test_read_word() {
        let m = memory(3);
        assert_ok_eq!(m.read_word(0x40), 0x4041);
        assert_ok_eq!(m.read_word(0x5FE), 0xFEFF);
        assert!(m.read_word(0x5FF).is_err());
        assert_ok_eq!(m.force_read_word(0x5FF), 0xFF00);
        assert_ok_eq!(m.force_read_word(0x7FE), 0xFEFF);
        assert!(m.force_read_word(0x7FF).is_err());
    }

    #[test]
    fn test_write_byte() {
        let mut m = memory(3);
        for i in 0..0x400 {
            assert_ok!(m.write_byte(i, 0xFF));
            assert_ok_eq!(m.read_byte(i), 0xFF);
        }
        for i in 0x400..0x800 {
            let e = m.write_byte(i, 0).unwrap_err();
            assert_eq!(e.code(), ErrorCode::AccessViolation);
        }
    }

    #[test]
    fn test_write_word() {
        let mut m = memory(3);
        assert_ok!(m.write_word(0x3FE, 0x1234));
        assert_ok_eq!(m.read_word(0x3FE), 0x1234);
        assert!(m.write_word(0x3FF, 0x1234).is_err());
        assert!(m.write_word(0x400, 0x1234).is_err());
        assert_ok!(m.force_write_word(0x6FE, 0x5678));
        assert_ok_eq!(m.force_read_word(0x6FE), 0x5678);
        assert_ok!(m.force_write_byte(0x7FF, 0x9A));
        assert!(m.force_write_byte(0x800, 0x9A).is_err());
    }

    #[test]
    fn test_word_at_end_of_address_space() {
        let mut m = memory(3);
        for a in [usize::MAX, usize::MAX - 1] {
            assert_eq!(m.read_word(a).unwrap_err().code(), ErrorCode::AccessViolation);
            assert_eq!(m.write_word(a, 1).unwrap_err().code(), ErrorCode::AccessViolation);
            assert_eq!(m.force_read_word(a).unwrap_err().code(), ErrorCode::AccessViolation);
            assert_eq!(m.force_write_word(a, 1).unwrap_err().code(), ErrorCode::AccessViolation);
            assert!(m.read_byte(a).is_err());
            assert!(m.write_byte(a, 1).is_err());
        }
        assert_eq!(m.slice(0x10, usize::MAX).len(), m.len() - 0x10);
    }

    #[test]
    fn test_slice() {
        let m = memory(3);
        assert_eq!(m.slice(0x40, 4), vec![0x40, 0x41, 0x42, 0x43]);
        assert_eq!(m.slice(0x7FE, 4), vec![0xFE, 0xFF]);
        assert!(m.slice(0x900, 4).is_empty());
    }

    #[test]
    fn test_checksum() {
        let mut m = memory(3);
        let expected = (0x40..0x800_usize).fold(0_u16, |a, i| a.wrapping_add((i as u8) as u16));
        assert_eq!(m.checksum(0x800), expected);
        assert_ok!(m.write_byte(0x201, 0xFF));
        assert_eq!(m.checksum(0x800), expected);
        assert_eq!(m.checksum(0x40), 0);
    }

    #[test]
    fn test_reset_restore() {
        let mut m = memory(3);
        let mut data = m.dynamic().to_vec();
        data[0x201] = 0xAA;
        assert_ok!(m.restore(&data));
        assert_ok_eq!(m.read_byte(0x201), 0xAA);
        m.reset();
        assert_ok_eq!(m.read_byte(0x201), 0x01);
        let e = m.restore(&data[1..]).unwrap_err();
        assert_eq!(e.code(), ErrorCode::MalformedSaveState);
    }
}
