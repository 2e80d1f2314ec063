//! Story file [header](https://inform-fiction.org/zmachine/standards/z1point1/sect11.html)
use std::fmt;

use crate::{error::*, fatal_error};

use super::memory::{word_value, Memory};

/// Byte offsets of the header fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    Version = 0x00,
    Flags1 = 0x01,
    Release = 0x02,
    HighMark = 0x04,
    InitialPC = 0x06,
    Dictionary = 0x08,
    ObjectTable = 0x0A,
    GlobalTable = 0x0C,
    StaticMark = 0x0E,
    Flags2 = 0x10,
    Serial = 0x12,
    AbbreviationsTable = 0x18,
    FileLength = 0x1A,
    Checksum = 0x1C,
    InterpreterNumber = 0x1E,
    InterpreterVersion = 0x1F,
    ScreenLines = 0x20,
    ScreenColumns = 0x21,
    Revision = 0x32,
    AlphabetTable = 0x34,
}

/// Flags1 bits for versions 1-3
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flags1v3 {
    StatusLineType = 0x02,
    Tandy = 0x08,
    StatusLineNotAvailable = 0x10,
    ScreenSplitAvailable = 0x20,
    VariablePitchDefault = 0x40,
}

/// Flags1 bits for versions 4+
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flags1v4 {
    ColoursAvailable = 0x01,
    PicturesAvailable = 0x02,
    BoldfaceAvailable = 0x04,
    ItalicAvailable = 0x08,
    FixedSpaceAvailable = 0x10,
    SoundEffectsAvailable = 0x20,
    TimedInputAvailable = 0x80,
}

/// Flags2 bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flags2 {
    Transcripting = 0x01,
    ForceFixedPitch = 0x02,
    RequestPictures = 0x08,
    RequestUndo = 0x10,
    RequestMouse = 0x20,
    RequestColours = 0x40,
    RequestSoundEffects = 0x80,
}

const HEADER_SIZE: usize = 0x40;

/// Immutable view of the header fields, computed once when a story is loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    version: u8,
    release: u16,
    serial: String,
    high_mark: usize,
    initial_pc: usize,
    dictionary: usize,
    object_table: usize,
    global_table: usize,
    static_mark: usize,
    abbreviations_table: usize,
    file_length: usize,
    checksum: u16,
    alphabet_table: usize,
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} release {} serial {}: static ${:05x}, high ${:05x}, pc ${:05x}",
            self.version, self.release, self.serial, self.static_mark, self.high_mark, self.initial_pc
        )
    }
}

fn word(data: &[u8], field: HeaderField) -> usize {
    let offset = field as usize;
    word_value(data[offset], data[offset + 1]) as usize
}

impl TryFrom<&[u8]> for Header {
    type Error = RuntimeError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        if data.len() < HEADER_SIZE {
            return fatal_error!(
                ErrorCode::MalformedStoryHeader,
                "Story file is {} bytes, shorter than the header",
                data.len()
            );
        }

        let version = data[HeaderField::Version as usize];
        if !(1..=5).contains(&version) {
            return fatal_error!(
                ErrorCode::UnsupportedVersion,
                "Version {} is not supported",
                version
            );
        }

        let static_mark = word(data, HeaderField::StaticMark);
        let high_mark = word(data, HeaderField::HighMark);
        let initial_pc = word(data, HeaderField::InitialPC);
        let global_table = word(data, HeaderField::GlobalTable);

        if static_mark < HEADER_SIZE || static_mark > data.len() {
            return fatal_error!(
                ErrorCode::MalformedStoryHeader,
                "Static memory mark ${:05x} outside of ${:05x}..${:05x}",
                static_mark,
                HEADER_SIZE,
                data.len()
            );
        }

        if high_mark < static_mark || high_mark > data.len() {
            return fatal_error!(
                ErrorCode::MalformedStoryHeader,
                "High memory mark ${:05x} overlaps dynamic memory (${:05x}) or is out of range",
                high_mark,
                static_mark
            );
        }

        if initial_pc >= data.len() {
            return fatal_error!(
                ErrorCode::MalformedStoryHeader,
                "Initial PC ${:05x} beyond end of memory ${:05x}",
                initial_pc,
                data.len()
            );
        }

        if global_table + 480 > static_mark {
            return fatal_error!(
                ErrorCode::MalformedStoryHeader,
                "Global table ${:05x} extends beyond dynamic memory ${:05x}",
                global_table,
                static_mark
            );
        }

        let file_length = match word(data, HeaderField::FileLength)
            * if version < 4 { 2 } else { 4 }
        {
            0 => data.len(),
            l => usize::min(l, data.len()),
        };

        let serial = data[HeaderField::Serial as usize..HeaderField::Serial as usize + 6]
            .iter()
            .map(|b| *b as char)
            .collect();

        Ok(Header {
            version,
            release: word(data, HeaderField::Release) as u16,
            serial,
            high_mark,
            initial_pc,
            dictionary: word(data, HeaderField::Dictionary),
            object_table: word(data, HeaderField::ObjectTable),
            global_table,
            static_mark,
            abbreviations_table: word(data, HeaderField::AbbreviationsTable),
            file_length,
            checksum: word(data, HeaderField::Checksum) as u16,
            alphabet_table: if version == 5 {
                word(data, HeaderField::AlphabetTable)
            } else {
                0
            },
        })
    }
}

impl Header {
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn release(&self) -> u16 {
        self.release
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn high_mark(&self) -> usize {
        self.high_mark
    }

    pub fn initial_pc(&self) -> usize {
        self.initial_pc
    }

    pub fn dictionary(&self) -> usize {
        self.dictionary
    }

    pub fn object_table(&self) -> usize {
        self.object_table
    }

    pub fn global_table(&self) -> usize {
        self.global_table
    }

    pub fn static_mark(&self) -> usize {
        self.static_mark
    }

    pub fn abbreviations_table(&self) -> usize {
        self.abbreviations_table
    }

    /// File length in bytes, as declared by the header
    pub fn file_length(&self) -> usize {
        self.file_length
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Custom alphabet table address, 0 if the default alphabets apply
    pub fn alphabet_table(&self) -> usize {
        self.alphabet_table
    }
}

/// Set a flag bit in a header flags byte.
///
/// # Arguments
/// * `memory` - Memory map
/// * `field` - Flags field
/// * `flag` - Flag bit mask
///
/// # Returns
/// Empty [Result] or a [RuntimeError]
pub fn set_flag(memory: &mut Memory, field: HeaderField, flag: u8) -> Result<(), RuntimeError> {
    let address = field as usize;
    let value = memory.read_byte(address)?;
    memory.write_byte(address, value | flag)
}

/// Clear a flag bit in a header flags byte.
///
/// # Arguments
/// * `memory` - Memory map
/// * `field` - Flags field
/// * `flag` - Flag bit mask
///
/// # Returns
/// Empty [Result] or a [RuntimeError]
pub fn clear_flag(memory: &mut Memory, field: HeaderField, flag: u8) -> Result<(), RuntimeError> {
    let address = field as usize;
    let value = memory.read_byte(address)?;
    memory.write_byte(address, value & !flag)
}

/// Advertise a text-only interpreter: clear the capability bits for colour,
/// pictures, sound and the like, and fill in the interpreter identification.
///
/// # Arguments
/// * `memory` - Memory map
/// * `version` - Story version
///
/// # Returns
/// Empty [Result] or a [RuntimeError]
pub fn advertise_minimal_interpreter(memory: &mut Memory, version: u8) -> Result<(), RuntimeError> {
    if version < 4 {
        set_flag(memory, HeaderField::Flags1, Flags1v3::StatusLineNotAvailable as u8)?;
        clear_flag(memory, HeaderField::Flags1, Flags1v3::ScreenSplitAvailable as u8)?;
        clear_flag(memory, HeaderField::Flags1, Flags1v3::VariablePitchDefault as u8)?;
    } else {
        for f in [
            Flags1v4::ColoursAvailable,
            Flags1v4::PicturesAvailable,
            Flags1v4::BoldfaceAvailable,
            Flags1v4::ItalicAvailable,
            Flags1v4::FixedSpaceAvailable,
            Flags1v4::SoundEffectsAvailable,
            Flags1v4::TimedInputAvailable,
        ] {
            clear_flag(memory, HeaderField::Flags1, f as u8)?;
        }
        memory.write_byte(HeaderField::InterpreterNumber as usize, 6)?;
        memory.write_byte(HeaderField::InterpreterVersion as usize, b'Z')?;
        memory.write_byte(HeaderField::ScreenLines as usize, 255)?;
        memory.write_byte(HeaderField::ScreenColumns as usize, 80)?;
    }

    // Flags2 is a word; the request bits live in its low byte
    let flags2_low = HeaderField::Flags2 as usize + 1;
    let value = memory.read_byte(flags2_low)?;
    memory.write_byte(
        flags2_low,
        value
            & !(Flags2::RequestPictures as u8
                | Flags2::RequestUndo as u8
                | Flags2::RequestMouse as u8
                | Flags2::RequestColours as u8
                | Flags2::RequestSoundEffects as u8),
    )?;

    memory.write_word(HeaderField::Revision as usize, 0x0101)
}

#[cfg(test)]
mod tests {
    use crate::{assert_ok, assert_ok_eq, test_util::test_map};

    use super::*;

    fn flag(memory: &Memory, field: HeaderField, flag: u8) -> Result<bool, RuntimeError> {
        Ok(memory.read_byte(field as usize)? & flag == flag)
    }

    #[test]
    fn test_try_from() {
        let map = test_map(3);
        let header = assert_ok!(Header::try_from(&map[..]));
        assert_eq!(header.version(), 3);
        assert_eq!(header.high_mark(), 0x600);
        assert_eq!(header.initial_pc(), 0x400);
        assert_eq!(header.dictionary(), 0x300);
        assert_eq!(header.object_table(), 0x200);
        assert_eq!(header.global_table(), 0x100);
        assert_eq!(header.static_mark(), 0x400);
        assert_eq!(header.abbreviations_table(), 0x040);
        assert_eq!(header.file_length(), 0x800);
        assert_eq!(header.alphabet_table(), 0);
    }

    #[test]
    fn test_try_from_short() {
        let map = vec![3; 0x20];
        let e = Header::try_from(&map[..]).unwrap_err();
        assert_eq!(e.code(), ErrorCode::MalformedStoryHeader);
    }

    #[test]
    fn test_try_from_unsupported_version() {
        for v in [0, 6, 7, 8] {
            let mut map = test_map(3);
            map[0] = v;
            let e = Header::try_from(&map[..]).unwrap_err();
            assert_eq!(e.code(), ErrorCode::UnsupportedVersion);
        }
    }

    #[test]
    fn test_try_from_high_below_static() {
        let mut map = test_map(3);
        map[0x04] = 0x03;
        map[0x05] = 0x00;
        let e = Header::try_from(&map[..]).unwrap_err();
        assert_eq!(e.code(), ErrorCode::MalformedStoryHeader);
    }

    #[test]
    fn test_try_from_static_beyond_end() {
        let mut map = test_map(3);
        map[0x0E] = 0x10;
        let e = Header::try_from(&map[..]).unwrap_err();
        assert_eq!(e.code(), ErrorCode::MalformedStoryHeader);
    }

    #[test]
    fn test_try_from_pc_beyond_end() {
        let mut map = test_map(5);
        map[0x06] = 0x08;
        map[0x07] = 0x00;
        let e = Header::try_from(&map[..]).unwrap_err();
        assert_eq!(e.code(), ErrorCode::MalformedStoryHeader);
    }

    #[test]
    fn test_file_length_scaling() {
        let mut map = test_map(3);
        map[0x1A] = 0x02;
        map[0x1B] = 0x00;
        assert_ok_eq!(Header::try_from(&map[..]).map(|h| h.file_length()), 0x400);
        let mut map = test_map(5);
        map[0x1A] = 0x01;
        map[0x1B] = 0x00;
        assert_ok_eq!(Header::try_from(&map[..]).map(|h| h.file_length()), 0x400);
    }

    #[test]
    fn test_advertise_minimal_interpreter_v3() {
        let mut map = test_map(3);
        map[0x01] = 0x60;
        map[0x11] = 0xFF;
        let header = assert_ok!(Header::try_from(&map[..]));
        let mut memory = Memory::new(map, &header);
        assert_ok!(advertise_minimal_interpreter(&mut memory, 3));
        assert_ok_eq!(memory.read_byte(0x01), 0x10);
        assert_ok_eq!(memory.read_byte(0x11), 0x07);
    }

    #[test]
    fn test_advertise_minimal_interpreter_v5() {
        let mut map = test_map(5);
        map[0x01] = 0xFF;
        map[0x11] = 0xF8;
        let header = assert_ok!(Header::try_from(&map[..]));
        let mut memory = Memory::new(map, &header);
        assert_ok!(advertise_minimal_interpreter(&mut memory, 5));
        assert_ok_eq!(memory.read_byte(0x01), 0x40);
        assert_ok_eq!(memory.read_byte(0x11), 0x00);
        assert_ok_eq!(memory.read_byte(0x1E), 6);
        assert_ok_eq!(memory.read_byte(0x20), 255);
        assert_ok_eq!(memory.read_word(0x32), 0x0101);
        assert_ok_eq!(flag(&memory, HeaderField::Flags1, 0x40), true);
    }
}
