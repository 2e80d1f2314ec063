//! Z-character [alphabet tables](https://inform-fiction.org/zmachine/standards/z1point1/sect03.html#five)
use crate::{error::*, zmachine::memory::Memory};

/// Version 2+ default alphabets, as ZSCII.  Entry 1 of A2 is newline.
const ALPHABET_V2: [&[u8; 26]; 3] = [
    b"abcdefghijklmnopqrstuvwxyz",
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    b" \r0123456789.,!?_#'\"/\\-:()",
];

/// Version 1 moves '<' into A2 and has no newline entry
const ALPHABET_V1_A2: &[u8; 26] = b" 0123456789.,!?_#'\"/\\<-:()";

/// Default [Unicode translations](https://inform-fiction.org/zmachine/standards/z1point1/sect03.html#eight)
/// for ZSCII 155..=223
const UNICODE_TABLE: [char; 69] = [
    'ä', 'ö', 'ü', 'Ä', 'Ö', 'Ü', 'ß', '»', '«', 'ë', 'ï', 'ÿ', 'Ë', 'Ï', 'á', 'é', 'í', 'ó', 'ú',
    'ý', 'Á', 'É', 'Í', 'Ó', 'Ú', 'Ý', 'à', 'è', 'ì', 'ò', 'ù', 'À', 'È', 'Ì', 'Ò', 'Ù', 'â', 'ê',
    'î', 'ô', 'û', 'Â', 'Ê', 'Î', 'Ô', 'Û', 'å', 'Å', 'ø', 'Ø', 'ã', 'ñ', 'õ', 'Ã', 'Ñ', 'Õ', 'æ',
    'Æ', 'ç', 'Ç', 'þ', 'ð', 'Þ', 'Ð', '£', 'œ', 'Œ', '¡', '¿',
];

#[derive(Clone, Debug, PartialEq, Eq)]
/// The three alphabets (A0 lower case, A1 upper case, A2 punctuation) in ZSCII
pub struct Alphabet {
    table: [[u16; 26]; 3],
}

impl Alphabet {
    /// Build the alphabet for a story.
    ///
    /// Version 5 stories may supply their own table of 78 ZSCII bytes.
    ///
    /// # Arguments
    /// * `version` - Story version
    /// * `alphabet_table` - Custom alphabet table address or 0
    /// * `memory` - Memory map the custom table is read from
    ///
    /// # Returns
    /// [Result] with the [Alphabet] or a [RuntimeError]
    pub fn new(
        version: u8,
        alphabet_table: usize,
        memory: &Memory,
    ) -> Result<Alphabet, RuntimeError> {
        let mut table = [[0; 26]; 3];
        if version >= 5 && alphabet_table > 0 {
            for (a, row) in table.iter_mut().enumerate() {
                for (i, c) in row.iter_mut().enumerate() {
                    *c = memory.force_read_byte(alphabet_table + (a * 26) + i)? as u16;
                }
            }
            // A2 entry 1 is always newline
            table[2][1] = 13;
            debug!(target: "app::state", "Custom alphabet table @ ${:04x}", alphabet_table);
        } else {
            for (a, row) in table.iter_mut().enumerate() {
                let source = if a == 2 && version == 1 {
                    ALPHABET_V1_A2
                } else {
                    ALPHABET_V2[a]
                };
                for (i, c) in row.iter_mut().enumerate() {
                    *c = source[i] as u16;
                }
            }
        }

        Ok(Alphabet { table })
    }

    /// ZSCII value of a Z-character (6..=31) in an alphabet
    pub fn zscii(&self, alphabet: usize, zchar: u8) -> u16 {
        self.table[alphabet][zchar as usize - 6]
    }

    /// Find a ZSCII character in the alphabets.
    ///
    /// # Returns
    /// [Option] with (alphabet, Z-character) or [None] if the character needs a 10-bit escape
    pub fn find(&self, zscii: u16) -> Option<(usize, u8)> {
        for (a, row) in self.table.iter().enumerate() {
            for (i, c) in row.iter().enumerate() {
                // A2 Z-character 6 is always the 10-bit escape
                if a == 2 && i == 0 {
                    continue;
                }
                if *c == zscii {
                    return Some((a, i as u8 + 6));
                }
            }
        }

        None
    }
}

/// Translate a ZSCII output character to a Unicode character.
///
/// # Arguments
/// * `zscii` - ZSCII character
///
/// # Returns
/// [Option] with the printable character or [None] for codes that have no output
pub fn zscii_to_char(zscii: u16) -> Option<char> {
    match zscii {
        13 => Some('\n'),
        32..=126 => Some(zscii as u8 as char),
        155..=223 => Some(UNICODE_TABLE[zscii as usize - 155]),
        _ => None,
    }
}

/// Translate a Unicode input character to ZSCII.
///
/// # Arguments
/// * `c` - Character
///
/// # Returns
/// [Option] with the ZSCII value or [None] if the character has no ZSCII form
pub fn char_to_zscii(c: char) -> Option<u16> {
    match c {
        '\n' | '\r' => Some(13),
        ' '..='~' => Some(c as u16),
        _ => UNICODE_TABLE
            .iter()
            .position(|u| *u == c)
            .map(|i| i as u16 + 155),
    }
}
