//! [ZSCII](https://inform-fiction.org/zmachine/standards/z1point1/sect03.html) text encoding
use crate::{error::*, fatal_error, zmachine::ZMachine};

pub mod abbreviation;
pub mod alphabet;
pub mod dictionary;

/// Read encoded text from an address and decode it to ZSCII.
///
/// # Arguments
/// * `zmachine` - Reference to the Z-machine
/// * `address` - Byte address of the text
///
/// # Returns
/// [Result] containing the decoded ZSCII text or a [RuntimeError]
pub fn as_text(zmachine: &ZMachine, address: usize) -> Result<Vec<u16>, RuntimeError> {
    from_vec(zmachine, &zmachine.string_literal(address)?, false)
}

/// Decode a vector of encoded words to ZSCII.
///
/// An abbreviation may not itself contain an abbreviation; if it does a [RuntimeError] is returned.
///
/// # Arguments:
/// * `zmachine` - Reference to the Z-machine
/// * `ztext` - Encoded text words
/// * `is_abbreviation` - `true` when decoding an abbreviation, `false` if not.
///
/// # Returns
/// [Result] containing the decoded ZSCII text or a [RuntimeError]
pub fn from_vec(
    zmachine: &ZMachine,
    ztext: &[u16],
    is_abbreviation: bool,
) -> Result<Vec<u16>, RuntimeError> {
    let version = zmachine.version();
    let alphabet = zmachine.alphabet();
    // Shift lock only exists in versions 1 and 2
    let mut lock: usize = 0;
    let mut shift: usize = 0;
    let mut s = Vec::new();

    let mut abbrev = 0;
    let mut zscii_read1 = false;
    let mut zscii_read2 = false;
    let mut zscii_b1 = 0;

    for w in ztext {
        let b1 = (w >> 10 & 0x1F) as u8;
        let b2 = (w >> 5 & 0x1F) as u8;
        let b3 = (w & 0x1F) as u8;

        for b in [b1, b2, b3] {
            if abbrev > 0 {
                let address = abbreviation::address(zmachine, abbrev, b)?;
                let mut text = from_vec(zmachine, &zmachine.string_literal(address)?, true)?;
                s.append(&mut text);
                abbrev = 0;
            } else if zscii_read1 {
                zscii_b1 = b;
                zscii_read2 = true;
                zscii_read1 = false;
                continue;
            } else if zscii_read2 {
                let z = ((zscii_b1 as u16) << 5 & 0x3E0) | b as u16;
                s.push(z);
                zscii_read2 = false;
            } else {
                match (b, version) {
                    (0, _) => s.push(0x20),
                    (1, 1) => s.push(13),
                    (1, 2) | (1..=3, 3..) => {
                        if is_abbreviation {
                            return fatal_error!(
                                ErrorCode::InvalidAbbreviation,
                                "Abbreviations can't nest",
                            );
                        }
                        abbrev = b;
                        continue;
                    }
                    (2 | 3, _) => {
                        shift = (lock + b as usize - 1) % 3;
                        continue;
                    }
                    (4 | 5, 1 | 2) => {
                        lock = (lock + b as usize - 3) % 3;
                        shift = lock;
                        continue;
                    }
                    (4, _) => {
                        shift = 1;
                        continue;
                    }
                    (5, _) => {
                        shift = 2;
                        continue;
                    }
                    (6, _) if shift == 2 => {
                        zscii_read1 = true;
                        shift = lock;
                        continue;
                    }
                    (_, _) => s.push(alphabet.zscii(shift, b)),
                }
            }

            shift = lock;
        }
    }

    Ok(s)
}

/// Convert ZSCII to a printable string, dropping codes with no output form
pub fn to_string(zscii: &[u16]) -> String {
    zscii
        .iter()
        .filter_map(|z| alphabet::zscii_to_char(*z))
        .collect()
}

/// Encode 3 5-bit Z-characters into a word
///
/// # Arguments
/// * `z1` - first character,
/// * `z2` - second character,
/// * `z3` - third character
///
/// # Return
/// Word encoding of the sequence: 01111122 22233333
fn as_word(z1: u8, z2: u8, z3: u8) -> u16 {
    ((z1 as u16 & 0x1F) << 10) | ((z2 as u16 & 0x1F) << 5) | z3 as u16 & 0x1F
}

/// Find the Z-characters for a ZSCII character, including any one-shot shift.
///
/// Characters outside the alphabets are encoded with the A2 escape followed by
/// two 5-bit halves of the 10-bit ZSCII value.
fn find_char(zmachine: &ZMachine, zscii: u16) -> Vec<u8> {
    let (shift_a1, shift_a2) = if zmachine.version() < 3 { (2, 3) } else { (4, 5) };
    if zscii == 0x20 {
        return vec![0];
    }

    match zmachine.alphabet().find(zscii) {
        Some((0, z)) => vec![z],
        Some((1, z)) => vec![shift_a1, z],
        Some((_, z)) => vec![shift_a2, z],
        None => vec![
            shift_a2,
            6,
            ((zscii >> 5) & 0x1F) as u8,
            (zscii & 0x1F) as u8,
        ],
    }
}

/// [Encode](https://inform-fiction.org/zmachine/standards/z1point1/sect03.html#seven) a word for dictionary lookup
///
/// All characters are encoded first, then the Z-characters are padded with 5 or
/// truncated to 6 (versions 1-3) or 9 (versions 4+), so an escape sequence may be cut short.
///
/// # Arguments
/// * `zmachine` - Reference to the Z-machine
/// * `word` - ZSCII characters of the word
///
/// # Returns
/// Vector of 2 or 3 encoded words, the last with the terminator bit set
pub fn encode_text(zmachine: &ZMachine, word: &[u16]) -> Vec<u16> {
    let words = if zmachine.version() < 4 { 2 } else { 3 };
    let mut zchars = Vec::new();

    for c in word {
        zchars.append(&mut find_char(zmachine, *c));
    }

    zchars.resize(words * 3, 5);

    // Encode zchar triplets into encoded ZSCII words
    let mut zwords = Vec::new();
    for i in 0..words {
        let index = i * 3;
        let mut w = as_word(zchars[index], zchars[index + 1], zchars[index + 2]);
        if i == words - 1 {
            w |= 0x8000;
        }
        zwords.push(w);
    }

    debug!(target: "app::state", "Encoded {:?} => {:04x?}", to_string(word), zwords);
    zwords
}
